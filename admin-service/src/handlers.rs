//! Handler模块

use std::time::Instant;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use admin_core::{farm, ops, reports, Report};
use common::errors::AppError;
use common::models::{
    AddColumnRequest, AddRowRequest, CreateTableRequest, Customer, DeleteRowRequest, FarmTable,
    InventoryItem, LoginRequest, Product, QueryResult, ReportResult, ReportSummary, RowRecord,
    Sale, SessionInfo, UpdateRowRequest,
};
use common::response::ApiResponse;

use crate::state::AppState;

const SERVICE: &str = "admin-service";

fn respond<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_service(data, SERVICE))
}

fn respond_timed<T: Serialize>(data: T, started: Instant) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok_with_service(data, SERVICE).with_duration(started.elapsed().as_millis() as u64))
}

// ---------------------------------------------------------------------------
// 会话
// ---------------------------------------------------------------------------

/// 登录并打开会话
#[utoipa::path(
    post,
    path = "/api/session",
    tag = "session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "已连接", body = ApiResponse<SessionInfo>),
        (status = 400, description = "参数校验错误"),
        (status = 502, description = "认证或网络失败")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    req.validate()?;
    let (params, role) = req.into_params(state.config.db_port);

    let mut workspace = state.workspace.lock().await;
    workspace.role = None;
    workspace.db.try_connect(&params).await?;
    workspace.role = Some(role);
    tracing::info!(role = %role, "Session opened");
    Ok(respond(workspace.info()))
}

/// 当前会话状态
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    responses(
        (status = 200, description = "会话状态", body = ApiResponse<SessionInfo>)
    )
)]
pub async fn session_info(State(state): State<AppState>) -> Json<ApiResponse<SessionInfo>> {
    let workspace = state.workspace.lock().await;
    respond(workspace.info())
}

/// 关闭会话
#[utoipa::path(
    delete,
    path = "/api/session",
    tag = "session",
    responses(
        (status = 200, description = "会话已关闭", body = ApiResponse<SessionInfo>)
    )
)]
pub async fn logout(State(state): State<AppState>) -> Json<ApiResponse<SessionInfo>> {
    let mut workspace = state.workspace.lock().await;
    workspace.db.close().await;
    workspace.role = None;
    respond(workspace.info())
}

// ---------------------------------------------------------------------------
// 库表与结构
// ---------------------------------------------------------------------------

/// 列出所有数据库
#[utoipa::path(
    get,
    path = "/api/databases",
    tag = "schema",
    responses(
        (status = 200, description = "数据库列表", body = ApiResponse<Vec<String>>),
        (status = 503, description = "未连接")
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let data = ops::list_databases(&mut workspace.db).await?;
    Ok(respond(data))
}

/// 列出数据库中的表
#[utoipa::path(
    get,
    path = "/api/databases/{db}/tables",
    tag = "schema",
    params(("db" = String, Path, description = "数据库名")),
    responses(
        (status = 200, description = "表列表", body = ApiResponse<Vec<String>>)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let data = ops::list_tables(&mut workspace.db, &db).await?;
    Ok(respond(data))
}

/// 创建表
#[utoipa::path(
    post,
    path = "/api/databases/{db}/tables",
    tag = "schema",
    params(("db" = String, Path, description = "数据库名")),
    request_body = CreateTableRequest,
    responses(
        (status = 200, description = "表已创建", body = ApiResponse<bool>),
        (status = 400, description = "名称或类型无效")
    )
)]
pub async fn create_table(
    State(state): State<AppState>,
    Path(db): Path<String>,
    Json(req): Json<CreateTableRequest>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    req.validate()?;
    let mut workspace = state.workspace.lock().await;
    ops::create_table(&mut workspace.db, &db, &req.name, &req.columns).await?;
    Ok(respond(true))
}

/// 删除表
#[utoipa::path(
    delete,
    path = "/api/databases/{db}/tables/{table}",
    tag = "schema",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    responses(
        (status = 200, description = "表已删除", body = ApiResponse<bool>)
    )
)]
pub async fn delete_table(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    ops::delete_table(&mut workspace.db, &db, &table).await?;
    Ok(respond(true))
}

/// 列出表的列
#[utoipa::path(
    get,
    path = "/api/databases/{db}/tables/{table}/columns",
    tag = "schema",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    responses(
        (status = 200, description = "列名列表", body = ApiResponse<Vec<String>>)
    )
)]
pub async fn list_columns(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let data = ops::list_columns(&mut workspace.db, &db, &table).await?;
    Ok(respond(data))
}

/// 添加列
#[utoipa::path(
    post,
    path = "/api/databases/{db}/tables/{table}/columns",
    tag = "schema",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    request_body = AddColumnRequest,
    responses(
        (status = 200, description = "列已添加", body = ApiResponse<bool>)
    )
)]
pub async fn add_column(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Json(req): Json<AddColumnRequest>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    req.validate()?;
    let mut workspace = state.workspace.lock().await;
    ops::add_column(&mut workspace.db, &db, &table, &req.name, &req.column_type).await?;
    Ok(respond(true))
}

/// 删除列
#[utoipa::path(
    delete,
    path = "/api/databases/{db}/tables/{table}/columns/{column}",
    tag = "schema",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名"),
        ("column" = String, Path, description = "列名")
    ),
    responses(
        (status = 200, description = "列已删除", body = ApiResponse<bool>)
    )
)]
pub async fn delete_column(
    State(state): State<AppState>,
    Path((db, table, column)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    ops::delete_column(&mut workspace.db, &db, &table, &column).await?;
    Ok(respond(true))
}

// ---------------------------------------------------------------------------
// 行操作
// ---------------------------------------------------------------------------

/// 读取整张表
#[utoipa::path(
    get,
    path = "/api/databases/{db}/tables/{table}/rows",
    tag = "rows",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    responses(
        (status = 200, description = "表内容", body = ApiResponse<QueryResult>)
    )
)]
pub async fn get_table_contents(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    let started = Instant::now();
    let mut workspace = state.workspace.lock().await;
    let data = ops::get_table_contents(&mut workspace.db, &db, &table).await?;
    Ok(respond_timed(data, started))
}

/// 插入一行
#[utoipa::path(
    post,
    path = "/api/databases/{db}/tables/{table}/rows",
    tag = "rows",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    request_body = AddRowRequest,
    responses(
        (status = 200, description = "行已插入", body = ApiResponse<bool>),
        (status = 400, description = "列集合或数量不匹配")
    )
)]
pub async fn add_row(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Json(req): Json<AddRowRequest>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    req.validate()?;
    let mut workspace = state.workspace.lock().await;
    ops::add_row(
        &mut workspace.db,
        &db,
        &table,
        &req.values,
        req.columns.as_deref(),
    )
    .await?;
    Ok(respond(true))
}

/// 按键列更新行
#[utoipa::path(
    put,
    path = "/api/databases/{db}/tables/{table}/rows",
    tag = "rows",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    request_body = UpdateRowRequest,
    responses(
        (status = 200, description = "受影响行数", body = ApiResponse<u64>)
    )
)]
pub async fn update_row(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Json(req): Json<UpdateRowRequest>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    req.validate()?;
    let assignments: Vec<(String, Value)> = req
        .set
        .into_iter()
        .map(|a| (a.column, a.value))
        .collect();
    let mut workspace = state.workspace.lock().await;
    let updated = ops::update_row(
        &mut workspace.db,
        &db,
        &table,
        &assignments,
        &req.key_column,
        &req.key_value,
    )
    .await?;
    Ok(respond(updated))
}

/// 按等值条件删除行
#[utoipa::path(
    delete,
    path = "/api/databases/{db}/tables/{table}/rows",
    tag = "rows",
    params(
        ("db" = String, Path, description = "数据库名"),
        ("table" = String, Path, description = "表名")
    ),
    request_body = DeleteRowRequest,
    responses(
        (status = 200, description = "删除的行数", body = ApiResponse<u64>)
    )
)]
pub async fn delete_row(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
    Json(req): Json<DeleteRowRequest>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    req.validate()?;
    let mut workspace = state.workspace.lock().await;
    let deleted = ops::delete_row(&mut workspace.db, &db, &table, &req.column, &req.value).await?;
    Ok(respond(deleted))
}

/// 在当前数据库中按 ID 查找一行
#[utoipa::path(
    get,
    path = "/api/tables/{table}/rows/{id_column}/{id_value}",
    tag = "rows",
    params(
        ("table" = String, Path, description = "表名"),
        ("id_column" = String, Path, description = "ID 列名"),
        ("id_value" = String, Path, description = "ID 值")
    ),
    responses(
        (status = 200, description = "查找结果", body = ApiResponse<RowRecord>)
    )
)]
pub async fn get_row_by_id(
    State(state): State<AppState>,
    Path((table, id_column, id_value)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<RowRecord>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let row = ops::get_row_by_id(&mut workspace.db, &table, &id_column, &Value::String(id_value)).await?;
    Ok(respond(RowRecord::from(row)))
}

// ---------------------------------------------------------------------------
// 农场
// ---------------------------------------------------------------------------

/// 添加产品
#[utoipa::path(
    post,
    path = "/api/farm/products",
    tag = "farm",
    request_body = Product,
    responses(
        (status = 200, description = "产品已添加", body = ApiResponse<bool>)
    )
)]
pub async fn add_product(
    State(state): State<AppState>,
    Json(product): Json<Product>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    farm::add_product(&mut workspace.db, &state.config.farm_database, &product).await?;
    Ok(respond(true))
}

/// 获取产品
#[utoipa::path(
    get,
    path = "/api/farm/products/{id}",
    tag = "farm",
    params(("id" = i64, Path, description = "产品 ID")),
    responses(
        (status = 200, description = "产品详情", body = ApiResponse<Product>),
        (status = 404, description = "产品未找到")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let product = farm::get_product(&mut workspace.db, &state.config.farm_database, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;
    Ok(respond(product))
}

/// 更新产品
#[utoipa::path(
    put,
    path = "/api/farm/products/{id}",
    tag = "farm",
    params(("id" = i64, Path, description = "产品 ID")),
    request_body = Product,
    responses(
        (status = 200, description = "受影响行数", body = ApiResponse<u64>)
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut product): Json<Product>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    product.product_id = id;
    let mut workspace = state.workspace.lock().await;
    let updated = farm::update_product(&mut workspace.db, &state.config.farm_database, &product).await?;
    Ok(respond(updated))
}

/// 删除产品及其库存
#[utoipa::path(
    delete,
    path = "/api/farm/products/{id}",
    tag = "farm",
    params(("id" = i64, Path, description = "产品 ID")),
    responses(
        (status = 200, description = "删除的行数", body = ApiResponse<u64>)
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let deleted = farm::delete_product(&mut workspace.db, &state.config.farm_database, id).await?;
    Ok(respond(deleted))
}

/// 添加库存
#[utoipa::path(
    post,
    path = "/api/farm/inventory",
    tag = "farm",
    request_body = InventoryItem,
    responses(
        (status = 200, description = "库存已添加", body = ApiResponse<bool>)
    )
)]
pub async fn add_inventory(
    State(state): State<AppState>,
    Json(item): Json<InventoryItem>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    farm::add_inventory(&mut workspace.db, &state.config.farm_database, &item).await?;
    Ok(respond(true))
}

/// 获取库存条目
#[utoipa::path(
    get,
    path = "/api/farm/inventory/{id}",
    tag = "farm",
    params(("id" = i64, Path, description = "库存 ID")),
    responses(
        (status = 200, description = "库存详情", body = ApiResponse<InventoryItem>),
        (status = 404, description = "库存未找到")
    )
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<InventoryItem>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let item = farm::get_inventory(&mut workspace.db, &state.config.farm_database, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Inventory {} not found", id)))?;
    Ok(respond(item))
}

/// 更新库存条目
#[utoipa::path(
    put,
    path = "/api/farm/inventory/{id}",
    tag = "farm",
    params(("id" = i64, Path, description = "库存 ID")),
    request_body = InventoryItem,
    responses(
        (status = 200, description = "受影响行数", body = ApiResponse<u64>)
    )
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut item): Json<InventoryItem>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    item.inventory_id = id;
    let mut workspace = state.workspace.lock().await;
    let updated = farm::update_inventory(&mut workspace.db, &state.config.farm_database, &item).await?;
    Ok(respond(updated))
}

/// 删除库存条目
#[utoipa::path(
    delete,
    path = "/api/farm/inventory/{id}",
    tag = "farm",
    params(("id" = i64, Path, description = "库存 ID")),
    responses(
        (status = 200, description = "删除的行数", body = ApiResponse<u64>)
    )
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    let deleted = farm::delete_inventory(&mut workspace.db, &state.config.farm_database, id).await?;
    Ok(respond(deleted))
}

/// 记录销售
#[utoipa::path(
    post,
    path = "/api/farm/sales",
    tag = "farm",
    request_body = Sale,
    responses(
        (status = 200, description = "销售已记录", body = ApiResponse<bool>),
        (status = 400, description = "日期无效")
    )
)]
pub async fn record_sale(
    State(state): State<AppState>,
    Json(sale): Json<Sale>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    farm::record_sale(&mut workspace.db, &state.config.farm_database, &sale).await?;
    Ok(respond(true))
}

/// 添加客户
#[utoipa::path(
    post,
    path = "/api/farm/customers",
    tag = "farm",
    request_body = Customer,
    responses(
        (status = 200, description = "客户已添加", body = ApiResponse<bool>)
    )
)]
pub async fn add_customer(
    State(state): State<AppState>,
    Json(customer): Json<Customer>,
) -> Result<Json<ApiResponse<bool>>, AppError> {
    let mut workspace = state.workspace.lock().await;
    farm::add_customer(&mut workspace.db, &state.config.farm_database, &customer).await?;
    Ok(respond(true))
}

/// 查看农场表
#[utoipa::path(
    get,
    path = "/api/farm/tables/{table}",
    tag = "farm",
    params(("table" = String, Path, description = "Product / Inventory / Sale / Customer / SeasonalAnalysis")),
    responses(
        (status = 200, description = "表内容", body = ApiResponse<QueryResult>),
        (status = 404, description = "不是农场表")
    )
)]
pub async fn view_farm_table(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    let table = FarmTable::parse(&table)
        .ok_or_else(|| AppError::NotFound(format!("{} is not a farm table", table)))?;
    let started = Instant::now();
    let mut workspace = state.workspace.lock().await;
    let data = farm::view(&mut workspace.db, &state.config.farm_database, table).await?;
    Ok(respond_timed(data, started))
}

/// 列出可用报表
#[utoipa::path(
    get,
    path = "/api/farm/reports",
    tag = "farm",
    responses(
        (status = 200, description = "报表列表", body = ApiResponse<Vec<ReportSummary>>)
    )
)]
pub async fn list_reports() -> Json<ApiResponse<Vec<ReportSummary>>> {
    respond(Report::ALL.iter().map(Report::summary).collect())
}

/// 运行报表
#[utoipa::path(
    get,
    path = "/api/farm/reports/{report}",
    tag = "farm",
    params(("report" = String, Path, description = "sales / inventory / seasonal / forecast")),
    responses(
        (status = 200, description = "报表结果", body = ApiResponse<ReportResult>),
        (status = 404, description = "报表未找到")
    )
)]
pub async fn run_report(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ReportResult>>, AppError> {
    let report = Report::from_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", slug)))?;
    let started = Instant::now();
    let mut workspace = state.workspace.lock().await;
    let data = reports::run_report(&mut workspace.db, &state.config.farm_database, report).await?;
    Ok(respond_timed(data, started))
}

// ---------------------------------------------------------------------------
// 健康检查
// ---------------------------------------------------------------------------

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.workspace.lock().await.db.is_connected();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        connected,
    })
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 是否持有数据库会话
    pub connected: bool,
}
