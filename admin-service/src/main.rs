//! 数据库管理服务
//!
//! 提供数据库管理功能，包括：
//! - 登录会话管理
//! - 数据库、表、列的浏览与变更
//! - 行的增删改查
//! - 农场业务表与分析报表

mod handlers;
mod routes;
mod state;

use admin_core::DbSession;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "admin-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "数据库管理服务 API",
        version = "0.1.0",
        description = "MySQL 数据库管理与农场分析服务"
    ),
    paths(
        handlers::login,
        handlers::session_info,
        handlers::logout,
        handlers::list_databases,
        handlers::list_tables,
        handlers::create_table,
        handlers::delete_table,
        handlers::list_columns,
        handlers::add_column,
        handlers::delete_column,
        handlers::get_table_contents,
        handlers::add_row,
        handlers::update_row,
        handlers::delete_row,
        handlers::get_row_by_id,
        handlers::add_product,
        handlers::get_product,
        handlers::update_product,
        handlers::delete_product,
        handlers::add_inventory,
        handlers::get_inventory,
        handlers::update_inventory,
        handlers::delete_inventory,
        handlers::record_sale,
        handlers::add_customer,
        handlers::view_farm_table,
        handlers::list_reports,
        handlers::run_report,
        handlers::health_check,
    ),
    components(schemas(
        common::models::LoginRequest,
        common::models::SessionInfo,
        common::models::UserRole,
        common::models::CreateTableRequest,
        common::models::ColumnDef,
        common::models::AddColumnRequest,
        common::models::AddRowRequest,
        common::models::UpdateRowRequest,
        common::models::Assignment,
        common::models::DeleteRowRequest,
        common::models::QueryResult,
        common::models::ColumnInfo,
        common::models::RowRecord,
        common::models::Product,
        common::models::InventoryItem,
        common::models::Sale,
        common::models::Customer,
        common::models::ReportSummary,
        common::models::ReportResult,
        handlers::HealthResponse,
    )),
    tags(
        (name = "session", description = "会话端点"),
        (name = "schema", description = "库表结构端点"),
        (name = "rows", description = "行操作端点"),
        (name = "farm", description = "农场业务与报表端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 会话在登录前保持断开
    let state = AppState::new(config.clone(), DbSession::mysql());
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(
        service = SERVICE_NAME,
        address = %addr,
        farm_database = %config.farm_database,
        "启动服务"
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
