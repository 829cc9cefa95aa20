//! 路由模块

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/session",
            post(handlers::login)
                .get(handlers::session_info)
                .delete(handlers::logout),
        )
        .route("/api/databases", get(handlers::list_databases))
        .route(
            "/api/databases/{db}/tables",
            get(handlers::list_tables).post(handlers::create_table),
        )
        .route(
            "/api/databases/{db}/tables/{table}",
            delete(handlers::delete_table),
        )
        .route(
            "/api/databases/{db}/tables/{table}/rows",
            get(handlers::get_table_contents)
                .post(handlers::add_row)
                .put(handlers::update_row)
                .delete(handlers::delete_row),
        )
        .route(
            "/api/databases/{db}/tables/{table}/columns",
            get(handlers::list_columns).post(handlers::add_column),
        )
        .route(
            "/api/databases/{db}/tables/{table}/columns/{column}",
            delete(handlers::delete_column),
        )
        .route(
            "/api/tables/{table}/rows/{id_column}/{id_value}",
            get(handlers::get_row_by_id),
        )
        .route("/api/farm/products", post(handlers::add_product))
        .route(
            "/api/farm/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/api/farm/inventory", post(handlers::add_inventory))
        .route(
            "/api/farm/inventory/{id}",
            get(handlers::get_inventory)
                .put(handlers::update_inventory)
                .delete(handlers::delete_inventory),
        )
        .route("/api/farm/sales", post(handlers::record_sale))
        .route("/api/farm/customers", post(handlers::add_customer))
        .route("/api/farm/tables/{table}", get(handlers::view_farm_table))
        .route("/api/farm/reports", get(handlers::list_reports))
        .route("/api/farm/reports/{report}", get(handlers::run_report))
        .route("/api/health", get(handlers::health_check))
}
