//! Route definitions for the Inventory Reports API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Upper bound on one upload request body
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Live database reports
        .nest("/database", database_routes())
        // Uploaded spreadsheet reports
        .nest("/excel", excel_routes())
}

/// Routes backed by the live database
fn database_routes() -> Router<AppState> {
    Router::new()
        .route("/check-connection", get(handlers::check_connection))
        .route("/tables", get(handlers::list_tables))
        .route("/table/:table_name", get(handlers::table_rows))
        .route("/table/:table_name/info", get(handlers::table_info))
        .route("/materials-by-stores", get(handlers::materials_by_stores))
        .route("/materials-by-store/:store_code", get(handlers::materials_by_store))
        .route("/stores-list", get(handlers::stores_list))
        .route("/stores-summary", get(handlers::stores_summary))
        .route("/store-summary/:store_code", get(handlers::store_summary))
        .route("/stores-detailed-stats", get(handlers::stores_detailed_stats))
        .route("/materials", get(handlers::list_materials))
}

/// Routes backed by uploaded workbooks
fn excel_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload-reports",
            post(handlers::upload_reports).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/materials-by-stores",
            get(handlers::spreadsheet_materials_by_stores),
        )
}
