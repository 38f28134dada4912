//! HTTP handlers for connectivity checks and table browsing

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::parse_limit;

use crate::error::AppResult;
use crate::extract::{Path, Query};
use crate::services::introspection::{ColumnInfo, TableInfo, TableService, VerifiedTable};
use crate::AppState;

/// Rows returned by the table browser when no limit is given
const DEFAULT_TABLE_ROWS: u32 = 100;

#[derive(Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub database: String,
    pub server: String,
}

#[derive(Serialize)]
pub struct TablesResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TableRowsParams {
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct TableRowsResponse {
    pub success: bool,
    pub message: String,
    pub table_name: String,
    pub total_rows: i64,
    pub returned_rows: usize,
    pub limit: u32,
    pub columns: Vec<ColumnInfo>,
    pub data: Vec<serde_json::Value>,
}

#[derive(Serialize)]
pub struct TableInfoResponse {
    pub success: bool,
    pub message: String,
    pub table: VerifiedTable,
    pub columns: Vec<ColumnInfo>,
    pub primary_keys: Vec<String>,
}

/// Probe the database connection
pub async fn check_connection(
    State(state): State<AppState>,
) -> AppResult<Json<ConnectionResponse>> {
    let service = TableService::new(state.db.acquire().await?);
    let info = service.check_connection().await?;

    Ok(Json(ConnectionResponse {
        success: true,
        message: "تم الاتصال بقاعدة البيانات بنجاح".to_string(),
        timestamp: info.server_time,
        database: info.database,
        server: info.server,
    }))
}

/// List user tables and views
pub async fn list_tables(State(state): State<AppState>) -> AppResult<Json<TablesResponse>> {
    let service = TableService::new(state.db.acquire().await?);
    let tables = service.list_tables().await?;

    Ok(Json(TablesResponse {
        success: true,
        message: "تم جلب قائمة الجداول بنجاح".to_string(),
        count: tables.len(),
        tables,
    }))
}

/// Rows of one table with its column metadata
pub async fn table_rows(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Query(query): Query<TableRowsParams>,
) -> AppResult<Json<TableRowsResponse>> {
    let limit = parse_limit("limit", query.limit.as_deref())?.unwrap_or(DEFAULT_TABLE_ROWS);

    let service = TableService::new(state.db.acquire().await?);
    let table = service.verify_table(&table_name).await?;
    let columns = service.columns(&table).await?;
    let total_rows = service.count(&table).await?;
    let data = service.rows(&table, limit).await?;

    Ok(Json(TableRowsResponse {
        success: true,
        message: format!("تم جلب بيانات الجدول {} بنجاح", table.name()),
        table_name: table.name().to_string(),
        total_rows,
        returned_rows: data.len(),
        limit,
        columns,
        data,
    }))
}

/// Column and primary key metadata of one table
pub async fn table_info(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
) -> AppResult<Json<TableInfoResponse>> {
    let service = TableService::new(state.db.acquire().await?);
    let table = service.verify_table(&table_name).await?;
    let columns = service.columns(&table).await?;
    let primary_keys = service.primary_keys(&table).await?;

    Ok(Json(TableInfoResponse {
        success: true,
        message: format!("تم جلب معلومات الجدول {} بنجاح", table.name()),
        table,
        columns,
        primary_keys,
    }))
}
