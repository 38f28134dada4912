//! HTTP handlers for live stock listings

use axum::{extract::State, Json};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{parse_store_code, StoreMaterials, StoresReport};

use crate::error::AppResult;
use crate::extract::{Path, Query};
use crate::services::stock::{StockFilter, StockParams, StockReportService};
use crate::AppState;

/// Listing query string, names as clients send them
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQueryParams {
    pub store_code: Option<String>,
    pub search: Option<String>,
    pub min_qty: Option<String>,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub group_guid: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl StockQueryParams {
    fn as_params(&self) -> StockParams<'_> {
        StockParams {
            store_code: self.store_code.as_deref(),
            search: self.search.as_deref(),
            min_qty: self.min_qty.as_deref(),
            period: self.period.as_deref(),
            start_date: self.start_date.as_deref(),
            end_date: self.end_date.as_deref(),
            group_guid: self.group_guid.as_deref(),
            limit: self.limit.as_deref(),
            sort_by: self.sort_by.as_deref(),
            sort_order: self.sort_order.as_deref(),
        }
    }
}

#[derive(Serialize)]
pub struct StoresReportResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub filters: StockFilter,
    #[serde(flatten)]
    pub report: StoresReport,
}

#[derive(Serialize)]
pub struct StoreMaterialsResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub filters: StockFilter,
    pub store: StoreMaterials,
}

/// Periods resolve against the server's local calendar date
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Materials held by every known store
pub async fn materials_by_stores(
    State(state): State<AppState>,
    Query(query): Query<StockQueryParams>,
) -> AppResult<Json<StoresReportResponse>> {
    let filter = StockFilter::parse(&query.as_params(), today())?;

    let service = StockReportService::new(state.db.acquire().await?);
    let report = service
        .materials_by_stores(
            &filter,
            state.config.reports.default_limit,
            state.config.reports.escape_search_wildcards,
        )
        .await?;

    Ok(Json(StoresReportResponse {
        success: true,
        message: "تم جلب المواد حسب المستودعات بنجاح".to_string(),
        timestamp: Utc::now(),
        filters: filter,
        report,
    }))
}

/// Materials held by one store
pub async fn materials_by_store(
    State(state): State<AppState>,
    Path(store_code): Path<String>,
    Query(query): Query<StockQueryParams>,
) -> AppResult<Json<StoreMaterialsResponse>> {
    let code = parse_store_code(&store_code)?;
    let params = StockParams {
        store_code: Some(code.as_str()),
        ..query.as_params()
    };
    let filter = StockFilter::parse(&params, today())?;

    let service = StockReportService::new(state.db.acquire().await?);
    let store = service
        .materials_by_store(
            code,
            &filter,
            state.config.reports.default_limit,
            state.config.reports.escape_search_wildcards,
        )
        .await?;

    Ok(Json(StoreMaterialsResponse {
        success: true,
        message: format!("تم جلب مواد المستودع {} بنجاح", code),
        timestamp: Utc::now(),
        filters: filter,
        store,
    }))
}
