//! HTTP handlers for store summaries

use axum::{extract::State, Json};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use shared::{parse_store_code, Store};

use crate::error::AppResult;
use crate::extract::Path;
use crate::services::stores::{StatsTotals, StoreService, StoreStats, StoreSummary};
use crate::AppState;

#[derive(Serialize)]
pub struct StoresListResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub stores: Vec<Store>,
}

#[derive(Serialize)]
pub struct StoresSummaryResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub stores: Vec<StoreSummary>,
}

#[derive(Serialize)]
pub struct StoreSummaryResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub store: StoreSummary,
}

#[derive(Serialize)]
pub struct DetailedStatsResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub totals: StatsTotals,
    pub stores: Vec<StoreStats>,
}

/// All store rows
pub async fn stores_list(State(state): State<AppState>) -> AppResult<Json<StoresListResponse>> {
    let service = StoreService::new(state.db.acquire().await?);
    let stores = service.list_stores().await?;

    Ok(Json(StoresListResponse {
        success: true,
        message: "تم جلب قائمة المستودعات بنجاح".to_string(),
        count: stores.len(),
        stores,
    }))
}

/// Stock totals for every known store
pub async fn stores_summary(
    State(state): State<AppState>,
) -> AppResult<Json<StoresSummaryResponse>> {
    let service = StoreService::new(state.db.acquire().await?);
    let stores = service.stores_summary().await?;

    Ok(Json(StoresSummaryResponse {
        success: true,
        message: "تم جلب ملخص المستودعات بنجاح".to_string(),
        timestamp: Utc::now(),
        stores,
    }))
}

/// Stock totals for one store
pub async fn store_summary(
    State(state): State<AppState>,
    Path(store_code): Path<String>,
) -> AppResult<Json<StoreSummaryResponse>> {
    let code = parse_store_code(&store_code)?;

    let service = StoreService::new(state.db.acquire().await?);
    let store = service.store_summary(code).await?;

    Ok(Json(StoreSummaryResponse {
        success: true,
        message: format!("تم جلب ملخص المستودع {} بنجاح", code),
        timestamp: Utc::now(),
        store,
    }))
}

/// Per-store ledger statistics with overall totals
pub async fn stores_detailed_stats(
    State(state): State<AppState>,
) -> AppResult<Json<DetailedStatsResponse>> {
    let service = StoreService::new(state.db.acquire().await?);
    let stores = service.detailed_stats(Local::now().date_naive()).await?;

    Ok(Json(DetailedStatsResponse {
        success: true,
        message: "تم جلب الإحصائيات التفصيلية بنجاح".to_string(),
        timestamp: Utc::now(),
        totals: StatsTotals::from_stats(&stores),
        stores,
    }))
}
