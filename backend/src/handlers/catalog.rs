//! HTTP handler for the material catalog

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::PaginationMeta;

use crate::error::AppResult;
use crate::extract::Query;
use crate::services::catalog::{CatalogFilter, CatalogParams, Material, MaterialCatalogService};
use crate::AppState;

/// Default page size for the catalog
const CATALOG_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQueryParams {
    pub search: Option<String>,
    pub group_guid: Option<String>,
    pub unity: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub success: bool,
    pub message: String,
    pub filters: CatalogFilter,
    pub data: Vec<Material>,
    pub pagination: PaginationMeta,
}

/// One page of the material catalog
pub async fn list_materials(
    State(state): State<AppState>,
    Query(query): Query<CatalogQueryParams>,
) -> AppResult<Json<CatalogResponse>> {
    let params = CatalogParams {
        search: query.search.as_deref(),
        group_guid: query.group_guid.as_deref(),
        unity: query.unity.as_deref(),
        page: query.page.as_deref(),
        limit: query.limit.as_deref(),
        sort_by: query.sort_by.as_deref(),
        sort_order: query.sort_order.as_deref(),
    };
    let filter = CatalogFilter::parse(&params, CATALOG_PAGE_SIZE)?;

    let service = MaterialCatalogService::new(state.db.acquire().await?);
    let page = service
        .list_materials(&filter, state.config.reports.escape_search_wildcards)
        .await?;

    Ok(Json(CatalogResponse {
        success: true,
        message: "تم جلب المواد بنجاح".to_string(),
        filters: filter,
        data: page.data,
        pagination: page.pagination,
    }))
}
