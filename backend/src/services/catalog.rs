//! Paginated material catalog

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    normalize_search, parse_choice, parse_guid, parse_limit, parse_page, CatalogSortBy,
    PaginatedResponse, Pagination, PaginationMeta, ParamError, SortOrder,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::query::{build_catalog_query, CatalogQuery, MaterialFilter, SearchText};
use crate::error::AppResult;

/// Material catalog service
#[derive(Clone)]
pub struct MaterialCatalogService {
    db: PgPool,
}

/// A catalog entry with group and pricing columns
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Material {
    pub guid: Uuid,
    pub code: String,
    pub name: String,
    pub latin_name: Option<String>,
    pub unity: Option<String>,
    pub group_guid: Option<Uuid>,
    pub group_code: Option<String>,
    pub group_name: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub high_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub low_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub wholesale_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub retail_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub last_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub avg_price: Option<Decimal>,
    pub price_date: Option<NaiveDate>,
    pub unity2: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub unity2_factor: Option<Decimal>,
    pub unity3: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub unity3_factor: Option<Decimal>,
    pub expire_tracked: bool,
    pub production_tracked: bool,
}

/// Raw catalog parameters as they arrive in the query string
#[derive(Debug, Default, Clone)]
pub struct CatalogParams<'a> {
    pub search: Option<&'a str>,
    pub group_guid: Option<&'a str>,
    pub unity: Option<&'a str>,
    pub page: Option<&'a str>,
    pub limit: Option<&'a str>,
    pub sort_by: Option<&'a str>,
    pub sort_order: Option<&'a str>,
}

/// Typed catalog filter, echoed back to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub group_guid: Option<Uuid>,
    pub unity: Option<String>,
    pub sort_by: CatalogSortBy,
    pub sort_order: SortOrder,
    #[serde(skip)]
    pub pagination: Pagination,
}

impl CatalogFilter {
    /// Coerce raw parameters; `limit` is the page size
    pub fn parse(params: &CatalogParams<'_>, default_limit: u32) -> Result<Self, ParamError> {
        let page = parse_page(params.page)?;
        let per_page = parse_limit("limit", params.limit)?.unwrap_or(default_limit);

        Ok(Self {
            search: normalize_search(params.search),
            group_guid: parse_guid("groupGuid", params.group_guid)?,
            unity: normalize_search(params.unity),
            sort_by: parse_choice(params.sort_by)?.unwrap_or_default(),
            sort_order: parse_choice(params.sort_order)?.unwrap_or_default(),
            pagination: Pagination::new(page, per_page),
        })
    }

    pub fn to_query(&self, escape_search_wildcards: bool) -> CatalogQuery {
        let mut filters = Vec::new();
        if let Some(text) = &self.search {
            filters.push(MaterialFilter::Search(SearchText {
                text: text.clone(),
                escape_wildcards: escape_search_wildcards,
            }));
        }
        if let Some(guid) = self.group_guid {
            filters.push(MaterialFilter::Group(guid));
        }
        if let Some(unity) = &self.unity {
            filters.push(MaterialFilter::Unity(unity.clone()));
        }

        CatalogQuery {
            filters,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            pagination: self.pagination,
        }
    }
}

impl MaterialCatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// One page of visible materials with pagination metadata
    pub async fn list_materials(
        &self,
        filter: &CatalogFilter,
        escape_search_wildcards: bool,
    ) -> AppResult<PaginatedResponse<Material>> {
        let query = filter.to_query(escape_search_wildcards);
        let (page, count) = build_catalog_query(&query);

        let total: i64 = count.query_scalar::<i64>().fetch_one(&self.db).await?;
        let data = page.query_as::<Material>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(filter.pagination, total.max(0) as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let filter = CatalogFilter::parse(&CatalogParams::default(), 50).unwrap();
        assert_eq!(filter.pagination, Pagination::new(1, 50));
        assert_eq!(filter.sort_by, CatalogSortBy::default());
        assert!(filter.to_query(false).filters.is_empty());
    }

    #[test]
    fn test_page_and_limit_drive_pagination() {
        let params = CatalogParams {
            page: Some("2"),
            limit: Some("10"),
            search: Some("salt"),
            unity: Some("kg"),
            ..Default::default()
        };
        let filter = CatalogFilter::parse(&params, 50).unwrap();
        assert_eq!(filter.pagination.offset(), 10);

        let query = filter.to_query(false);
        assert_eq!(query.filters.len(), 2);
        assert!(matches!(query.filters[1], MaterialFilter::Unity(ref u) if u == "kg"));
    }

    #[test]
    fn test_bad_group_guid_is_rejected() {
        let params = CatalogParams {
            group_guid: Some("nope"),
            ..Default::default()
        };
        assert!(CatalogFilter::parse(&params, 50).is_err());
    }
}
