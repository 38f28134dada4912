//! Per-store stock listings from the live ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    optional_store_code, parse_choice, parse_date, parse_guid, parse_limit, parse_min_qty,
    normalize_search, DateRange, ParamError, Period, SortOrder, StockSortBy, StoreCode,
    StoreMaterials, StoresReport,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::aggregate::{aggregate_by_store, KnownStore, StockRow, StoreScope};
use super::query::{
    build_stock_query, JoinMode, MaterialFilter, ResultBound, SearchText, StockQuery,
};
use crate::error::{AppError, AppResult};

/// Stock report service
#[derive(Clone)]
pub struct StockReportService {
    db: PgPool,
}

/// Raw listing parameters as they arrive in the query string
#[derive(Debug, Default, Clone)]
pub struct StockParams<'a> {
    pub store_code: Option<&'a str>,
    pub search: Option<&'a str>,
    pub min_qty: Option<&'a str>,
    pub period: Option<&'a str>,
    pub start_date: Option<&'a str>,
    pub end_date: Option<&'a str>,
    pub group_guid: Option<&'a str>,
    pub limit: Option<&'a str>,
    pub sort_by: Option<&'a str>,
    pub sort_order: Option<&'a str>,
}

/// Typed listing filter, echoed back to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockFilter {
    pub store_code: Option<StoreCode>,
    pub search: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub min_qty: Option<Decimal>,
    pub group_guid: Option<Uuid>,
    /// Named period as requested; explicit dates override its range
    pub period: Option<Period>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub sort_by: StockSortBy,
    pub sort_order: SortOrder,
}

impl StockFilter {
    /// Coerce raw parameters; a named period is resolved against `today`
    /// unless explicit dates are present.
    pub fn parse(params: &StockParams<'_>, today: NaiveDate) -> Result<Self, ParamError> {
        let period: Option<Period> = parse_choice(params.period)?;
        let explicit = DateRange {
            start: parse_date("startDate", params.start_date)?,
            end: parse_date("endDate", params.end_date)?,
        };

        let dates = match period {
            Some(period) if explicit.is_empty() => period.resolve(today),
            _ => explicit,
        };
        if let (Some(start), Some(end)) = (dates.start, dates.end) {
            if start > end {
                return Err(ParamError::InvertedDateRange {
                    field: "startDate",
                    start,
                    end,
                });
            }
        }

        Ok(Self {
            store_code: optional_store_code(params.store_code),
            search: normalize_search(params.search),
            min_qty: parse_min_qty(params.min_qty)?,
            group_guid: parse_guid("groupGuid", params.group_guid)?,
            period,
            start_date: dates.start,
            end_date: dates.end,
            limit: parse_limit("limit", params.limit)?,
            sort_by: parse_choice(params.sort_by)?.unwrap_or_default(),
            sort_order: parse_choice(params.sort_order)?.unwrap_or_default(),
        })
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Translate into a query for the given scope
    pub fn to_query(
        &self,
        scope: StoreScope,
        default_limit: u32,
        escape_search_wildcards: bool,
    ) -> StockQuery {
        let mut filters = Vec::new();

        let join = match scope {
            StoreScope::Single(code) => {
                filters.push(MaterialFilter::Store(code));
                JoinMode::CrossProduct
            }
            StoreScope::All => {
                match self.store_code {
                    Some(code) => filters.push(MaterialFilter::Store(code)),
                    None => filters.push(MaterialFilter::Stores(StoreCode::ALL.to_vec())),
                }
                JoinMode::LedgerOnly
            }
        };

        if let Some(text) = &self.search {
            filters.push(MaterialFilter::Search(SearchText {
                text: text.clone(),
                escape_wildcards: escape_search_wildcards,
            }));
        }
        if let Some(guid) = self.group_guid {
            filters.push(MaterialFilter::Group(guid));
        }
        let dates = self.date_range();
        if !dates.is_empty() {
            filters.push(MaterialFilter::Dates(dates));
        }
        if let Some(qty) = self.min_qty {
            filters.push(MaterialFilter::MinQty(qty));
        }

        StockQuery {
            filters,
            join,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            bound: ResultBound::for_listing(self.limit, !dates.is_empty(), default_limit),
        }
    }

    /// Stores the response covers: the filtered store, or all of them
    pub fn scope(&self) -> StoreScope {
        match self.store_code {
            Some(code) => StoreScope::Single(code),
            None => StoreScope::All,
        }
    }
}

impl StockReportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Descriptive rows for the known stores
    pub async fn known_stores(&self) -> AppResult<Vec<KnownStore>> {
        let stores = sqlx::query_as::<_, KnownStore>(
            r#"
            SELECT code, name, guid
            FROM stores
            WHERE code = ANY($1)
            ORDER BY LENGTH(code), code
            "#,
        )
        .bind(StoreCode::all_codes())
        .fetch_all(&self.db)
        .await?;

        Ok(stores)
    }

    async fn run(&self, query: &StockQuery, scope: StoreScope) -> AppResult<StoresReport> {
        let known = self.known_stores().await?;
        let bound = build_stock_query(query);

        tracing::debug!(sql = %bound.sql, params = bound.params.len(), "Running stock query");
        let rows = bound.query_as::<StockRow>().fetch_all(&self.db).await?;

        Ok(aggregate_by_store(&known, rows, scope, query.threshold()))
    }

    /// Materials held by every known store (or the filtered one)
    pub async fn materials_by_stores(
        &self,
        filter: &StockFilter,
        default_limit: u32,
        escape_search_wildcards: bool,
    ) -> AppResult<StoresReport> {
        let query = filter.to_query(StoreScope::All, default_limit, escape_search_wildcards);
        self.run(&query, filter.scope()).await
    }

    /// Materials held by one store
    pub async fn materials_by_store(
        &self,
        code: StoreCode,
        filter: &StockFilter,
        default_limit: u32,
        escape_search_wildcards: bool,
    ) -> AppResult<StoreMaterials> {
        let scope = StoreScope::Single(code);
        let query = filter.to_query(scope, default_limit, escape_search_wildcards);
        let report = self.run(&query, scope).await?;

        report
            .stores
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal(format!("store {} missing from report", code)))
    }
}
