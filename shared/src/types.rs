//! Common types used across the service

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::validation::ParamError;

/// Upper bound for any requested page size or row limit
pub const MAX_LIMIT: u32 = 10_000;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParamError::InvalidChoice {
                field: "sortOrder",
                value: s.to_string(),
                allowed: "asc, desc",
            }),
        }
    }
}

/// Sort keys accepted by the per-store stock listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockSortBy {
    #[default]
    Name,
    Code,
    Qty,
    Date,
}

impl FromStr for StockSortBy {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(StockSortBy::Name),
            "code" => Ok(StockSortBy::Code),
            "qty" | "quantity" => Ok(StockSortBy::Qty),
            "date" => Ok(StockSortBy::Date),
            _ => Err(ParamError::InvalidChoice {
                field: "sortBy",
                value: s.to_string(),
                allowed: "name, code, qty, date",
            }),
        }
    }
}

/// Sort keys accepted by the material catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSortBy {
    #[default]
    Name,
    Code,
    Date,
}

impl FromStr for CatalogSortBy {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(CatalogSortBy::Name),
            "code" => Ok(CatalogSortBy::Code),
            "date" => Ok(CatalogSortBy::Date),
            _ => Err(ParamError::InvalidChoice {
                field: "sortBy",
                value: s.to_string(),
                allowed: "name, code, date",
            }),
        }
    }
}

/// Page request, always normalized to `page >= 1` and `1 <= per_page <= MAX_LIMIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_LIMIT),
        }
    }

    /// Number of rows to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
    /// 1-based index of the first item on this page
    pub from: u64,
    /// 1-based index of the last item on this page, capped at `total_items`
    pub to: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let per_page = u64::from(pagination.per_page);
        let total_pages = total_items.div_ceil(per_page);
        let from = pagination.offset() + 1;
        let to = (pagination.offset() + per_page).min(total_items);

        Self {
            current_page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages,
            from,
            to,
            has_previous: pagination.page > 1,
            has_next: u64::from(pagination.page) < total_pages,
        }
    }
}

/// Inclusive date range; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Named reporting period, resolved against the current date at request time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    LastWeek,
    LastMonth,
    #[serde(rename = "last_3_months")]
    Last3Months,
    #[serde(rename = "last_6_months")]
    Last6Months,
    LastYear,
    CurrentMonth,
    CurrentYear,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::LastWeek => "last_week",
            Period::LastMonth => "last_month",
            Period::Last3Months => "last_3_months",
            Period::Last6Months => "last_6_months",
            Period::LastYear => "last_year",
            Period::CurrentMonth => "current_month",
            Period::CurrentYear => "current_year",
        }
    }

    /// Concrete `[start, end]` for this period, ending on `today`
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        let months_back = |n: u32| today.checked_sub_months(Months::new(n)).unwrap_or(today);

        let start = match self {
            Period::Today => today,
            Period::LastWeek => today.checked_sub_days(Days::new(7)).unwrap_or(today),
            Period::LastMonth => months_back(1),
            Period::Last3Months => months_back(3),
            Period::Last6Months => months_back(6),
            Period::LastYear => months_back(12),
            Period::CurrentMonth => today.with_day(1).unwrap_or(today),
            Period::CurrentYear => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };

        DateRange::between(start, today)
    }
}

impl FromStr for Period {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "today" => Ok(Period::Today),
            "last_week" => Ok(Period::LastWeek),
            "last_month" => Ok(Period::LastMonth),
            "last_3_months" => Ok(Period::Last3Months),
            "last_6_months" => Ok(Period::Last6Months),
            "last_year" => Ok(Period::LastYear),
            "current_month" => Ok(Period::CurrentMonth),
            "current_year" => Ok(Period::CurrentYear),
            _ => Err(ParamError::InvalidChoice {
                field: "period",
                value: s.to_string(),
                allowed: "today, last_week, last_month, last_3_months, last_6_months, last_year, current_month, current_year",
            }),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
