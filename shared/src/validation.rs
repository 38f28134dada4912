//! Request parameter validation
//!
//! Query strings arrive as raw text. These helpers coerce them into typed
//! values; an empty string is treated the same as an absent parameter.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::StoreCode;
use crate::types::MAX_LIMIT;

/// A query parameter that could not be coerced to its expected type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{field}: '{value}' is not a valid number")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a valid identifier")]
    InvalidGuid { field: &'static str, value: String },

    #[error("{field}: '{value}' is not one of {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("storeCode: '{0}' is not a known store code")]
    InvalidStoreCode(String),

    #[error("{field}: start date {start} is after end date {end}")]
    InvertedDateRange {
        field: &'static str,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl ParamError {
    /// Name of the offending query parameter
    pub fn field(&self) -> &'static str {
        match self {
            ParamError::InvalidNumber { field, .. }
            | ParamError::InvalidDate { field, .. }
            | ParamError::InvalidGuid { field, .. }
            | ParamError::InvalidChoice { field, .. }
            | ParamError::InvertedDateRange { field, .. } => field,
            ParamError::InvalidStoreCode(_) => "storeCode",
        }
    }

    /// Arabic message shown to API clients
    pub fn message_ar(&self) -> String {
        match self {
            ParamError::InvalidNumber { field, value } => {
                format!("قيمة غير صالحة للمعامل {}: '{}' ليست رقماً", field, value)
            }
            ParamError::InvalidDate { field, value } => {
                format!("تاريخ غير صالح للمعامل {}: '{}'", field, value)
            }
            ParamError::InvalidGuid { field, value } => {
                format!("معرف غير صالح للمعامل {}: '{}'", field, value)
            }
            ParamError::InvalidChoice { field, value, allowed } => {
                format!("قيمة غير مسموحة للمعامل {}: '{}' (المسموح: {})", field, value, allowed)
            }
            ParamError::InvalidStoreCode(code) => {
                format!("رمز المستودع '{}' غير صالح. الرموز المسموحة: 12, 101, 102", code)
            }
            ParamError::InvertedDateRange { start, end, .. } => {
                format!("تاريخ البداية {} بعد تاريخ النهاية {}", start, end)
            }
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a store code from a path segment; anything outside the known set is rejected
pub fn parse_store_code(value: &str) -> Result<StoreCode, ParamError> {
    value
        .trim()
        .parse()
        .map_err(|_| ParamError::InvalidStoreCode(value.to_string()))
}

/// Optional store filter: unknown codes are dropped rather than rejected
pub fn optional_store_code(value: Option<&str>) -> Option<StoreCode> {
    present(value).and_then(|v| v.parse().ok())
}

/// Optional row limit, clamped to `[1, MAX_LIMIT]`
pub fn parse_limit(field: &'static str, value: Option<&str>) -> Result<Option<u32>, ParamError> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };
    let parsed = raw.parse::<i64>().map_err(|_| ParamError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;
    Ok(Some(parsed.clamp(1, i64::from(MAX_LIMIT)) as u32))
}

/// Page number, defaulting to 1; values below 1 become 1
pub fn parse_page(value: Option<&str>) -> Result<u32, ParamError> {
    let Some(raw) = present(value) else {
        return Ok(1);
    };
    let parsed = raw.parse::<i64>().map_err(|_| ParamError::InvalidNumber {
        field: "page",
        value: raw.to_string(),
    })?;
    Ok(parsed.clamp(1, i64::from(u32::MAX)) as u32)
}

/// Minimum quantity threshold; zero or negative values mean "not specified"
pub fn parse_min_qty(value: Option<&str>) -> Result<Option<Decimal>, ParamError> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };
    let parsed = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ParamError::InvalidNumber {
            field: "minQty",
            value: raw.to_string(),
        })?;
    Ok((parsed > Decimal::ZERO).then_some(parsed))
}

/// Calendar date in `YYYY-MM-DD` form; full RFC 3339 timestamps are accepted and truncated
pub fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ParamError> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|_| ParamError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

/// Optional GUID filter
pub fn parse_guid(field: &'static str, value: Option<&str>) -> Result<Option<Uuid>, ParamError> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };
    Uuid::parse_str(raw).map(Some).map_err(|_| ParamError::InvalidGuid {
        field,
        value: raw.to_string(),
    })
}

/// Optional enumerated parameter (sort keys, periods)
pub fn parse_choice<T>(value: Option<&str>) -> Result<Option<T>, ParamError>
where
    T: FromStr<Err = ParamError>,
{
    present(value).map(|v| v.parse::<T>()).transpose()
}

/// Trimmed free-text search; blank input means no search
pub fn normalize_search(value: Option<&str>) -> Option<String> {
    present(value).map(str::to_string)
}

/// Spreadsheet uploads must carry an Excel extension
pub fn is_excel_filename(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".xls")
}
