//! Parameterized query construction for stock listings and the material catalog
//!
//! Requests are turned into a list of [`MaterialFilter`]s. Each filter maps to
//! exactly one SQL clause whose values are bound as `$n` parameters; the only
//! text ever interpolated into SQL comes from the fixed column and join tables
//! in this module.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{CatalogSortBy, DateRange, Pagination, SortOrder, StockSortBy, StoreCode};
use sqlx::{
    postgres::PgArguments,
    query::{QueryAs, QueryScalar},
    Postgres,
};
use uuid::Uuid;

/// A value bound to a `$n` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
    Uuid(Uuid),
    Decimal(Decimal),
    Date(NaiveDate),
    Int(i64),
}

/// SQL text plus its parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl BoundQuery {
    /// Prepare a typed query with every parameter bound
    pub fn query_as<O>(&self) -> QueryAs<'_, Postgres, O, PgArguments>
    where
        O: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        let mut query = sqlx::query_as::<_, O>(&self.sql);
        for param in &self.params {
            query = match param.clone() {
                SqlParam::Text(v) => query.bind(v),
                SqlParam::TextArray(v) => query.bind(v),
                SqlParam::Uuid(v) => query.bind(v),
                SqlParam::Decimal(v) => query.bind(v),
                SqlParam::Date(v) => query.bind(v),
                SqlParam::Int(v) => query.bind(v),
            };
        }
        query
    }

    /// Prepare a single-value query with every parameter bound
    pub fn query_scalar<O>(&self) -> QueryScalar<'_, Postgres, O, PgArguments>
    where
        (O,): for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        let mut query = sqlx::query_scalar::<_, O>(&self.sql);
        for param in &self.params {
            query = match param.clone() {
                SqlParam::Text(v) => query.bind(v),
                SqlParam::TextArray(v) => query.bind(v),
                SqlParam::Uuid(v) => query.bind(v),
                SqlParam::Decimal(v) => query.bind(v),
                SqlParam::Date(v) => query.bind(v),
                SqlParam::Int(v) => query.bind(v),
            };
        }
        query
    }
}

/// Free-text search over material name and code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchText {
    pub text: String,
    /// Match `%`, `_` and `\` literally instead of as LIKE wildcards
    pub escape_wildcards: bool,
}

impl SearchText {
    /// Case-insensitive substring pattern, `%text%`
    pub fn like_pattern(&self) -> String {
        let lower = self.text.to_lowercase();
        let body = if self.escape_wildcards {
            lower
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        } else {
            lower
        };
        format!("%{}%", body)
    }
}

/// One optional restriction on a listing
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialFilter {
    /// A single store
    Store(StoreCode),
    /// Any of several stores
    Stores(Vec<StoreCode>),
    /// Name/code substring match
    Search(SearchText),
    /// Exact material group
    Group(Uuid),
    /// Exact unit of measure
    Unity(String),
    /// Inclusive bounds on movement production date
    Dates(DateRange),
    /// Aggregated quantity must be at least this value (> 0)
    MinQty(Decimal),
}

/// How stores, materials and movements are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Every store paired with every material, movements left-joined
    CrossProduct,
    /// Only pairs that have movement records
    LedgerOnly,
}

/// How many rows a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultBound {
    Limit(u32),
    Page(Pagination),
    Unbounded,
}

impl ResultBound {
    /// Listing policy: an explicit limit wins; otherwise a date-filtered
    /// listing is unbounded and anything else gets the default limit.
    pub fn for_listing(limit: Option<u32>, has_date_filter: bool, default_limit: u32) -> Self {
        match limit {
            Some(n) => ResultBound::Limit(n),
            None if has_date_filter => ResultBound::Unbounded,
            None => ResultBound::Limit(default_limit),
        }
    }
}

/// A per-store stock listing request
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuery {
    pub filters: Vec<MaterialFilter>,
    pub join: JoinMode,
    pub sort_by: StockSortBy,
    pub sort_order: SortOrder,
    pub bound: ResultBound,
}

impl StockQuery {
    /// Quantity a (store, material) pair must reach to be listed
    pub fn threshold(&self) -> QuantityThreshold {
        self.filters
            .iter()
            .find_map(|f| match f {
                MaterialFilter::MinQty(qty) if *qty > Decimal::ZERO => {
                    Some(QuantityThreshold::AtLeast(*qty))
                }
                _ => None,
            })
            .unwrap_or(QuantityThreshold::Positive)
    }

    pub fn has_date_filter(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, MaterialFilter::Dates(range) if !range.is_empty()))
    }
}

/// Post-aggregation quantity filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityThreshold {
    /// Aggregated quantity > 0
    Positive,
    /// Aggregated quantity >= n, with n > 0
    AtLeast(Decimal),
}

impl QuantityThreshold {
    pub fn admits(&self, quantity: Decimal) -> bool {
        match self {
            QuantityThreshold::Positive => quantity > Decimal::ZERO,
            QuantityThreshold::AtLeast(min) => quantity >= *min,
        }
    }
}

/// A material catalog page request
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub filters: Vec<MaterialFilter>,
    pub sort_by: CatalogSortBy,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

#[derive(Default)]
struct Params(Vec<SqlParam>);

impl Params {
    /// Register a value and return its placeholder
    fn bind(&mut self, param: SqlParam) -> String {
        self.0.push(param);
        format!("${}", self.0.len())
    }
}

const STOCK_GROUP_BY: &str =
    "s.code, s.name, s.guid, m.guid, m.code, m.name, m.latin_name, m.unity, g.guid, g.name";

const STOCK_SELECT: &str = r#"SELECT
    s.code AS store_code,
    s.name AS store_name,
    s.guid AS store_guid,
    m.guid AS material_guid,
    m.code AS material_code,
    m.name AS material_name,
    m.latin_name,
    m.unity,
    g.guid AS group_guid,
    g.name AS group_name,
    COALESCE(SUM(mv.qty), 0) AS store_qty,
    AVG(mv.price) AS avg_price,
    MAX(mv.production_date) AS last_production_date,
    MIN(mv.expire_date) AS nearest_expire_date,
    COUNT(mv.guid) AS transactions_count"#;

fn stock_sort_column(sort_by: StockSortBy) -> &'static str {
    match sort_by {
        StockSortBy::Name => "m.name",
        StockSortBy::Code => "m.code",
        StockSortBy::Qty => "store_qty",
        StockSortBy::Date => "last_production_date",
    }
}

fn catalog_sort_column(sort_by: CatalogSortBy) -> &'static str {
    match sort_by {
        CatalogSortBy::Name => "m.name",
        CatalogSortBy::Code => "m.code",
        CatalogSortBy::Date => "m.price_date",
    }
}

/// Clause for filters on the store or material row
fn material_clause(filter: &MaterialFilter, params: &mut Params) -> Option<String> {
    match filter {
        MaterialFilter::Store(code) => {
            let p = params.bind(SqlParam::Text(code.as_str().to_string()));
            Some(format!("s.code = {}", p))
        }
        MaterialFilter::Stores(codes) => {
            let codes = codes.iter().map(|c| c.as_str().to_string()).collect();
            let p = params.bind(SqlParam::TextArray(codes));
            Some(format!("s.code = ANY({})", p))
        }
        MaterialFilter::Search(search) => {
            let p = params.bind(SqlParam::Text(search.like_pattern()));
            Some(format!("(LOWER(m.name) LIKE {p} OR LOWER(m.code) LIKE {p})"))
        }
        MaterialFilter::Group(guid) => {
            let p = params.bind(SqlParam::Uuid(*guid));
            Some(format!("m.group_guid = {}", p))
        }
        MaterialFilter::Unity(unity) => {
            let p = params.bind(SqlParam::Text(unity.clone()));
            Some(format!("m.unity = {}", p))
        }
        MaterialFilter::Dates(_) | MaterialFilter::MinQty(_) => None,
    }
}

/// Clauses restricting which movement records are aggregated
fn movement_clauses(filter: &MaterialFilter, params: &mut Params) -> Vec<String> {
    let MaterialFilter::Dates(range) = filter else {
        return Vec::new();
    };
    let mut clauses = Vec::new();
    if let Some(start) = range.start {
        let p = params.bind(SqlParam::Date(start));
        clauses.push(format!("mv.production_date >= {}", p));
    }
    if let Some(end) = range.end {
        let p = params.bind(SqlParam::Date(end));
        clauses.push(format!("mv.production_date <= {}", p));
    }
    clauses
}

fn bound_clause(bound: ResultBound, params: &mut Params) -> Option<String> {
    match bound {
        ResultBound::Limit(n) => {
            let p = params.bind(SqlParam::Int(i64::from(n)));
            Some(format!("FETCH FIRST {} ROWS ONLY", p))
        }
        ResultBound::Page(page) => {
            let offset = params.bind(SqlParam::Int(page.offset() as i64));
            let fetch = params.bind(SqlParam::Int(i64::from(page.per_page)));
            Some(format!("OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, fetch))
        }
        ResultBound::Unbounded => None,
    }
}

/// Build the aggregated (store, material) stock query
pub fn build_stock_query(query: &StockQuery) -> BoundQuery {
    let mut params = Params::default();
    let mut movement = Vec::new();
    let mut row = Vec::new();

    for filter in &query.filters {
        movement.extend(movement_clauses(filter, &mut params));
        row.extend(material_clause(filter, &mut params));
    }

    let from = match query.join {
        JoinMode::CrossProduct => {
            let mut on = String::from("mv.store_guid = s.guid AND mv.material_guid = m.guid");
            for clause in &movement {
                on.push_str(" AND ");
                on.push_str(clause);
            }
            format!(
                "FROM stores s\nCROSS JOIN materials m\nLEFT JOIN material_groups g ON g.guid = m.group_guid\nLEFT JOIN store_movements mv ON {}",
                on
            )
        }
        JoinMode::LedgerOnly => {
            row.splice(0..0, movement.drain(..));
            "FROM store_movements mv\nJOIN stores s ON s.guid = mv.store_guid\nJOIN materials m ON m.guid = mv.material_guid\nLEFT JOIN material_groups g ON g.guid = m.group_guid".to_string()
        }
    };

    let having = match query.threshold() {
        QuantityThreshold::AtLeast(qty) => {
            let p = params.bind(SqlParam::Decimal(qty));
            format!("COALESCE(SUM(mv.qty), 0) >= {}", p)
        }
        QuantityThreshold::Positive => "COALESCE(SUM(mv.qty), 0) > 0".to_string(),
    };

    let mut sql = format!("{}\n{}", STOCK_SELECT, from);
    if !row.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&row.join("\n  AND "));
    }
    sql.push_str(&format!("\nGROUP BY {}", STOCK_GROUP_BY));
    sql.push_str(&format!("\nHAVING {}", having));

    let nulls = match query.sort_by {
        StockSortBy::Date => " NULLS LAST",
        _ => "",
    };
    sql.push_str(&format!(
        "\nORDER BY LENGTH(s.code), s.code, {} {}{}, m.code ASC, m.guid ASC",
        stock_sort_column(query.sort_by),
        query.sort_order.as_sql(),
        nulls
    ));

    if let Some(bound) = bound_clause(query.bound, &mut params) {
        sql.push('\n');
        sql.push_str(&bound);
    }

    BoundQuery {
        sql,
        params: params.0,
    }
}

const CATALOG_SELECT: &str = r#"SELECT
    m.guid, m.code, m.name, m.latin_name, m.unity,
    m.group_guid, g.code AS group_code, g.name AS group_name,
    m.high_price, m.low_price, m.wholesale_price, m.retail_price,
    m.last_price, m.avg_price, m.price_date,
    m.unity2, m.unity2_factor, m.unity3, m.unity3_factor,
    m.expire_tracked, m.production_tracked"#;

const CATALOG_FROM: &str =
    "FROM materials m\nLEFT JOIN material_groups g ON g.guid = m.group_guid";

fn catalog_where(filters: &[MaterialFilter], params: &mut Params) -> String {
    let mut clauses = vec!["m.is_hidden = FALSE".to_string()];
    for filter in filters {
        match filter {
            MaterialFilter::Search(_) | MaterialFilter::Group(_) | MaterialFilter::Unity(_) => {
                clauses.extend(material_clause(filter, params));
            }
            // ledger and store filters do not apply to the catalog
            _ => {}
        }
    }
    format!("WHERE {}", clauses.join("\n  AND "))
}

/// Build the catalog page query and its matching total-count query
pub fn build_catalog_query(query: &CatalogQuery) -> (BoundQuery, BoundQuery) {
    let mut count_params = Params::default();
    let count_sql = format!(
        "SELECT COUNT(*) {}\n{}",
        CATALOG_FROM,
        catalog_where(&query.filters, &mut count_params)
    );

    let mut params = Params::default();
    let mut sql = format!(
        "{}\n{}\n{}",
        CATALOG_SELECT,
        CATALOG_FROM,
        catalog_where(&query.filters, &mut params)
    );
    sql.push_str(&format!(
        "\nORDER BY {} {}, m.code ASC, m.guid ASC",
        catalog_sort_column(query.sort_by),
        query.sort_order.as_sql()
    ));
    if let Some(bound) = bound_clause(ResultBound::Page(query.pagination), &mut params) {
        sql.push('\n');
        sql.push_str(&bound);
    }

    (
        BoundQuery {
            sql,
            params: params.0,
        },
        BoundQuery {
            sql: count_sql,
            params: count_params.0,
        },
    )
}
