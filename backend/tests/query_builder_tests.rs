//! Query builder tests
//!
//! Tests for the stock and catalog query builders including:
//! - Every filter value travels as a bound parameter
//! - Join shape per scope
//! - Result bound policy
//! - Period resolution for listing filters

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    CatalogSortBy, DateRange, Pagination, Period, SortOrder, StockSortBy, StoreCode,
};
use uuid::Uuid;

use inventory_reports::services::aggregate::StoreScope;
use inventory_reports::services::query::{
    build_catalog_query, build_stock_query, CatalogQuery, JoinMode, MaterialFilter,
    QuantityThreshold, ResultBound, SearchText, SqlParam, StockQuery,
};
use inventory_reports::services::stock::{StockFilter, StockParams};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn stock_query(filters: Vec<MaterialFilter>, join: JoinMode) -> StockQuery {
    StockQuery {
        filters,
        join,
        sort_by: StockSortBy::Name,
        sort_order: SortOrder::Asc,
        bound: ResultBound::Limit(1000),
    }
}

/// Highest `$n` placeholder in the SQL text
fn max_placeholder(sql: &str) -> usize {
    sql.match_indices('$')
        .filter_map(|(idx, _)| {
            let digits: String = sql[idx + 1..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
        .max()
        .unwrap_or(0)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Single-store listings pair every material with the store
    #[test]
    fn test_cross_product_keeps_dates_in_join() {
        let query = stock_query(
            vec![
                MaterialFilter::Store(StoreCode::FinishedGoods),
                MaterialFilter::Dates(DateRange::between(date(2024, 1, 1), date(2024, 1, 31))),
            ],
            JoinMode::CrossProduct,
        );
        let bound = build_stock_query(&query);

        assert!(bound.sql.contains("CROSS JOIN materials m"));
        assert!(bound.sql.contains("LEFT JOIN store_movements mv ON"));
        assert!(bound.sql.contains("AND mv.production_date >= $2"));
        assert!(bound.sql.contains("AND mv.production_date <= $3"));
        assert!(bound.sql.contains("WHERE s.code = $1"));
        assert_eq!(bound.params[0], SqlParam::Text("12".into()));
        assert_eq!(bound.params[1], SqlParam::Date(date(2024, 1, 1)));
        assert_eq!(bound.params[2], SqlParam::Date(date(2024, 1, 31)));
    }

    /// All-store listings start from the ledger and filter dates in WHERE
    #[test]
    fn test_ledger_only_moves_dates_to_where() {
        let query = stock_query(
            vec![
                MaterialFilter::Stores(StoreCode::ALL.to_vec()),
                MaterialFilter::Dates(DateRange {
                    start: Some(date(2024, 3, 1)),
                    end: None,
                }),
            ],
            JoinMode::LedgerOnly,
        );
        let bound = build_stock_query(&query);

        assert!(bound.sql.contains("FROM store_movements mv"));
        assert!(!bound.sql.contains("CROSS JOIN"));
        assert!(bound.sql.contains("mv.production_date >= $2"));
        assert!(!bound.sql.contains("mv.production_date <="));
        assert!(bound.sql.contains("s.code = ANY($1)"));
        assert_eq!(
            bound.params[0],
            SqlParam::TextArray(vec!["12".into(), "101".into(), "102".into()])
        );
    }

    /// Without minQty the HAVING clause is a strict positive check
    #[test]
    fn test_default_threshold_is_positive() {
        let bound = build_stock_query(&stock_query(vec![], JoinMode::LedgerOnly));
        assert!(bound.sql.contains("HAVING COALESCE(SUM(mv.qty), 0) > 0"));
    }

    /// minQty=0 behaves exactly like no minQty
    #[test]
    fn test_zero_min_qty_matches_default() {
        let with_zero = stock_query(vec![MaterialFilter::MinQty(Decimal::ZERO)], JoinMode::LedgerOnly);
        let without = stock_query(vec![], JoinMode::LedgerOnly);

        assert_eq!(with_zero.threshold(), QuantityThreshold::Positive);
        assert_eq!(build_stock_query(&with_zero), build_stock_query(&without));
    }

    /// A positive minQty is bound into HAVING
    #[test]
    fn test_min_qty_is_bound() {
        let query = stock_query(
            vec![MaterialFilter::MinQty(Decimal::new(50, 0))],
            JoinMode::LedgerOnly,
        );
        let bound = build_stock_query(&query);

        assert!(bound.sql.contains("HAVING COALESCE(SUM(mv.qty), 0) >= $1"));
        assert_eq!(bound.params[0], SqlParam::Decimal(Decimal::new(50, 0)));
        assert_eq!(bound.params[1], SqlParam::Int(1000));
    }

    /// Ordering always starts with the store and ends with tie-breakers
    #[test]
    fn test_order_is_deterministic() {
        let mut query = stock_query(vec![], JoinMode::LedgerOnly);
        query.sort_by = StockSortBy::Date;
        query.sort_order = SortOrder::Desc;
        let bound = build_stock_query(&query);

        assert!(bound.sql.contains(
            "ORDER BY LENGTH(s.code), s.code, last_production_date DESC NULLS LAST, m.code ASC, m.guid ASC"
        ));
    }

    /// Date-filtered listings without a limit carry no bound
    #[test]
    fn test_unbounded_has_no_fetch_clause() {
        let mut query = stock_query(vec![], JoinMode::LedgerOnly);
        query.bound = ResultBound::Unbounded;
        let bound = build_stock_query(&query);

        assert!(!bound.sql.contains("FETCH"));
        assert!(bound.params.is_empty());
    }

    /// Catalog pages use OFFSET/FETCH and exclude hidden materials
    #[test]
    fn test_catalog_page_query() {
        let query = CatalogQuery {
            filters: vec![
                MaterialFilter::Search(SearchText {
                    text: "Salt".into(),
                    escape_wildcards: false,
                }),
                MaterialFilter::Unity("kg".into()),
                // ignored by the catalog
                MaterialFilter::Store(StoreCode::FinishedGoods),
            ],
            sort_by: CatalogSortBy::Date,
            sort_order: SortOrder::Desc,
            pagination: Pagination::new(2, 10),
        };
        let (page, count) = build_catalog_query(&query);

        assert!(page.sql.contains("m.is_hidden = FALSE"));
        assert!(count.sql.contains("m.is_hidden = FALSE"));
        assert!(!page.sql.contains("s.code"));
        assert!(page.sql.contains("ORDER BY m.price_date DESC"));
        assert!(page.sql.contains("OFFSET $3 ROWS FETCH NEXT $4 ROWS ONLY"));
        assert_eq!(page.params[0], SqlParam::Text("%salt%".into()));
        assert_eq!(page.params[2], SqlParam::Int(10));
        assert_eq!(page.params[3], SqlParam::Int(10));
        assert_eq!(count.params.len(), 2);
    }

    /// last_week resolves to seven days back through today
    #[test]
    fn test_last_week_period_filter() {
        let params = StockParams {
            period: Some("last_week"),
            ..Default::default()
        };
        let today = date(2024, 5, 15);
        let filter = StockFilter::parse(&params, today).unwrap();

        assert_eq!(filter.period, Some(Period::LastWeek));
        assert_eq!(filter.start_date, Some(date(2024, 5, 8)));
        assert_eq!(filter.end_date, Some(today));

        let query = filter.to_query(StoreScope::All, 1000, false);
        assert!(query.has_date_filter());
        assert_eq!(query.bound, ResultBound::Unbounded);

        let bound = build_stock_query(&query);
        assert!(bound.params.contains(&SqlParam::Date(date(2024, 5, 8))));
        assert!(bound.params.contains(&SqlParam::Date(today)));
    }

    /// Explicit dates take precedence over a named period
    #[test]
    fn test_explicit_dates_beat_period() {
        let params = StockParams {
            period: Some("last_year"),
            start_date: Some("2024-02-01"),
            ..Default::default()
        };
        let filter = StockFilter::parse(&params, date(2024, 5, 15)).unwrap();

        assert_eq!(filter.period, Some(Period::LastYear));
        assert_eq!(filter.start_date, Some(date(2024, 2, 1)));
        assert_eq!(filter.end_date, None);
    }

    /// Unknown periods, bad dates and inverted ranges are rejected
    #[test]
    fn test_invalid_listing_parameters() {
        let today = date(2024, 5, 15);
        for params in [
            StockParams {
                period: Some("fortnight"),
                ..Default::default()
            },
            StockParams {
                start_date: Some("15/05/2024"),
                ..Default::default()
            },
            StockParams {
                start_date: Some("2024-05-10"),
                end_date: Some("2024-05-01"),
                ..Default::default()
            },
            StockParams {
                group_guid: Some("not-a-guid"),
                ..Default::default()
            },
            StockParams {
                sort_by: Some("price"),
                ..Default::default()
            },
        ] {
            assert!(StockFilter::parse(&params, today).is_err(), "{:?}", params);
        }
    }

    /// An unknown storeCode filter is dropped rather than rejected
    #[test]
    fn test_unknown_store_filter_is_ignored() {
        let params = StockParams {
            store_code: Some("999"),
            ..Default::default()
        };
        let filter = StockFilter::parse(&params, date(2024, 5, 15)).unwrap();
        assert_eq!(filter.store_code, None);
        assert_eq!(filter.scope(), StoreScope::All);
    }

    /// A known storeCode narrows both the query and the response scope
    #[test]
    fn test_store_filter_narrows_scope() {
        let params = StockParams {
            store_code: Some("102"),
            min_qty: Some("50"),
            group_guid: Some("6f9619ff-8b86-d011-b42d-00c04fc964ff"),
            ..Default::default()
        };
        let filter = StockFilter::parse(&params, date(2024, 5, 15)).unwrap();
        assert_eq!(filter.scope(), StoreScope::Single(StoreCode::ActiveMaterials));

        let query = filter.to_query(StoreScope::All, 1000, false);
        assert_eq!(query.join, JoinMode::LedgerOnly);
        assert!(query
            .filters
            .contains(&MaterialFilter::Store(StoreCode::ActiveMaterials)));
        assert!(query.filters.contains(&MaterialFilter::Group(
            Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap()
        )));
        assert_eq!(query.bound, ResultBound::Limit(1000));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn filter_strategy() -> impl Strategy<Value = MaterialFilter> {
        prop_oneof![
            prop::sample::select(StoreCode::ALL.to_vec()).prop_map(MaterialFilter::Store),
            ".{0,20}".prop_map(|text| MaterialFilter::Search(SearchText {
                text,
                escape_wildcards: false,
            })),
            any::<u128>().prop_map(|n| MaterialFilter::Group(Uuid::from_u128(n))),
            (0i64..10_000).prop_map(|n| MaterialFilter::MinQty(Decimal::new(n, 1))),
            (0u32..365, 0u32..365).prop_map(|(a, b)| {
                let base = date(2023, 1, 1);
                MaterialFilter::Dates(DateRange::between(
                    base + chrono::Days::new(u64::from(a.min(b))),
                    base + chrono::Days::new(u64::from(a.max(b))),
                ))
            }),
        ]
    }

    fn join_strategy() -> impl Strategy<Value = JoinMode> {
        prop_oneof![Just(JoinMode::CrossProduct), Just(JoinMode::LedgerOnly)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Every placeholder has exactly one bound parameter
        #[test]
        fn prop_placeholders_match_params(
            filters in prop::collection::vec(filter_strategy(), 0..6),
            join in join_strategy(),
            limit in prop::option::of(1u32..10_000)
        ) {
            let mut query = stock_query(filters, join);
            query.bound = limit.map(ResultBound::Limit).unwrap_or(ResultBound::Unbounded);
            let bound = build_stock_query(&query);

            prop_assert_eq!(max_placeholder(&bound.sql), bound.params.len());
        }

        /// Search text never reaches the SQL text
        #[test]
        fn prop_search_text_is_never_interpolated(text in "[a-z]{12,20}") {
            let query = stock_query(
                vec![MaterialFilter::Search(SearchText {
                    text: text.clone(),
                    escape_wildcards: true,
                })],
                JoinMode::LedgerOnly,
            );
            let bound = build_stock_query(&query);

            prop_assert!(!bound.sql.contains(&text));
            let pattern = SqlParam::Text(format!("%{}%", text));
            prop_assert!(bound.params.contains(&pattern));
        }

        /// The same request always yields the same query
        #[test]
        fn prop_builder_is_deterministic(
            filters in prop::collection::vec(filter_strategy(), 0..6),
            join in join_strategy()
        ) {
            let query = stock_query(filters, join);
            prop_assert_eq!(build_stock_query(&query), build_stock_query(&query));
        }

        /// Catalog page and count queries bind the same filter values
        #[test]
        fn prop_catalog_count_shares_filters(
            filters in prop::collection::vec(filter_strategy(), 0..6),
            page in 1u32..50,
            per_page in 1u32..200
        ) {
            let query = CatalogQuery {
                filters,
                sort_by: CatalogSortBy::Name,
                sort_order: SortOrder::Asc,
                pagination: Pagination::new(page, per_page),
            };
            let (page_query, count) = build_catalog_query(&query);

            prop_assert_eq!(page_query.params.len(), count.params.len() + 2);
            prop_assert_eq!(&page_query.params[..count.params.len()], &count.params[..]);
            prop_assert_eq!(max_placeholder(&count.sql), count.params.len());
        }
    }
}
