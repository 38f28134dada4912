//! Result aggregation tests
//!
//! Tests for reshaping flat stock rows into per-store reports including:
//! - Known stores are always present, in code order
//! - Quantity threshold filtering
//! - Derived totals

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::StoreCode;
use uuid::Uuid;

use inventory_reports::services::aggregate::{aggregate_by_store, KnownStore, StockRow, StoreScope};
use inventory_reports::services::query::QuantityThreshold;

fn row(store: &str, material: &str, qty: i64, price: Option<i64>) -> StockRow {
    StockRow {
        store_code: store.to_string(),
        store_name: format!("Store {}", store),
        store_guid: Uuid::from_u128(store.parse::<u128>().unwrap_or(0)),
        material_guid: Uuid::new_v4(),
        material_code: material.to_string(),
        material_name: format!("Material {}", material),
        latin_name: None,
        unity: Some("kg".to_string()),
        group_guid: None,
        group_name: None,
        store_qty: Decimal::from(qty),
        avg_price: price.map(Decimal::from),
        last_production_date: None,
        nearest_expire_date: None,
        transactions_count: 1,
    }
}

fn known(code: &str, name: &str) -> KnownStore {
    KnownStore {
        code: code.to_string(),
        name: name.to_string(),
        guid: Uuid::from_u128(code.parse::<u128>().unwrap_or(0)),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Every known store appears even without materials
    #[test]
    fn test_all_scope_lists_every_known_store() {
        let report = aggregate_by_store(
            &[known("101", "Aux")],
            vec![row("102", "A", 5, Some(2))],
            StoreScope::All,
            QuantityThreshold::Positive,
        );

        let codes: Vec<StoreCode> = report.stores.iter().map(|s| s.code).collect();
        assert_eq!(codes, StoreCode::ALL.to_vec());
        assert_eq!(report.total_stores, 3);
        assert_eq!(report.total_materials, 1);

        // missing from the database: built-in name, no guid
        assert_eq!(report.stores[0].name, StoreCode::FinishedGoods.default_name());
        assert_eq!(report.stores[0].guid, None);
        assert_eq!(report.stores[0].materials_count, 0);
        // known but empty
        assert_eq!(report.stores[1].name, "Aux");
        assert!(report.stores[1].guid.is_some());
        // filled from the rows
        assert_eq!(report.stores[2].materials_count, 1);
        assert_eq!(report.stores[2].name, "Store 102");
    }

    /// A single scope yields exactly that store
    #[test]
    fn test_single_scope_drops_other_stores() {
        let report = aggregate_by_store(
            &[],
            vec![row("12", "A", 5, None), row("102", "B", 7, None)],
            StoreScope::Single(StoreCode::FinishedGoods),
            QuantityThreshold::Positive,
        );

        assert_eq!(report.total_stores, 1);
        assert_eq!(report.stores[0].code, StoreCode::FinishedGoods);
        assert_eq!(report.stores[0].materials[0].code, "A");
    }

    /// Rows at or below zero never appear by default
    #[test]
    fn test_positive_threshold() {
        let report = aggregate_by_store(
            &[],
            vec![
                row("12", "A", 0, None),
                row("12", "B", -3, None),
                row("12", "C", 1, None),
            ],
            StoreScope::Single(StoreCode::FinishedGoods),
            QuantityThreshold::Positive,
        );

        let codes: Vec<&str> = report.stores[0]
            .materials
            .iter()
            .map(|m| m.code.as_str())
            .collect();
        assert_eq!(codes, vec!["C"]);
    }

    /// minQty keeps quantities at or above the bound
    #[test]
    fn test_at_least_threshold() {
        let report = aggregate_by_store(
            &[],
            vec![row("102", "A", 49, None), row("102", "B", 50, None), row("102", "C", 80, None)],
            StoreScope::Single(StoreCode::ActiveMaterials),
            QuantityThreshold::AtLeast(Decimal::from(50)),
        );

        assert_eq!(report.stores[0].materials_count, 2);
        assert_eq!(report.stores[0].total_quantity, Decimal::from(130));
    }

    /// Value is quantity times average price, zero without a price
    #[test]
    fn test_total_value() {
        let report = aggregate_by_store(
            &[],
            vec![row("101", "A", 4, Some(3)), row("101", "B", 10, None)],
            StoreScope::Single(StoreCode::AuxiliaryMaterials),
            QuantityThreshold::Positive,
        );

        let store = &report.stores[0];
        assert_eq!(store.materials[0].total_value, Decimal::from(12));
        assert_eq!(store.materials[1].total_value, Decimal::ZERO);
        assert_eq!(store.total_value, Decimal::from(12));
    }

    /// Rows for codes outside the known set are ignored
    #[test]
    fn test_unknown_store_rows_are_ignored() {
        let report = aggregate_by_store(
            &[],
            vec![row("999", "A", 5, None)],
            StoreScope::All,
            QuantityThreshold::Positive,
        );
        assert_eq!(report.total_materials, 0);
    }

    /// Store entries serialize under their numeric code
    #[test]
    fn test_report_json_shape() {
        let report = aggregate_by_store(
            &[],
            vec![row("12", "A", 2, Some(5))],
            StoreScope::Single(StoreCode::FinishedGoods),
            QuantityThreshold::Positive,
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["total_stores"], 1);
        assert_eq!(json["stores"][0]["code"], "12");
        assert_eq!(json["stores"][0]["materials"][0]["quantity"], 2.0);
        assert_eq!(json["stores"][0]["materials"][0]["total_value"], 10.0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn row_strategy() -> impl Strategy<Value = StockRow> {
        (
            prop::sample::select(vec!["12", "101", "102", "7"]),
            "[A-Z][0-9]{1,3}",
            -100i64..1000,
            prop::option::of(0i64..500),
        )
            .prop_map(|(store, material, qty, price)| row(store, &material, qty, price))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every listed material meets the threshold
        #[test]
        fn prop_threshold_is_respected(
            rows in prop::collection::vec(row_strategy(), 0..40),
            min in prop::option::of(1i64..200)
        ) {
            let threshold = min
                .map(|m| QuantityThreshold::AtLeast(Decimal::from(m)))
                .unwrap_or(QuantityThreshold::Positive);
            let report = aggregate_by_store(&[], rows, StoreScope::All, threshold);

            for store in &report.stores {
                for material in &store.materials {
                    prop_assert!(threshold.admits(material.quantity));
                    prop_assert!(material.quantity > Decimal::ZERO);
                }
            }
        }

        /// Store counts and totals are reductions over their materials
        #[test]
        fn prop_store_totals_are_consistent(
            rows in prop::collection::vec(row_strategy(), 0..40)
        ) {
            let report = aggregate_by_store(&[], rows, StoreScope::All, QuantityThreshold::Positive);

            prop_assert_eq!(report.total_stores, 3);
            let mut total = 0;
            for store in &report.stores {
                prop_assert_eq!(store.materials_count, store.materials.len());
                let qty: Decimal = store.materials.iter().map(|m| m.quantity).sum();
                prop_assert_eq!(store.total_quantity, qty);
                total += store.materials_count;
            }
            prop_assert_eq!(report.total_materials, total);
        }

        /// Aggregating the same rows twice yields the same report
        #[test]
        fn prop_aggregation_is_idempotent(
            rows in prop::collection::vec(row_strategy(), 0..40)
        ) {
            let first = aggregate_by_store(&[], rows.clone(), StoreScope::All, QuantityThreshold::Positive);
            let second = aggregate_by_store(&[], rows, StoreScope::All, QuantityThreshold::Positive);
            prop_assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }
}
