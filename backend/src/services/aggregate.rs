//! Reshapes flat (store, material) rows into the per-store response
//!
//! Both live listing endpoints go through [`aggregate_by_store`]; only the
//! scope differs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{MaterialSummary, StoreCode, StoreMaterials, StoresReport};
use sqlx::FromRow;
use uuid::Uuid;

use super::query::QuantityThreshold;

/// One aggregated row of the stock query
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StockRow {
    pub store_code: String,
    pub store_name: String,
    pub store_guid: Uuid,
    pub material_guid: Uuid,
    pub material_code: String,
    pub material_name: String,
    pub latin_name: Option<String>,
    pub unity: Option<String>,
    pub group_guid: Option<Uuid>,
    pub group_name: Option<String>,
    pub store_qty: Decimal,
    pub avg_price: Option<Decimal>,
    pub last_production_date: Option<NaiveDate>,
    pub nearest_expire_date: Option<NaiveDate>,
    pub transactions_count: i64,
}

impl StockRow {
    fn into_summary(self) -> MaterialSummary {
        let total_value = self
            .avg_price
            .map(|price| price * self.store_qty)
            .unwrap_or(Decimal::ZERO);

        MaterialSummary {
            guid: self.material_guid,
            code: self.material_code,
            name: self.material_name,
            latin_name: self.latin_name,
            unity: self.unity,
            group_guid: self.group_guid,
            group_name: self.group_name,
            quantity: self.store_qty,
            avg_price: self.avg_price,
            total_value,
            last_production_date: self.last_production_date,
            nearest_expire_date: self.nearest_expire_date,
            transactions_count: self.transactions_count,
        }
    }
}

/// Descriptive fields of a known store, as found in the database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct KnownStore {
    pub code: String,
    pub name: String,
    pub guid: Uuid,
}

/// Which stores appear in the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    /// Every known store, including those without matching materials
    All,
    /// Only the given store
    Single(StoreCode),
}

impl StoreScope {
    pub fn codes(&self) -> Vec<StoreCode> {
        match self {
            StoreScope::All => StoreCode::ALL.to_vec(),
            StoreScope::Single(code) => vec![*code],
        }
    }
}

struct StoreEntry {
    name: String,
    guid: Option<Uuid>,
    materials: Vec<MaterialSummary>,
}

/// Group rows by store, keeping row order within each store
///
/// Stores in scope are always present, in ascending code order. Rows for
/// stores outside the scope, or below the quantity threshold, are dropped.
pub fn aggregate_by_store(
    known: &[KnownStore],
    rows: Vec<StockRow>,
    scope: StoreScope,
    threshold: QuantityThreshold,
) -> StoresReport {
    let mut stores: BTreeMap<StoreCode, StoreEntry> = scope
        .codes()
        .into_iter()
        .map(|code| {
            let found = known.iter().find(|k| k.code == code.as_str());
            let entry = StoreEntry {
                name: found
                    .map(|k| k.name.clone())
                    .unwrap_or_else(|| code.default_name().to_string()),
                guid: found.map(|k| k.guid),
                materials: Vec::new(),
            };
            (code, entry)
        })
        .collect();

    for row in rows {
        if !threshold.admits(row.store_qty) {
            continue;
        }
        let Ok(code) = row.store_code.parse::<StoreCode>() else {
            continue;
        };
        let Some(entry) = stores.get_mut(&code) else {
            continue;
        };
        entry.name.clone_from(&row.store_name);
        entry.guid = Some(row.store_guid);
        entry.materials.push(row.into_summary());
    }

    StoresReport::new(
        stores
            .into_iter()
            .map(|(code, entry)| StoreMaterials::new(code, entry.name, entry.guid, entry.materials))
            .collect(),
    )
}
