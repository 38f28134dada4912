//! Store (warehouse) models and per-store stock summaries

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// The fixed set of warehouses served by this deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreCode {
    /// Finished goods warehouse
    #[serde(rename = "12")]
    FinishedGoods,
    /// Auxiliary raw materials warehouse
    #[serde(rename = "101")]
    AuxiliaryMaterials,
    /// Active raw materials warehouse
    #[serde(rename = "102")]
    ActiveMaterials,
}

impl StoreCode {
    /// All known codes in ascending code order
    pub const ALL: [StoreCode; 3] = [
        StoreCode::FinishedGoods,
        StoreCode::AuxiliaryMaterials,
        StoreCode::ActiveMaterials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreCode::FinishedGoods => "12",
            StoreCode::AuxiliaryMaterials => "101",
            StoreCode::ActiveMaterials => "102",
        }
    }

    /// Display name used when the store row is unavailable
    pub fn default_name(&self) -> &'static str {
        match self {
            StoreCode::FinishedGoods => "مستودع المواد الجاهزة",
            StoreCode::AuxiliaryMaterials => "مستودع المواد الاولية المساعدة",
            StoreCode::ActiveMaterials => "مستودع المواد الاولية الفعالة",
        }
    }

    /// File name of the canonical spreadsheet slot for this store
    pub fn canonical_file_name(&self) -> String {
        format!("warehouse_{}.xlsx", self.as_str())
    }

    /// Codes as strings, for binding to `= ANY($n)`
    pub fn all_codes() -> Vec<String> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl FromStr for StoreCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "12" => Ok(StoreCode::FinishedGoods),
            "101" => Ok(StoreCode::AuxiliaryMaterials),
            "102" => Ok(StoreCode::ActiveMaterials),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for StoreCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A warehouse as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub guid: Uuid,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub address: Option<String>,
    pub keeper: Option<String>,
}

/// Aggregated stock of one material in one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub guid: Uuid,
    pub code: String,
    pub name: String,
    pub latin_name: Option<String>,
    pub unity: Option<String>,
    pub group_guid: Option<Uuid>,
    pub group_name: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub avg_price: Option<Decimal>,
    /// quantity x avg_price, zero when no price is known
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub last_production_date: Option<NaiveDate>,
    pub nearest_expire_date: Option<NaiveDate>,
    pub transactions_count: i64,
}

/// One store with the materials it currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMaterials {
    pub code: StoreCode,
    pub name: String,
    pub guid: Option<Uuid>,
    pub materials_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub materials: Vec<MaterialSummary>,
}

impl StoreMaterials {
    pub fn new(code: StoreCode, name: String, guid: Option<Uuid>, materials: Vec<MaterialSummary>) -> Self {
        let total_quantity = materials.iter().map(|m| m.quantity).sum();
        let total_value = materials.iter().map(|m| m.total_value).sum();

        Self {
            code,
            name,
            guid,
            materials_count: materials.len(),
            total_quantity,
            total_value,
            materials,
        }
    }
}

/// Per-store listing across one or more stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoresReport {
    pub total_stores: usize,
    pub total_materials: usize,
    pub stores: Vec<StoreMaterials>,
}

impl StoresReport {
    pub fn new(stores: Vec<StoreMaterials>) -> Self {
        Self {
            total_stores: stores.len(),
            total_materials: stores.iter().map(|s| s.materials_count).sum(),
            stores,
        }
    }
}
