//! Uploaded spreadsheet report models
//!
//! Warehouse reports arrive as Excel workbooks. Each is classified to one of
//! the known stores by Arabic text in the header area, stored in that store's
//! canonical slot, and later read back into the same per-store shape as the
//! live stock listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StoreCode;

/// Rows above the first material row in a warehouse report
pub const HEADER_ROWS: usize = 3;

/// Column header text that marks a repeated header row
pub const NAME_HEADER: &str = "اسم المادة";

/// Unit reported for every spreadsheet material
pub const DEFAULT_UNITY: &str = "وحدة";

/// Cell inspected for the warehouse description: (row, column), zero-based
pub const CLASSIFICATION_CELL: (usize, usize) = (1, 2);

/// Vocabulary matched against the report header and the original file name.
/// Checked in order; the first store with a matching fragment wins.
const WAREHOUSE_VOCABULARY: [(StoreCode, [&str; 2]); 3] = [
    (StoreCode::FinishedGoods, ["الجاهزة", "جاهز"]),
    (StoreCode::ActiveMaterials, ["الفعالة", "فعال"]),
    (StoreCode::AuxiliaryMaterials, ["المساعدة", "مساعد"]),
];

/// Find the warehouse a piece of text refers to
pub fn classify_warehouse_text(text: &str) -> Option<StoreCode> {
    WAREHOUSE_VOCABULARY
        .iter()
        .find(|(_, fragments)| fragments.iter().any(|f| text.contains(f)))
        .map(|(code, _)| *code)
}

/// A material row read from a warehouse report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetMaterial {
    pub code: String,
    pub name: String,
    pub quantity: f64,
    pub unity: String,
}

/// One canonical slot read back as a store listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetStore {
    pub code: StoreCode,
    pub name: String,
    /// Always null: spreadsheet stores have no database identity
    pub guid: Option<Uuid>,
    pub materials_count: usize,
    pub total_quantity: f64,
    pub materials: Vec<SpreadsheetMaterial>,
    pub source_file: String,
}

impl SpreadsheetStore {
    pub fn new(code: StoreCode, materials: Vec<SpreadsheetMaterial>) -> Self {
        Self {
            code,
            name: code.default_name().to_string(),
            guid: None,
            materials_count: materials.len(),
            total_quantity: materials.iter().map(|m| m.quantity).sum(),
            materials,
            source_file: code.canonical_file_name(),
        }
    }
}

/// All canonical slots currently present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetReport {
    pub total_stores: usize,
    pub total_materials: usize,
    pub stores: Vec<SpreadsheetStore>,
}

impl SpreadsheetReport {
    pub fn new(stores: Vec<SpreadsheetStore>) -> Self {
        Self {
            total_stores: stores.len(),
            total_materials: stores.iter().map(|s| s.materials_count).sum(),
            stores,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Descriptor of a stored upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReportFile {
    pub original_name: String,
    pub saved_name: String,
    pub path: String,
    pub size: u64,
    pub upload_date: DateTime<Utc>,
}

/// Lenient numeric prefix parse: "12.5 kg" is 12.5, anything unparsable is 0
pub fn parse_quantity(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let prefix: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        .collect();

    (1..=prefix.len())
        .rev()
        .filter_map(|len| prefix.get(..len))
        .find_map(|candidate| candidate.parse::<f64>().ok())
        .filter(|q| q.is_finite())
        .unwrap_or(0.0)
}

/// Extract materials from a worksheet grid (rows of cell texts)
///
/// Skips the header rows, rows with fewer than three cells, blank names and
/// repeated header rows.
pub fn materials_from_rows(rows: &[Vec<String>]) -> Vec<SpreadsheetMaterial> {
    rows.iter()
        .skip(HEADER_ROWS)
        .filter(|row| row.len() >= 3)
        .filter_map(|row| {
            let name = row[1].trim();
            if name.is_empty() || name == NAME_HEADER {
                return None;
            }
            Some(SpreadsheetMaterial {
                code: row[0].clone(),
                name: name.to_string(),
                quantity: parse_quantity(&row[2]),
                unity: DEFAULT_UNITY.to_string(),
            })
        })
        .collect()
}
