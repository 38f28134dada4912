//! Read-only summaries over the store entity

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{Store, StoreCode};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Store summary service
#[derive(Clone)]
pub struct StoreService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct StoreRow {
    guid: Uuid,
    code: String,
    name: String,
    is_active: bool,
    address: Option<String>,
    keeper: Option<String>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            guid: row.guid,
            code: row.code,
            name: row.name,
            is_active: row.is_active,
            address: row.address,
            keeper: row.keeper,
        }
    }
}

/// Stock totals for one store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSummary {
    pub code: StoreCode,
    pub name: String,
    pub guid: Option<Uuid>,
    /// Materials with positive stock
    pub materials_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub transactions_count: i64,
}

impl StoreSummary {
    fn empty(code: StoreCode) -> Self {
        Self {
            code,
            name: code.default_name().to_string(),
            guid: None,
            materials_count: 0,
            total_quantity: Decimal::ZERO,
            total_value: Decimal::ZERO,
            transactions_count: 0,
        }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    code: String,
    name: String,
    guid: Uuid,
    materials_count: i64,
    total_quantity: Decimal,
    total_value: Decimal,
    transactions_count: i64,
}

/// Summary plus ledger statistics for one store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    #[serde(flatten)]
    pub summary: StoreSummary,
    pub is_active: Option<bool>,
    pub groups_count: i64,
    pub first_movement_date: Option<NaiveDate>,
    pub last_movement_date: Option<NaiveDate>,
    pub nearest_expire_date: Option<NaiveDate>,
    /// Materials in stock whose nearest expiry is already past
    pub expired_materials_count: i64,
}

#[derive(Debug, FromRow)]
struct StatsRow {
    code: String,
    name: String,
    guid: Uuid,
    is_active: bool,
    materials_count: i64,
    total_quantity: Decimal,
    total_value: Decimal,
    transactions_count: i64,
    groups_count: i64,
    first_movement_date: Option<NaiveDate>,
    last_movement_date: Option<NaiveDate>,
    nearest_expire_date: Option<NaiveDate>,
    expired_materials_count: i64,
}

/// Totals across all known stores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTotals {
    pub stores_count: usize,
    pub materials_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub transactions_count: i64,
    pub expired_materials_count: i64,
}

impl StatsTotals {
    pub fn from_stats(stats: &[StoreStats]) -> Self {
        Self {
            stores_count: stats.len(),
            materials_count: stats.iter().map(|s| s.summary.materials_count).sum(),
            total_quantity: stats.iter().map(|s| s.summary.total_quantity).sum(),
            total_value: stats.iter().map(|s| s.summary.total_value).sum(),
            transactions_count: stats.iter().map(|s| s.summary.transactions_count).sum(),
            expired_materials_count: stats.iter().map(|s| s.expired_materials_count).sum(),
        }
    }
}

/// Fill in known stores that have no row, in code order
fn complete<T>(codes: &[StoreCode], mut found: Vec<(StoreCode, T)>, empty: impl Fn(StoreCode) -> T) -> Vec<T> {
    codes
        .iter()
        .map(|code| match found.iter().position(|(c, _)| c == code) {
            Some(idx) => found.swap_remove(idx).1,
            None => empty(*code),
        })
        .collect()
}

const PER_MATERIAL_STOCK: &str = r#"
    SELECT mv.store_guid, mv.material_guid, m.group_guid,
           SUM(mv.qty) AS qty,
           AVG(mv.price) AS avg_price,
           COUNT(*) AS tx_count,
           MIN(mv.production_date) AS first_date,
           MAX(mv.production_date) AS last_date,
           MIN(mv.expire_date) AS nearest_expire
    FROM store_movements mv
    JOIN materials m ON m.guid = mv.material_guid
    GROUP BY mv.store_guid, mv.material_guid, m.group_guid
"#;

impl StoreService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Every store row, ordered by code
    pub async fn list_stores(&self) -> AppResult<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT guid, code, name, is_active, address, keeper
            FROM stores
            ORDER BY LENGTH(code), code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn summary_rows(&self, codes: &[StoreCode]) -> AppResult<Vec<(StoreCode, StoreSummary)>> {
        let query = format!(
            r#"
            SELECT s.code, s.name, s.guid,
                   COUNT(t.material_guid) FILTER (WHERE t.qty > 0) AS materials_count,
                   COALESCE(SUM(t.qty) FILTER (WHERE t.qty > 0), 0) AS total_quantity,
                   COALESCE(SUM(t.qty * t.avg_price) FILTER (WHERE t.qty > 0), 0) AS total_value,
                   COALESCE(SUM(t.tx_count), 0)::BIGINT AS transactions_count
            FROM stores s
            LEFT JOIN ({}) t ON t.store_guid = s.guid
            WHERE s.code = ANY($1)
            GROUP BY s.code, s.name, s.guid
            "#,
            PER_MATERIAL_STOCK
        );

        let codes: Vec<String> = codes.iter().map(|c| c.as_str().to_string()).collect();
        let rows = sqlx::query_as::<_, SummaryRow>(&query)
            .bind(codes)
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let code = row.code.parse::<StoreCode>().ok()?;
                Some((
                    code,
                    StoreSummary {
                        code,
                        name: row.name,
                        guid: Some(row.guid),
                        materials_count: row.materials_count,
                        total_quantity: row.total_quantity,
                        total_value: row.total_value,
                        transactions_count: row.transactions_count,
                    },
                ))
            })
            .collect())
    }

    /// Stock totals for every known store
    pub async fn stores_summary(&self) -> AppResult<Vec<StoreSummary>> {
        let found = self.summary_rows(&StoreCode::ALL).await?;
        Ok(complete(&StoreCode::ALL, found, StoreSummary::empty))
    }

    /// Stock totals for one store; the store row must exist
    pub async fn store_summary(&self, code: StoreCode) -> AppResult<StoreSummary> {
        self.summary_rows(&[code])
            .await?
            .into_iter()
            .next()
            .map(|(_, summary)| summary)
            .ok_or_else(|| AppError::NotFound(format!("Store {}", code)))
    }

    /// Summary and ledger statistics for every known store
    pub async fn detailed_stats(&self, today: NaiveDate) -> AppResult<Vec<StoreStats>> {
        let query = format!(
            r#"
            SELECT s.code, s.name, s.guid, s.is_active,
                   COUNT(t.material_guid) FILTER (WHERE t.qty > 0) AS materials_count,
                   COALESCE(SUM(t.qty) FILTER (WHERE t.qty > 0), 0) AS total_quantity,
                   COALESCE(SUM(t.qty * t.avg_price) FILTER (WHERE t.qty > 0), 0) AS total_value,
                   COALESCE(SUM(t.tx_count), 0)::BIGINT AS transactions_count,
                   COUNT(DISTINCT t.group_guid) FILTER (WHERE t.qty > 0) AS groups_count,
                   MIN(t.first_date) AS first_movement_date,
                   MAX(t.last_date) AS last_movement_date,
                   MIN(t.nearest_expire) FILTER (WHERE t.qty > 0) AS nearest_expire_date,
                   COUNT(t.material_guid) FILTER (WHERE t.qty > 0 AND t.nearest_expire < $2)
                       AS expired_materials_count
            FROM stores s
            LEFT JOIN ({}) t ON t.store_guid = s.guid
            WHERE s.code = ANY($1)
            GROUP BY s.code, s.name, s.guid, s.is_active
            "#,
            PER_MATERIAL_STOCK
        );

        let rows = sqlx::query_as::<_, StatsRow>(&query)
            .bind(StoreCode::all_codes())
            .bind(today)
            .fetch_all(&self.db)
            .await?;

        let found = rows
            .into_iter()
            .filter_map(|row| {
                let code = row.code.parse::<StoreCode>().ok()?;
                Some((
                    code,
                    StoreStats {
                        summary: StoreSummary {
                            code,
                            name: row.name,
                            guid: Some(row.guid),
                            materials_count: row.materials_count,
                            total_quantity: row.total_quantity,
                            total_value: row.total_value,
                            transactions_count: row.transactions_count,
                        },
                        is_active: Some(row.is_active),
                        groups_count: row.groups_count,
                        first_movement_date: row.first_movement_date,
                        last_movement_date: row.last_movement_date,
                        nearest_expire_date: row.nearest_expire_date,
                        expired_materials_count: row.expired_materials_count,
                    },
                ))
            })
            .collect();

        Ok(complete(&StoreCode::ALL, found, |code| StoreStats {
            summary: StoreSummary::empty(code),
            is_active: None,
            groups_count: 0,
            first_movement_date: None,
            last_movement_date: None,
            nearest_expire_date: None,
            expired_materials_count: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_fills_missing_stores_in_order() {
        let found = vec![(StoreCode::ActiveMaterials, 102), (StoreCode::FinishedGoods, 12)];
        let filled = complete(&StoreCode::ALL, found, |_| 0);
        assert_eq!(filled, vec![12, 0, 102]);
    }

    #[test]
    fn test_totals_sum_store_stats() {
        let mut first = StoreSummary::empty(StoreCode::FinishedGoods);
        first.materials_count = 3;
        first.total_quantity = Decimal::from(10);
        let mut second = StoreSummary::empty(StoreCode::ActiveMaterials);
        second.materials_count = 2;
        second.total_value = Decimal::from(7);

        let stats: Vec<StoreStats> = [first, second]
            .into_iter()
            .map(|summary| StoreStats {
                summary,
                is_active: Some(true),
                groups_count: 1,
                first_movement_date: None,
                last_movement_date: None,
                nearest_expire_date: None,
                expired_materials_count: 1,
            })
            .collect();

        let totals = StatsTotals::from_stats(&stats);
        assert_eq!(totals.stores_count, 2);
        assert_eq!(totals.materials_count, 5);
        assert_eq!(totals.total_quantity, Decimal::from(10));
        assert_eq!(totals.total_value, Decimal::from(7));
        assert_eq!(totals.expired_materials_count, 2);
    }
}
