//! Database catalog introspection and generic table browsing
//!
//! Table names arrive from the URL and end up in the `FROM` position of a
//! query, where they cannot be bound. Row and count queries therefore take a
//! [`VerifiedTable`], which only [`TableService::verify_table`] can produce
//! after finding the name in the live catalog.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

const SYSTEM_SCHEMAS: [&str; 2] = ["pg_catalog", "information_schema"];

/// Table browsing service
#[derive(Clone)]
pub struct TableService {
    db: PgPool,
}

/// Result of a connectivity check
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConnectionInfo {
    pub database: String,
    pub server: String,
    pub server_time: DateTime<Utc>,
}

/// A user table or view
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: String,
    pub columns: i64,
}

impl TableInfo {
    /// Excludes views
    pub fn is_base_table(&self) -> bool {
        self.table_type == "BASE TABLE"
    }
}

/// Column metadata from `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<i32>,
    pub is_nullable: bool,
    pub default_value: Option<String>,
}

/// A table name confirmed to exist in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedTable {
    schema: String,
    name: String,
    #[serde(rename = "type")]
    table_type: String,
}

impl VerifiedTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully quoted `"schema"."name"` identifier
    fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

#[derive(FromRow)]
struct CatalogEntry {
    schema: String,
    name: String,
    table_type: String,
}

fn system_schemas() -> Vec<String> {
    SYSTEM_SCHEMAS.iter().map(|s| s.to_string()).collect()
}

/// Quote an identifier for interpolation, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl TableService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Database name, server address and server time
    pub async fn check_connection(&self) -> AppResult<ConnectionInfo> {
        let info = sqlx::query_as::<_, ConnectionInfo>(
            r#"
            SELECT current_database()::TEXT AS database,
                   COALESCE(host(inet_server_addr()), 'local socket') AS server,
                   NOW() AS server_time
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(info)
    }

    /// User tables and views with their column counts
    pub async fn list_tables(&self) -> AppResult<Vec<TableInfo>> {
        let tables = sqlx::query_as::<_, TableInfo>(
            r#"
            SELECT t.table_schema::TEXT AS schema,
                   t.table_name::TEXT AS name,
                   t.table_type::TEXT AS table_type,
                   COUNT(c.column_name) AS columns
            FROM information_schema.tables t
            LEFT JOIN information_schema.columns c
                ON c.table_schema = t.table_schema AND c.table_name = t.table_name
            WHERE t.table_schema <> ALL($1)
            GROUP BY t.table_schema, t.table_name, t.table_type
            ORDER BY t.table_schema, t.table_name
            "#,
        )
        .bind(system_schemas())
        .fetch_all(&self.db)
        .await?;

        Ok(tables)
    }

    /// Look the name up in the catalog, preferring the `public` schema
    pub async fn verify_table(&self, name: &str) -> AppResult<VerifiedTable> {
        let entry = sqlx::query_as::<_, CatalogEntry>(
            r#"
            SELECT table_schema::TEXT AS schema,
                   table_name::TEXT AS name,
                   table_type::TEXT AS table_type
            FROM information_schema.tables
            WHERE table_name = $1
              AND table_schema <> ALL($2)
            ORDER BY (table_schema = 'public') DESC, table_schema
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(system_schemas())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::TableNotFound(name.to_string()))?;

        Ok(VerifiedTable {
            schema: entry.schema,
            name: entry.name,
            table_type: entry.table_type,
        })
    }

    pub async fn columns(&self, table: &VerifiedTable) -> AppResult<Vec<ColumnInfo>> {
        let columns = sqlx::query_as::<_, ColumnInfo>(
            r#"
            SELECT column_name::TEXT AS name,
                   data_type::TEXT AS data_type,
                   character_maximum_length::INT4 AS max_length,
                   (is_nullable = 'YES') AS is_nullable,
                   column_default::TEXT AS default_value
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_all(&self.db)
        .await?;

        Ok(columns)
    }

    pub async fn primary_keys(&self, table: &VerifiedTable) -> AppResult<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            r#"
            SELECT kcu.column_name::TEXT
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON kcu.constraint_name = tc.constraint_name
               AND kcu.table_schema = tc.table_schema
               AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema = $1
              AND tc.table_name = $2
            ORDER BY kcu.ordinal_position
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_all(&self.db)
        .await?;

        Ok(keys)
    }

    /// Up to `limit` rows, each as a JSON object
    pub async fn rows(&self, table: &VerifiedTable, limit: u32) -> AppResult<Vec<serde_json::Value>> {
        let sql = format!(
            "SELECT row_to_json(t) FROM (SELECT * FROM {} LIMIT $1) t",
            table.qualified()
        );
        let rows = sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    pub async fn count(&self, table: &VerifiedTable) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.qualified());
        let total = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.db).await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("stores"), "\"stores\"");
        assert_eq!(quote_ident("a\"; DROP TABLE x; --"), "\"a\"\"; DROP TABLE x; --\"");
    }

    #[test]
    fn test_qualified_name() {
        let table = VerifiedTable {
            schema: "public".into(),
            name: "Materials".into(),
            table_type: "BASE TABLE".into(),
        };
        assert_eq!(table.qualified(), "\"public\".\"Materials\"");
    }

    #[test]
    fn test_views_are_not_base_tables() {
        let table = |table_type: &str| TableInfo {
            schema: "public".into(),
            name: "stock".into(),
            table_type: table_type.into(),
            columns: 3,
        };
        assert!(table("BASE TABLE").is_base_table());
        assert!(!table("VIEW").is_base_table());
    }
}
