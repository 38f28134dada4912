//! Connection provider
//!
//! Owns the PostgreSQL pool for the process. The pool is created on first
//! `acquire()` and reused afterwards; `release()` closes it and forgets it.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::error::AppResult;

/// Lazily connected, shareable handle to the database pool
#[derive(Clone)]
pub struct Database {
    config: Arc<DatabaseConfig>,
    pool: Arc<Mutex<Option<PgPool>>>,
}

impl Database {
    /// Create a provider; no connection is made until `acquire()`
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config: Arc::new(config),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Return the shared pool, connecting on first use
    pub async fn acquire(&self) -> AppResult<PgPool> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .acquire_timeout(Duration::from_secs(self.config.acquire_timeout_secs))
            .connect(&self.config.url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database connection failed");
                e
            })?;
        tracing::info!("Database connection established");

        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Close the pool if one is open; safe to call repeatedly
    pub async fn release(&self) {
        let pool = self.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("Database connection closed");
        }
    }

    /// Whether a pool is currently held
    pub async fn is_connected(&self) -> bool {
        self.pool.lock().await.is_some()
    }
}
