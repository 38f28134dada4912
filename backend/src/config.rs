//! Configuration management for the Inventory Reports service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with INVENTORY_ prefix, nested keys
//!    joined by `__` (e.g. `INVENTORY_DATABASE__URL`)

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Spreadsheet reports and listing defaults
    pub reports: ReportsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    /// Directory holding canonical warehouse spreadsheets and temp uploads
    pub upload_dir: String,

    /// Maximum number of files accepted by one upload request
    pub max_files: usize,

    /// Row bound for listings with neither an explicit limit nor a date filter
    pub default_limit: u32,

    /// Treat `%` and `_` in search text literally
    pub escape_search_wildcards: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("INVENTORY_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Self::load_with(&environment, Self::env_source())
    }

    /// Environment variable source: `INVENTORY_SECTION__KEY`
    fn env_source() -> Environment {
        Environment::with_prefix("INVENTORY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(environment: &str, env: Environment) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("reports.upload_dir", "uploads/excel-reports")?
            .set_default("reports.max_files", 10)?
            .set_default("reports.default_limit", 1000)?
            .set_default("reports.escape_search_wildcards", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (INVENTORY_ prefix)
            .add_source(env)
            .build()?;

        config.try_deserialize()
    }

    /// Production mode hides error details from API responses
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            reports: ReportsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/inventory".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            upload_dir: "uploads/excel-reports".to_string(),
            max_files: 10,
            default_limit: 1000,
            escape_search_wildcards: false,
        }
    }
}
