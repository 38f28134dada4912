//! HTTP handlers for the Inventory Reports API

pub mod catalog;
pub mod health;
pub mod reports;
pub mod stock;
pub mod stores;
pub mod tables;

pub use catalog::list_materials;
pub use health::{health_check, root, route_not_found};
pub use reports::{spreadsheet_materials_by_stores, upload_reports};
pub use stock::{materials_by_store, materials_by_stores};
pub use stores::{store_summary, stores_detailed_stats, stores_list, stores_summary};
pub use tables::{check_connection, list_tables, table_info, table_rows};
