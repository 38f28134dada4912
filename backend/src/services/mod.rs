//! Business logic services for the Inventory Reports API

pub mod aggregate;
pub mod catalog;
pub mod introspection;
pub mod query;
pub mod spreadsheet;
pub mod stock;
pub mod stores;

pub use catalog::MaterialCatalogService;
pub use introspection::TableService;
pub use spreadsheet::ReportIngestionService;
pub use stock::StockReportService;
pub use stores::StoreService;
