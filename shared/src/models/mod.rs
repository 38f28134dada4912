//! Domain models for the Inventory Reports service

mod spreadsheet;
mod store;

pub use spreadsheet::*;
pub use store::*;
