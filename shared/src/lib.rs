//! Shared types and models for the Inventory Reports service
//!
//! Storage-independent types used by the backend: store codes, per-store
//! material summaries, spreadsheet report shapes, periods, pagination and
//! request parameter validation.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
