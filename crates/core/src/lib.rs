//! Moexfolio Core - Domain entities, services, and traits.
//!
//! This crate contains the ledger, position and valuation logic for a
//! MOEX-traded portfolio. It is database-agnostic and defines traits that
//! are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod instruments;
pub mod ledger;
pub mod portfolio;
pub mod price_history;
pub mod quotes;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
