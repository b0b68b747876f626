//! SQLite storage implementation for Moexfolio.
//!
//! This crate implements the repository traits defined in `moexfolio-core`
//! with Diesel over SQLite and contains:
//! - Database connection pooling and the single-writer actor
//! - Embedded Diesel migrations
//! - Repositories for the ledger, positions, instruments and price history
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```
//!
//! Every ledger write and the position recalculations it triggers run as one
//! job on the writer actor, inside one immediate transaction.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod instruments;
pub mod ledger;
pub mod portfolio;
pub mod price_history;

pub use db::{
    create_pool, get_connection, get_db_path, init, open, run_migrations, spawn_writer,
    DbConnection, DbPool, WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use instruments::InstrumentRepository;
pub use ledger::LedgerRepository;
pub use portfolio::positions::PositionRepository;
pub use price_history::PriceHistoryRepository;

pub use moexfolio_core::errors::{DatabaseError, Error, Result};
