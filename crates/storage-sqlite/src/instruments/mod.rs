//! SQLite storage implementation for instrument reference data.

mod model;
mod repository;

pub use model::InstrumentDB;
pub use repository::InstrumentRepository;

pub(crate) use repository::{ensure_instrument, upsert_reference};
