//! SQLite storage implementation for the transaction ledger.

mod model;
mod repository;

#[cfg(test)]
mod repository_tests;

pub use model::{NewTransactionDB, TransactionDB};
pub use repository::LedgerRepository;
