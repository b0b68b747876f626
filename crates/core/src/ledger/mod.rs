//! Ledger module - the user-editable record of buys and sells.

mod ledger_errors;
mod ledger_model;
mod ledger_service;
mod ledger_traits;

#[cfg(test)]
mod ledger_model_tests;


pub use ledger_errors::LedgerError;
pub use ledger_model::{
    InstrumentKey, LedgerWriteResult, NewTransaction, RecalculationOutcome, Transaction,
    TransactionFilter, TransactionSide, TransactionUpdate,
};
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};

pub use ledger_model::normalize_ticker;
