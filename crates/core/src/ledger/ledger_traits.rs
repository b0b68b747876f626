use async_trait::async_trait;

use super::ledger_model::{
    InstrumentKey, LedgerWriteResult, NewTransaction, RecalculationOutcome, Transaction,
    TransactionFilter, TransactionUpdate,
};
use crate::errors::Result;
use crate::instruments::InstrumentReference;
use crate::portfolio::positions::Position;

/// Storage contract for the ledger.
///
/// Every mutation re-derives the affected positions in the same storage
/// transaction as the ledger write; if a recalculation fails the write is
/// rolled back with it. `references` carry bond face data fetched before the
/// transaction opened and are persisted on the instrument rows.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: i64) -> Result<Transaction>;

    /// Newest first.
    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Full history of one position, ordered by `(trade_date, id)`.
    fn get_transactions_for_instrument(&self, key: &InstrumentKey) -> Result<Vec<Transaction>>;

    /// Every key that has ledger entries or a stored position.
    fn list_instrument_keys(&self) -> Result<Vec<InstrumentKey>>;

    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
        references: Vec<InstrumentReference>,
    ) -> Result<LedgerWriteResult>;

    /// Replaces the stored row with `updated`. Recalculates the old key and,
    /// when account or ticker changed, the new key as well.
    async fn update_transaction(
        &self,
        updated: Transaction,
        references: Vec<InstrumentReference>,
    ) -> Result<LedgerWriteResult>;

    async fn delete_transaction(&self, transaction_id: i64) -> Result<LedgerWriteResult>;

    async fn recalculate_position(
        &self,
        key: InstrumentKey,
        references: Vec<InstrumentReference>,
    ) -> Result<RecalculationOutcome>;
}

/// Ledger operations exposed to callers.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: i64) -> Result<Transaction>;
    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
    async fn add_transaction(&self, new_transaction: NewTransaction) -> Result<LedgerWriteResult>;
    async fn update_transaction(&self, update: TransactionUpdate) -> Result<LedgerWriteResult>;
    async fn delete_transaction(&self, transaction_id: i64) -> Result<LedgerWriteResult>;
    async fn recalculate(&self, account_id: &str, ticker: &str) -> Result<Option<Position>>;
    async fn recalculate_all(&self) -> Result<Vec<RecalculationOutcome>>;
}
