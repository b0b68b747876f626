use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::time::timeout;

use super::ledger_model::{
    InstrumentKey, LedgerWriteResult, NewTransaction, RecalculationOutcome, Transaction,
    TransactionFilter, TransactionUpdate,
};
use super::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
use crate::errors::Result;
use crate::instruments::{InstrumentKind, InstrumentReference, InstrumentRepositoryTrait};
use crate::portfolio::positions::Position;
use crate::quotes::QuoteProviderTrait;
use crate::utils::time_utils::valuation_now;

/// Service for managing the transaction ledger
pub struct LedgerService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
    quote_provider: Arc<dyn QuoteProviderTrait>,
    lookup_timeout: Duration,
}

impl LedgerService {
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
        quote_provider: Arc<dyn QuoteProviderTrait>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            ledger_repository,
            instrument_repository,
            quote_provider,
            lookup_timeout,
        }
    }

    /// Fetches face data for bonds that don't have it cached yet.
    ///
    /// Runs before the storage transaction opens. A slow or failing provider
    /// only means the reference is missing; the ledger write goes ahead.
    async fn prefetch_reference(
        &self,
        ticker: &str,
        kind: InstrumentKind,
    ) -> Option<InstrumentReference> {
        if !kind.is_bond() {
            return None;
        }

        match self.instrument_repository.get_instrument(ticker) {
            Ok(Some(instrument)) if instrument.kind == kind && !instrument.needs_reference() => {
                return None
            }
            Ok(_) => {}
            Err(e) => warn!("Could not read instrument {}: {}", ticker, e),
        }

        match timeout(
            self.lookup_timeout,
            self.quote_provider.get_reference(ticker, kind),
        )
        .await
        {
            Ok(Some(reference)) => {
                debug!("Fetched reference data for bond {}", ticker);
                Some(InstrumentReference {
                    ticker: ticker.to_string(),
                    kind,
                    name: reference.name,
                    face_value: reference.face_value,
                    face_currency: reference.face_currency,
                    lot_size: reference.lot_size,
                })
            }
            Ok(None) => None,
            Err(_) => {
                warn!("Reference lookup for {} timed out", ticker);
                None
            }
        }
    }

    async fn references_for(&self, ticker: &str, kind: InstrumentKind) -> Vec<InstrumentReference> {
        self.prefetch_reference(ticker, kind)
            .await
            .into_iter()
            .collect()
    }

    fn log_outcomes(outcomes: &[RecalculationOutcome]) {
        for outcome in outcomes {
            match &outcome.position {
                Some(position) => info!(
                    "Recalculated {}: {} @ {}",
                    outcome.key, position.quantity, position.average_cost
                ),
                None => info!("Recalculated {}: no open position", outcome.key),
            }
        }
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    fn get_transaction(&self, transaction_id: i64) -> Result<Transaction> {
        self.ledger_repository.get_transaction(transaction_id)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.ledger_repository.list_transactions(filter)
    }

    async fn add_transaction(&self, new_transaction: NewTransaction) -> Result<LedgerWriteResult> {
        let mut new_transaction = new_transaction.normalized();
        new_transaction.validate()?;
        if new_transaction.trade_date.is_none() {
            new_transaction.trade_date = Some(valuation_now());
        }

        let references = self
            .references_for(&new_transaction.ticker, new_transaction.instrument_kind)
            .await;

        let result = self
            .ledger_repository
            .create_transaction(new_transaction, references)
            .await?;
        Self::log_outcomes(&result.recalculations);
        Ok(result)
    }

    async fn update_transaction(&self, update: TransactionUpdate) -> Result<LedgerWriteResult> {
        let existing = self.ledger_repository.get_transaction(update.id)?;
        let updated = update.apply_to(&existing, valuation_now())?;

        let references = self
            .references_for(&updated.ticker, updated.instrument_kind)
            .await;

        let result = self
            .ledger_repository
            .update_transaction(updated, references)
            .await?;
        Self::log_outcomes(&result.recalculations);
        Ok(result)
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<LedgerWriteResult> {
        let result = self
            .ledger_repository
            .delete_transaction(transaction_id)
            .await?;
        Self::log_outcomes(&result.recalculations);
        Ok(result)
    }

    async fn recalculate(&self, account_id: &str, ticker: &str) -> Result<Option<Position>> {
        let key = InstrumentKey::new(account_id.trim(), &super::normalize_ticker(ticker));
        let kind = self
            .ledger_repository
            .get_transactions_for_instrument(&key)?
            .last()
            .map(|t| t.instrument_kind)
            .unwrap_or_default();

        let references = self.references_for(&key.ticker, kind).await;
        let outcome = self
            .ledger_repository
            .recalculate_position(key, references)
            .await?;
        Self::log_outcomes(std::slice::from_ref(&outcome));
        Ok(outcome.position)
    }

    async fn recalculate_all(&self) -> Result<Vec<RecalculationOutcome>> {
        let keys: BTreeSet<InstrumentKey> = self
            .ledger_repository
            .list_instrument_keys()?
            .into_iter()
            .collect();

        let mut outcomes = Vec::with_capacity(keys.len());
        for key in keys {
            let position = self.recalculate(&key.account_id, &key.ticker).await?;
            outcomes.push(RecalculationOutcome { key, position });
        }
        Ok(outcomes)
    }
}
