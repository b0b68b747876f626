use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

use super::model::{NewTransactionDB, TransactionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::instruments::{ensure_instrument, upsert_reference};
use crate::portfolio::positions::{apply_position_change, load_position};
use crate::schema::positions::dsl as positions_dsl;
use crate::schema::transactions::dsl as transactions_dsl;
use moexfolio_core::errors::Error;
use moexfolio_core::instruments::InstrumentReference;
use moexfolio_core::ledger::{
    normalize_ticker, InstrumentKey, LedgerError, LedgerRepositoryTrait, LedgerWriteResult,
    NewTransaction, RecalculationOutcome, Transaction, TransactionFilter,
};
use moexfolio_core::portfolio::positions::recalculate_position;
use moexfolio_core::utils::time_utils::valuation_now;
use moexfolio_core::Result;

pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_history(conn: &mut SqliteConnection, key: &InstrumentKey) -> Result<Vec<Transaction>> {
    transactions_dsl::transactions
        .filter(transactions_dsl::account_id.eq(&key.account_id))
        .filter(transactions_dsl::ticker.eq(&key.ticker))
        .order((transactions_dsl::trade_date.asc(), transactions_dsl::id.asc()))
        .select(TransactionDB::as_select())
        .load(conn)
        .into_core()?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
}

fn load_transaction(conn: &mut SqliteConnection, transaction_id: i64) -> Result<Transaction> {
    transactions_dsl::transactions
        .find(transaction_id)
        .select(TransactionDB::as_select())
        .first(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| Error::from(LedgerError::NotFound(transaction_id.to_string())))
        .and_then(Transaction::try_from)
}

/// Replays the history of `key` and writes the result, on the caller's
/// connection so it shares the caller's transaction.
fn recalculate_in_tx(
    conn: &mut SqliteConnection,
    key: &InstrumentKey,
    now: NaiveDateTime,
) -> Result<RecalculationOutcome> {
    let replay = |conn: &mut SqliteConnection| -> Result<RecalculationOutcome> {
        let history = load_history(conn, key)?;
        let existing = load_position(conn, key)?;
        let change = recalculate_position(key, &history, existing.as_ref(), now);
        let position = apply_position_change(conn, key, change)?;
        debug!("Replayed {} transactions for {}", history.len(), key);
        Ok(RecalculationOutcome {
            key: key.clone(),
            position,
        })
    };

    replay(conn).map_err(|e| {
        LedgerError::RecalculationFailed {
            account_id: key.account_id.clone(),
            ticker: key.ticker.clone(),
            message: e.to_string(),
        }
        .into()
    })
}

fn store_references(
    conn: &mut SqliteConnection,
    references: &[InstrumentReference],
    now: NaiveDateTime,
) -> Result<()> {
    for reference in references {
        upsert_reference(conn, reference, now)?;
    }
    Ok(())
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_transaction(&self, transaction_id: i64) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        load_transaction(&mut conn, transaction_id)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = transactions_dsl::transactions.into_boxed();
        if let Some(account_id) = &filter.account_id {
            query = query.filter(transactions_dsl::account_id.eq(account_id.trim().to_string()));
        }
        if let Some(ticker) = &filter.ticker {
            query = query.filter(transactions_dsl::ticker.eq(normalize_ticker(ticker)));
        }
        if let Some(side) = filter.side {
            query = query.filter(transactions_dsl::side.eq(side.as_str()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(transactions_dsl::trade_date.ge(from.and_time(NaiveTime::MIN)));
        }
        if let Some(next_day) = filter.date_to.and_then(|to| to.checked_add_days(Days::new(1))) {
            query =
                query.filter(transactions_dsl::trade_date.lt(next_day.and_time(NaiveTime::MIN)));
        }

        query
            .order((transactions_dsl::trade_date.desc(), transactions_dsl::id.desc()))
            .select(TransactionDB::as_select())
            .load(&mut conn)
            .into_core()?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    fn get_transactions_for_instrument(&self, key: &InstrumentKey) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        load_history(&mut conn, key)
    }

    fn list_instrument_keys(&self) -> Result<Vec<InstrumentKey>> {
        let mut conn = get_connection(&self.pool)?;

        let traded: Vec<(String, String)> = transactions_dsl::transactions
            .select((transactions_dsl::account_id, transactions_dsl::ticker))
            .distinct()
            .load(&mut conn)
            .into_core()?;
        let held: Vec<(String, String)> = positions_dsl::positions
            .select((positions_dsl::account_id, positions_dsl::ticker))
            .load(&mut conn)
            .into_core()?;

        let keys: BTreeSet<InstrumentKey> = traded
            .into_iter()
            .chain(held)
            .map(|(account_id, ticker)| InstrumentKey { account_id, ticker })
            .collect();
        Ok(keys.into_iter().collect())
    }

    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
        references: Vec<InstrumentReference>,
    ) -> Result<LedgerWriteResult> {
        let now = valuation_now();
        let row = NewTransactionDB::from_domain(&new_transaction, now);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<LedgerWriteResult> {
                let inserted = diesel::insert_into(transactions_dsl::transactions)
                    .values(&row)
                    .returning(TransactionDB::as_returning())
                    .get_result(conn)
                    .into_core()?;
                let transaction = Transaction::try_from(inserted)?;

                ensure_instrument(
                    conn,
                    &transaction.ticker,
                    transaction.instrument_kind,
                    transaction.company_name.as_deref(),
                    now,
                )?;
                store_references(conn, &references, now)?;

                let outcome = recalculate_in_tx(conn, &transaction.key(), now)?;
                Ok(LedgerWriteResult {
                    transaction: Some(transaction),
                    recalculations: vec![outcome],
                })
            })
            .await
    }

    async fn update_transaction(
        &self,
        updated: Transaction,
        references: Vec<InstrumentReference>,
    ) -> Result<LedgerWriteResult> {
        let now = valuation_now();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<LedgerWriteResult> {
                let old_key = load_transaction(conn, updated.id)?.key();

                diesel::update(transactions_dsl::transactions.find(updated.id))
                    .set(&TransactionDB::from(&updated))
                    .execute(conn)
                    .into_core()?;

                ensure_instrument(
                    conn,
                    &updated.ticker,
                    updated.instrument_kind,
                    updated.company_name.as_deref(),
                    now,
                )?;
                store_references(conn, &references, now)?;

                let new_key = updated.key();
                let mut recalculations = vec![recalculate_in_tx(conn, &old_key, now)?];
                if new_key != old_key {
                    recalculations.push(recalculate_in_tx(conn, &new_key, now)?);
                }
                Ok(LedgerWriteResult {
                    transaction: Some(updated),
                    recalculations,
                })
            })
            .await
    }

    async fn delete_transaction(&self, transaction_id: i64) -> Result<LedgerWriteResult> {
        let now = valuation_now();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<LedgerWriteResult> {
                let key = load_transaction(conn, transaction_id)?.key();

                diesel::delete(transactions_dsl::transactions.find(transaction_id))
                    .execute(conn)
                    .into_core()?;

                let outcome = recalculate_in_tx(conn, &key, now)?;
                Ok(LedgerWriteResult {
                    transaction: None,
                    recalculations: vec![outcome],
                })
            })
            .await
    }

    async fn recalculate_position(
        &self,
        key: InstrumentKey,
        references: Vec<InstrumentReference>,
    ) -> Result<RecalculationOutcome> {
        let now = valuation_now();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<RecalculationOutcome> {
                store_references(conn, &references, now)?;
                recalculate_in_tx(conn, &key, now)
            })
            .await
    }
}
