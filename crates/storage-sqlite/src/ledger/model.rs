//! Database models for ledger transactions.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::utils::{decimal_to_text, parse_decimal};
use moexfolio_core::ledger::{NewTransaction, Transaction};
use moexfolio_core::Result;

#[derive(Queryable, Identifiable, Selectable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TransactionDB {
    pub id: i64,
    pub account_id: String,
    pub ticker: String,
    pub company_name: Option<String>,
    pub side: String,
    pub unit_price: String,
    pub quantity: String,
    pub total: String,
    pub instrument_kind: String,
    pub notes: Option<String>,
    pub trade_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
pub struct NewTransactionDB {
    pub account_id: String,
    pub ticker: String,
    pub company_name: Option<String>,
    pub side: String,
    pub unit_price: String,
    pub quantity: String,
    pub total: String,
    pub instrument_kind: String,
    pub notes: Option<String>,
    pub trade_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewTransactionDB {
    /// `trade_date` falls back to `now` when the caller left it empty.
    pub fn from_domain(new_transaction: &NewTransaction, now: NaiveDateTime) -> Self {
        Self {
            account_id: new_transaction.account_id.clone(),
            ticker: new_transaction.ticker.clone(),
            company_name: new_transaction.company_name.clone(),
            side: new_transaction.side.as_str().to_string(),
            unit_price: decimal_to_text(new_transaction.unit_price),
            quantity: decimal_to_text(new_transaction.quantity),
            total: decimal_to_text(new_transaction.total()),
            instrument_kind: new_transaction.instrument_kind.as_str().to_string(),
            notes: new_transaction.notes.clone(),
            trade_date: new_transaction.trade_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<&Transaction> for TransactionDB {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            account_id: transaction.account_id.clone(),
            ticker: transaction.ticker.clone(),
            company_name: transaction.company_name.clone(),
            side: transaction.side.as_str().to_string(),
            unit_price: decimal_to_text(transaction.unit_price),
            quantity: decimal_to_text(transaction.quantity),
            total: decimal_to_text(transaction.total),
            instrument_kind: transaction.instrument_kind.as_str().to_string(),
            notes: transaction.notes.clone(),
            trade_date: transaction.trade_date,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = moexfolio_core::Error;

    fn try_from(db: TransactionDB) -> Result<Self> {
        Ok(Self {
            side: db.side.parse()?,
            unit_price: parse_decimal(&db.unit_price, "transactions.unit_price")?,
            quantity: parse_decimal(&db.quantity, "transactions.quantity")?,
            total: parse_decimal(&db.total, "transactions.total")?,
            instrument_kind: db.instrument_kind.parse()?,
            id: db.id,
            account_id: db.account_id,
            ticker: db.ticker,
            company_name: db.company_name,
            notes: db.notes,
            trade_date: db.trade_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
