//! Ledger domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};
use crate::instruments::InstrumentKind;
use crate::portfolio::positions::Position;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionSide::Buy => "BUY",
            TransactionSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionSide {
    type Err = Error;

    /// Accepts the English codes and the Russian labels stored by older
    /// databases ("Покупка"/"Продажа").
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_uppercase().as_str() {
            "BUY" | "ПОКУПКА" => Ok(TransactionSide::Buy),
            "SELL" | "ПРОДАЖА" => Ok(TransactionSide::Sell),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unknown transaction side '{}', expected BUY or SELL",
                trimmed
            ))
            .into()),
        }
    }
}

/// A single ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Monotonic insertion id; breaks ties between trades with the same timestamp.
    pub id: i64,
    pub account_id: String,
    pub ticker: String,
    pub company_name: Option<String>,
    pub side: TransactionSide,
    /// Price per unit in home currency, as entered.
    pub unit_price: Decimal,
    pub quantity: Decimal,
    /// `unit_price * quantity`
    pub total: Decimal,
    pub instrument_kind: InstrumentKind,
    pub notes: Option<String>,
    /// Moscow wall-clock time of the trade.
    pub trade_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Transaction {
    pub fn key(&self) -> InstrumentKey {
        InstrumentKey::new(&self.account_id, &self.ticker)
    }
}

/// Input for a new ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: String,
    pub ticker: String,
    pub company_name: Option<String>,
    pub side: TransactionSide,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub instrument_kind: InstrumentKind,
    pub notes: Option<String>,
    /// Defaults to now when absent.
    pub trade_date: Option<NaiveDateTime>,
}

impl NewTransaction {
    /// Trims and upper-cases identifiers, drops blank optional text.
    pub fn normalized(mut self) -> Self {
        self.account_id = self.account_id.trim().to_string();
        self.ticker = normalize_ticker(&self.ticker);
        self.company_name = non_blank(self.company_name);
        self.notes = non_blank(self.notes);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.account_id, &self.ticker, self.unit_price, self.quantity)
    }

    pub fn total(&self) -> Decimal {
        self.unit_price * self.quantity
    }

    pub fn key(&self) -> InstrumentKey {
        InstrumentKey::new(&self.account_id, &self.ticker)
    }
}

/// Partial update of an existing entry. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: i64,
    pub account_id: Option<String>,
    pub ticker: Option<String>,
    pub company_name: Option<String>,
    pub side: Option<TransactionSide>,
    pub unit_price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub instrument_kind: Option<InstrumentKind>,
    pub notes: Option<String>,
    pub trade_date: Option<NaiveDateTime>,
}

impl TransactionUpdate {
    /// Merges the update into `existing`, recomputes the total and validates
    /// the result.
    pub fn apply_to(&self, existing: &Transaction, now: NaiveDateTime) -> Result<Transaction> {
        let mut updated = existing.clone();

        if let Some(account_id) = &self.account_id {
            updated.account_id = account_id.trim().to_string();
        }
        if let Some(ticker) = &self.ticker {
            updated.ticker = normalize_ticker(ticker);
        }
        if let Some(company_name) = &self.company_name {
            updated.company_name = non_blank(Some(company_name.clone()));
        }
        if let Some(side) = self.side {
            updated.side = side;
        }
        if let Some(unit_price) = self.unit_price {
            updated.unit_price = unit_price;
        }
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(kind) = self.instrument_kind {
            updated.instrument_kind = kind;
        }
        if let Some(notes) = &self.notes {
            updated.notes = non_blank(Some(notes.clone()));
        }
        if let Some(trade_date) = self.trade_date {
            updated.trade_date = trade_date;
        }

        validate_fields(
            &updated.account_id,
            &updated.ticker,
            updated.unit_price,
            updated.quantity,
        )?;

        updated.total = updated.unit_price * updated.quantity;
        updated.updated_at = now;
        Ok(updated)
    }
}

/// Listing filter. Date bounds are inclusive whole days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub account_id: Option<String>,
    pub ticker: Option<String>,
    pub side: Option<TransactionSide>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Identifies one position: a ticker held in an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentKey {
    pub account_id: String,
    pub ticker: String,
}

impl InstrumentKey {
    pub fn new(account_id: &str, ticker: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            ticker: ticker.to_string(),
        }
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.ticker)
    }
}

/// The position left for one key after a recalculation. `None` means the
/// position was closed (or never existed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationOutcome {
    pub key: InstrumentKey,
    pub position: Option<Position>,
}

/// Result of a ledger mutation and the recalculations it triggered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerWriteResult {
    /// The stored transaction; `None` after a delete.
    pub transaction: Option<Transaction>,
    pub recalculations: Vec<RecalculationOutcome>,
}

/// Canonical ticker form: trimmed and upper-cased.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_fields(
    account_id: &str,
    ticker: &str,
    unit_price: Decimal,
    quantity: Decimal,
) -> Result<()> {
    if account_id.trim().is_empty() {
        return Err(ValidationError::MissingField("account_id".to_string()).into());
    }
    if ticker.trim().is_empty() {
        return Err(ValidationError::MissingField("ticker".to_string()).into());
    }
    if unit_price <= Decimal::ZERO {
        return Err(ValidationError::InvalidInput(format!(
            "Price must be positive, got {}",
            unit_price
        ))
        .into());
    }
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::InvalidInput(format!(
            "Quantity must be positive, got {}",
            quantity
        ))
        .into());
    }
    Ok(())
}
