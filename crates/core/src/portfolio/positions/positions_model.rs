use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instruments::InstrumentKind;
use crate::ledger::InstrumentKey;

/// Holding of one ticker in one account, derived from the ledger.
///
/// Stored as a cache; every field equals what [`crate::portfolio::lots::resolve`]
/// produces from the full history of the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub account_id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub instrument_kind: InstrumentKind,
    pub quantity: Decimal,
    /// Home-currency average price of the FIFO-open lots.
    pub average_cost: Decimal,
    /// Σ price × quantity over the open lots.
    pub total_cost_basis: Decimal,
    /// Σ quantity over the open lots.
    pub open_quantity: Decimal,
    /// Gain realized by every SELL of the key so far.
    pub realized_pnl: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Position {
    pub fn key(&self) -> InstrumentKey {
        InstrumentKey::new(&self.account_id, &self.ticker)
    }

    /// Cost of the held quantity.
    ///
    /// Uses the stored basis directly when the open lots cover exactly the
    /// held quantity, scales it when they don't, and falls back to the
    /// average cost when no lot data is available.
    pub fn cost_value(&self) -> Decimal {
        if self.quantity == self.open_quantity {
            self.total_cost_basis
        } else if self.open_quantity > Decimal::ZERO {
            self.total_cost_basis * self.quantity / self.open_quantity
        } else {
            self.quantity * self.average_cost
        }
    }
}

/// What a recalculation does to the stored row.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionChange {
    Delete,
    Upsert(Position),
}

impl PositionChange {
    pub fn into_position(self) -> Option<Position> {
        match self {
            PositionChange::Delete => None,
            PositionChange::Upsert(position) => Some(position),
        }
    }
}
