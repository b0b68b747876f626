//! FIFO replay of a position's trade history.
//!
//! Pure: no storage, no clock. Given every BUY and SELL of one ticker in one
//! account, reconstruct what is still held and what it cost, plus the gain
//! the sales realized.

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::OnceLock;

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::QUANTITY_THRESHOLD;
use crate::ledger::{Transaction, TransactionSide};

/// A still-open purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub unit_price: Decimal,
    pub remaining_quantity: Decimal,
}

impl Lot {
    pub fn cost(&self) -> Decimal {
        self.unit_price * self.remaining_quantity
    }
}

/// Outcome of replaying a ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotResolution {
    /// Quantity held after the replay; never negative.
    pub remaining_quantity: Decimal,
    /// Open lots, oldest first.
    pub open_lots: Vec<Lot>,
    /// Sum of `remaining_quantity` over `open_lots`.
    pub total_open_quantity: Decimal,
    /// Σ (sell price - FIFO cost) over every quantity a SELL matched
    /// against a held lot, across all epochs of the history.
    pub realized_pnl: Decimal,
}

impl LotResolution {
    /// Σ price × quantity over the open lots.
    pub fn total_cost_basis(&self) -> Decimal {
        self.open_lots.iter().map(Lot::cost).sum()
    }

    /// Weighted average price of the open lots, `None` when nothing is open.
    pub fn average_cost(&self) -> Option<Decimal> {
        if self.total_open_quantity <= Decimal::ZERO {
            return None;
        }
        Some(self.total_cost_basis() / self.total_open_quantity)
    }

    pub fn is_closed(&self) -> bool {
        !is_quantity_significant(&self.remaining_quantity)
    }
}

fn quantity_threshold() -> Decimal {
    static THRESHOLD: OnceLock<Decimal> = OnceLock::new();
    *THRESHOLD.get_or_init(|| Decimal::from_str(QUANTITY_THRESHOLD).unwrap_or(Decimal::ZERO))
}

/// Whether a quantity is large enough to count as held.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    quantity.abs() >= quantity_threshold()
}

/// Replays `transactions` in `(trade_date, id)` order.
///
/// A BUY that arrives while nothing is held starts a new cost-basis epoch:
/// lots left over from before the liquidation are dropped. A SELL consumes
/// lots front to back; selling more than is held clamps the position to zero
/// and is logged, never raised.
pub fn resolve(transactions: &[Transaction]) -> LotResolution {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| a.trade_date.cmp(&b.trade_date).then(a.id.cmp(&b.id)));

    let mut running_quantity = Decimal::ZERO;
    let mut open_lots: VecDeque<Lot> = VecDeque::new();
    let mut realized_pnl = Decimal::ZERO;

    for transaction in ordered {
        match transaction.side {
            TransactionSide::Buy => {
                if running_quantity <= Decimal::ZERO {
                    open_lots.clear();
                }
                running_quantity += transaction.quantity;
                open_lots.push_back(Lot {
                    unit_price: transaction.unit_price,
                    remaining_quantity: transaction.quantity,
                });
            }
            TransactionSide::Sell => {
                running_quantity -= transaction.quantity;
                let consumed = consume_front(&mut open_lots, transaction.quantity);
                realized_pnl += transaction.unit_price * consumed.quantity - consumed.cost;

                if running_quantity < Decimal::ZERO {
                    warn!(
                        "Transaction {} sells {} {} but only {} was held; clamping to zero",
                        transaction.id,
                        transaction.quantity,
                        transaction.ticker,
                        running_quantity + transaction.quantity
                    );
                    running_quantity = Decimal::ZERO;
                }
            }
        }
    }

    let total_open_quantity: Decimal = open_lots.iter().map(|lot| lot.remaining_quantity).sum();

    if (running_quantity - total_open_quantity).abs() >= quantity_threshold() {
        warn!(
            "Lot quantity {} diverges from running quantity {}",
            total_open_quantity, running_quantity
        );
    }

    LotResolution {
        remaining_quantity: running_quantity,
        open_lots: open_lots.into(),
        total_open_quantity,
        realized_pnl,
    }
}

/// What a SELL took out of the open lots.
#[derive(Debug, Default)]
struct Consumed {
    quantity: Decimal,
    cost: Decimal,
}

/// Removes up to `quantity` from the oldest lots. Less is consumed when the
/// lots run out.
fn consume_front(open_lots: &mut VecDeque<Lot>, quantity: Decimal) -> Consumed {
    let mut consumed = Consumed::default();
    let mut to_consume = quantity;
    while to_consume > Decimal::ZERO {
        let Some(front) = open_lots.front_mut() else {
            break;
        };
        if front.remaining_quantity <= to_consume {
            to_consume -= front.remaining_quantity;
            consumed.quantity += front.remaining_quantity;
            consumed.cost += front.cost();
            open_lots.pop_front();
        } else {
            front.remaining_quantity -= to_consume;
            consumed.quantity += to_consume;
            consumed.cost += front.unit_price * to_consume;
            if !is_quantity_significant(&front.remaining_quantity) {
                open_lots.pop_front();
            }
            to_consume = Decimal::ZERO;
        }
    }
    consumed
}
