//! Materializes a lot resolution into a stored position.
//!
//! The storage layer calls [`recalculate_position`] inside the same database
//! transaction that wrote the ledger, with the history it just read.

use chrono::NaiveDateTime;
use log::debug;

use super::positions_model::{Position, PositionChange};
use crate::ledger::{InstrumentKey, Transaction};
use crate::portfolio::lots::resolve;

/// Decides the new state of the position at `key`.
///
/// `transactions` is the full history of the key. `existing` is the stored
/// row, if any; its average cost is used when no lot is open but quantity
/// remains, and its creation time is preserved. Kind and name follow the
/// most recent transaction; a blank name keeps the stored one.
pub fn recalculate_position(
    key: &InstrumentKey,
    transactions: &[Transaction],
    existing: Option<&Position>,
    now: NaiveDateTime,
) -> PositionChange {
    let resolution = resolve(transactions);

    if resolution.is_closed() {
        debug!("Position {} closed after replay", key);
        return PositionChange::Delete;
    }

    let average_cost = match (resolution.average_cost(), existing) {
        (Some(avg), _) => avg,
        (None, Some(position)) => position.average_cost,
        (None, None) => {
            debug!("Position {} has quantity but no open lots", key);
            return PositionChange::Delete;
        }
    };

    let latest = transactions
        .iter()
        .max_by(|a, b| a.trade_date.cmp(&b.trade_date).then(a.id.cmp(&b.id)));
    let instrument_kind = latest.map(|t| t.instrument_kind).unwrap_or_default();
    let latest_name = latest
        .and_then(|t| t.company_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let position = match existing {
        Some(current) => Position {
            name: latest_name.or_else(|| current.name.clone()),
            instrument_kind,
            quantity: resolution.remaining_quantity,
            average_cost,
            total_cost_basis: resolution.total_cost_basis(),
            open_quantity: resolution.total_open_quantity,
            realized_pnl: resolution.realized_pnl,
            updated_at: now,
            ..current.clone()
        },
        None => Position {
            account_id: key.account_id.clone(),
            ticker: key.ticker.clone(),
            name: latest_name,
            instrument_kind,
            quantity: resolution.remaining_quantity,
            average_cost,
            total_cost_basis: resolution.total_cost_basis(),
            open_quantity: resolution.total_open_quantity,
            realized_pnl: resolution.realized_pnl,
            created_at: now,
            updated_at: now,
        },
    };

    debug!(
        "Position {}: quantity {} at average {}",
        key, position.quantity, position.average_cost
    );
    PositionChange::Upsert(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::InstrumentKind;
    use crate::ledger::TransactionSide::{self, Buy, Sell};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn key() -> InstrumentKey {
        InstrumentKey::new("default", "OFZ26238")
    }

    fn txn(id: i64, day: u32, side: TransactionSide, qty: Decimal, price: Decimal) -> Transaction {
        Transaction {
            id,
            account_id: "default".to_string(),
            ticker: "OFZ26238".to_string(),
            company_name: Some(format!("ОФЗ {}", id)),
            side,
            unit_price: price,
            quantity: qty,
            total: price * qty,
            instrument_kind: InstrumentKind::Bond,
            notes: None,
            trade_date: at(day),
            created_at: at(day),
            updated_at: at(day),
        }
    }

    #[test]
    fn test_new_position_inherits_latest_name_and_kind() {
        let history = vec![
            txn(1, 1, Buy, dec!(10), dec!(100)),
            txn(2, 2, Buy, dec!(10), dec!(200)),
            txn(3, 3, Sell, dec!(15), dec!(210)),
        ];

        let position = recalculate_position(&key(), &history, None, at(4))
            .into_position()
            .unwrap();
        assert_eq!(position.quantity, dec!(5));
        assert_eq!(position.average_cost, dec!(200));
        assert_eq!(position.total_cost_basis, dec!(1000));
        assert_eq!(position.open_quantity, dec!(5));
        assert_eq!(position.realized_pnl, dec!(1150));
        assert_eq!(position.name.as_deref(), Some("ОФЗ 3"));
        assert_eq!(position.instrument_kind, InstrumentKind::Bond);
        assert_eq!(position.created_at, at(4));
    }

    #[test]
    fn test_existing_position_keeps_creation_time() {
        let history = vec![txn(1, 1, Buy, dec!(10), dec!(100))];
        let first = recalculate_position(&key(), &history, None, at(2))
            .into_position()
            .unwrap();

        let mut history = history;
        history.push(txn(2, 3, Buy, dec!(10), dec!(300)));
        let second = recalculate_position(&key(), &history, Some(&first), at(5))
            .into_position()
            .unwrap();

        assert_eq!(second.created_at, at(2));
        assert_eq!(second.updated_at, at(5));
        assert_eq!(second.name.as_deref(), Some("ОФЗ 2"));
        assert_eq!(second.average_cost, dec!(200));
    }

    #[test]
    fn test_kind_correction_reaches_existing_position() {
        let mut history = vec![txn(1, 1, Buy, dec!(10), dec!(95))];
        history[0].instrument_kind = InstrumentKind::Equity;
        let stored = recalculate_position(&key(), &history, None, at(2))
            .into_position()
            .unwrap();
        assert_eq!(stored.instrument_kind, InstrumentKind::Equity);

        history[0].instrument_kind = InstrumentKind::Bond;
        history[0].company_name = Some("  ".to_string());
        let corrected = recalculate_position(&key(), &history, Some(&stored), at(3))
            .into_position()
            .unwrap();

        assert_eq!(corrected.instrument_kind, InstrumentKind::Bond);
        assert_eq!(corrected.name.as_deref(), Some("ОФЗ 1"));
        assert_eq!(corrected.created_at, at(2));
    }

    #[test]
    fn test_oversell_deletes_position() {
        let history = vec![
            txn(1, 1, Buy, dec!(5), dec!(100)),
            txn(2, 2, Sell, dec!(8), dec!(100)),
        ];
        assert_eq!(
            recalculate_position(&key(), &history, None, at(3)),
            PositionChange::Delete
        );
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let history = vec![
            txn(1, 1, Buy, dec!(3), dec!(97.5)),
            txn(2, 2, Buy, dec!(2), dec!(99.1)),
            txn(3, 3, Sell, dec!(1), dec!(101)),
        ];
        let first = recalculate_position(&key(), &history, None, at(4))
            .into_position()
            .unwrap();
        let second = recalculate_position(&key(), &history, Some(&first), at(4))
            .into_position()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_history_deletes() {
        assert_eq!(
            recalculate_position(&key(), &[], None, at(1)),
            PositionChange::Delete
        );
    }
}
