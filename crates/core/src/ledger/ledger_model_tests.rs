use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;

use super::ledger_model::*;
use crate::instruments::InstrumentKind;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn stored() -> Transaction {
    Transaction {
        id: 7,
        account_id: "default".to_string(),
        ticker: "SBER".to_string(),
        company_name: Some("Сбербанк".to_string()),
        side: TransactionSide::Buy,
        unit_price: dec!(250),
        quantity: dec!(10),
        total: dec!(2500),
        instrument_kind: InstrumentKind::Equity,
        notes: None,
        trade_date: at(2024, 3, 1, 10),
        created_at: at(2024, 3, 1, 10),
        updated_at: at(2024, 3, 1, 10),
    }
}

fn new_transaction() -> NewTransaction {
    NewTransaction {
        account_id: " default ".to_string(),
        ticker: " gazp ".to_string(),
        company_name: Some("  ".to_string()),
        side: TransactionSide::Buy,
        unit_price: dec!(160.5),
        quantity: dec!(20),
        instrument_kind: InstrumentKind::Equity,
        notes: Some(" first lot ".to_string()),
        trade_date: None,
    }
}

#[test]
fn test_side_parsing_accepts_codes_and_labels() {
    assert_eq!("buy".parse::<TransactionSide>().unwrap(), TransactionSide::Buy);
    assert_eq!("Продажа".parse::<TransactionSide>().unwrap(), TransactionSide::Sell);
    let err = "HOLD".parse::<TransactionSide>().unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_new_transaction_normalization() {
    let normalized = new_transaction().normalized();
    assert_eq!(normalized.account_id, "default");
    assert_eq!(normalized.ticker, "GAZP");
    assert_eq!(normalized.company_name, None);
    assert_eq!(normalized.notes.as_deref(), Some("first lot"));
    assert_eq!(normalized.total(), dec!(3210));
    assert!(normalized.validate().is_ok());
}

#[test]
fn test_new_transaction_rejects_bad_input() {
    let mut bad = new_transaction().normalized();
    bad.unit_price = dec!(0);
    assert!(bad.validate().unwrap_err().is_validation());

    let mut bad = new_transaction().normalized();
    bad.quantity = dec!(-1);
    assert!(bad.validate().unwrap_err().is_validation());

    let mut bad = new_transaction().normalized();
    bad.ticker = String::new();
    assert!(bad.validate().unwrap_err().is_validation());
}

#[test]
fn test_update_recomputes_total_and_touches_timestamp() {
    let update = TransactionUpdate {
        id: 7,
        quantity: Some(dec!(4)),
        ticker: Some("lkoh".to_string()),
        ..Default::default()
    };
    let now = at(2024, 3, 5, 9);
    let updated = update.apply_to(&stored(), now).unwrap();

    assert_eq!(updated.ticker, "LKOH");
    assert_eq!(updated.quantity, dec!(4));
    assert_eq!(updated.total, dec!(1000));
    assert_eq!(updated.updated_at, now);
    assert_eq!(updated.created_at, stored().created_at);
}

#[test]
fn test_update_with_invalid_price_is_rejected() {
    let update = TransactionUpdate {
        id: 7,
        unit_price: Some(dec!(-5)),
        ..Default::default()
    };
    assert!(update
        .apply_to(&stored(), at(2024, 3, 5, 9))
        .unwrap_err()
        .is_validation());
}
