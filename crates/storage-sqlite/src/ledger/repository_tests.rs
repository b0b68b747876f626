use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::{tempdir, TempDir};

use super::LedgerRepository;
use crate::db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool, WriteHandle};
use crate::instruments::InstrumentRepository;
use crate::portfolio::positions::PositionRepository;
use crate::schema::transactions::dsl as transactions_dsl;
use moexfolio_core::errors::{DatabaseError, Error};
use moexfolio_core::instruments::{InstrumentKind, InstrumentReference, InstrumentRepositoryTrait};
use moexfolio_core::ledger::{
    InstrumentKey, LedgerError, LedgerRepositoryTrait, NewTransaction, TransactionFilter,
    TransactionSide, TransactionUpdate,
};
use moexfolio_core::portfolio::positions::PositionRepositoryTrait;

struct Fixture {
    ledger: LedgerRepository,
    positions: PositionRepository,
    instruments: InstrumentRepository,
    pool: Arc<DbPool>,
    writer: WriteHandle,
    _temp_dir: TempDir,
}

fn setup() -> Fixture {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("nested").join("test.db");
    let db_path = init(&db_path.to_string_lossy()).expect("Failed to init database");

    let pool = create_pool(&db_path).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    Fixture {
        ledger: LedgerRepository::new(Arc::clone(&pool), writer.clone()),
        positions: PositionRepository::new(Arc::clone(&pool)),
        instruments: InstrumentRepository::new(Arc::clone(&pool)),
        pool,
        writer,
        _temp_dir: temp_dir,
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn trade(
    ticker: &str,
    side: TransactionSide,
    quantity: Decimal,
    unit_price: Decimal,
    trade_date: NaiveDateTime,
) -> NewTransaction {
    NewTransaction {
        account_id: "default".to_string(),
        ticker: ticker.to_string(),
        company_name: Some(format!("{} PAO", ticker)),
        side,
        unit_price,
        quantity,
        instrument_kind: InstrumentKind::Equity,
        notes: None,
        trade_date: Some(trade_date),
    }
}

fn key(ticker: &str) -> InstrumentKey {
    InstrumentKey::new("default", ticker)
}

#[tokio::test]
async fn test_fifo_partial_sell_persists_position() {
    let f = setup();
    use TransactionSide::{Buy, Sell};

    f.ledger
        .create_transaction(trade("SBER", Buy, dec!(10), dec!(100), at(1, 10)), vec![])
        .await
        .unwrap();
    f.ledger
        .create_transaction(trade("SBER", Buy, dec!(10), dec!(200), at(2, 10)), vec![])
        .await
        .unwrap();
    let result = f
        .ledger
        .create_transaction(trade("SBER", Sell, dec!(15), dec!(250), at(3, 10)), vec![])
        .await
        .unwrap();

    let position = result.recalculations[0].position.clone().unwrap();
    assert_eq!(position.quantity, dec!(5));
    assert_eq!(position.average_cost, dec!(200));

    let stored = f.positions.get_position(&key("SBER")).unwrap().unwrap();
    assert_eq!(stored.quantity, dec!(5));
    assert_eq!(stored.average_cost, dec!(200));
    assert_eq!(stored.total_cost_basis, dec!(1000));
    assert_eq!(stored.realized_pnl, dec!(1750));
    assert_eq!(stored.name.as_deref(), Some("SBER PAO"));
}

#[tokio::test]
async fn test_oversell_removes_position() {
    let f = setup();

    f.ledger
        .create_transaction(
            trade("GAZP", TransactionSide::Buy, dec!(5), dec!(100), at(1, 10)),
            vec![],
        )
        .await
        .unwrap();
    let result = f
        .ledger
        .create_transaction(
            trade("GAZP", TransactionSide::Sell, dec!(8), dec!(120), at(2, 10)),
            vec![],
        )
        .await
        .unwrap();

    assert!(result.recalculations[0].position.is_none());
    assert!(f.positions.get_position(&key("GAZP")).unwrap().is_none());
    assert_eq!(f.ledger.list_transactions(&TransactionFilter::default()).unwrap().len(), 2);
}

#[tokio::test]
async fn test_moving_a_transaction_recalculates_both_tickers() {
    let f = setup();

    let created = f
        .ledger
        .create_transaction(
            trade("SBER", TransactionSide::Buy, dec!(10), dec!(100), at(1, 10)),
            vec![],
        )
        .await
        .unwrap()
        .transaction
        .unwrap();

    let moved = TransactionUpdate {
        id: created.id,
        ticker: Some("lkoh".to_string()),
        ..Default::default()
    }
    .apply_to(&created, at(5, 10))
    .unwrap();

    let result = f.ledger.update_transaction(moved, vec![]).await.unwrap();
    assert_eq!(result.recalculations.len(), 2);
    assert!(f.positions.get_position(&key("SBER")).unwrap().is_none());

    let lkoh = f.positions.get_position(&key("LKOH")).unwrap().unwrap();
    assert_eq!(lkoh.quantity, dec!(10));
    assert!(f.instruments.get_instrument("LKOH").unwrap().is_some());
}

#[tokio::test]
async fn test_kind_edit_reaches_position_and_instrument() {
    let f = setup();
    let ticker = "SU26238RMFS4";

    let created = f
        .ledger
        .create_transaction(
            trade(ticker, TransactionSide::Buy, dec!(3), dec!(950), at(1, 10)),
            vec![],
        )
        .await
        .unwrap()
        .transaction
        .unwrap();
    assert_eq!(
        f.instruments.get_instrument(ticker).unwrap().unwrap().kind,
        InstrumentKind::Equity
    );

    let corrected = TransactionUpdate {
        id: created.id,
        instrument_kind: Some(InstrumentKind::Bond),
        ..Default::default()
    }
    .apply_to(&created, at(2, 10))
    .unwrap();
    f.ledger.update_transaction(corrected, vec![]).await.unwrap();

    let position = f.positions.get_position(&key(ticker)).unwrap().unwrap();
    assert_eq!(position.instrument_kind, InstrumentKind::Bond);
    assert_eq!(position.quantity, dec!(3));

    let instrument = f.instruments.get_instrument(ticker).unwrap().unwrap();
    assert_eq!(instrument.kind, InstrumentKind::Bond);
    assert!(instrument.needs_reference());
}

#[tokio::test]
async fn test_kind_change_drops_cached_face_data() {
    let f = setup();
    let ticker = "RU000A0JX0J2";
    let mut bond = trade(ticker, TransactionSide::Buy, dec!(2), dec!(950), at(1, 10));
    bond.instrument_kind = InstrumentKind::Bond;
    let reference = InstrumentReference {
        ticker: ticker.to_string(),
        kind: InstrumentKind::Bond,
        name: None,
        face_value: Some(dec!(1000)),
        face_currency: Some("USD".to_string()),
        lot_size: Some(1),
    };
    let created = f
        .ledger
        .create_transaction(bond, vec![reference])
        .await
        .unwrap()
        .transaction
        .unwrap();

    let mut equity = created.clone();
    equity.instrument_kind = InstrumentKind::Equity;
    f.ledger.update_transaction(equity, vec![]).await.unwrap();

    let instrument = f.instruments.get_instrument(ticker).unwrap().unwrap();
    assert_eq!(instrument.kind, InstrumentKind::Equity);
    assert_eq!(instrument.face_value, None);
    assert_eq!(instrument.face_currency, None);
    assert_eq!(instrument.lot_size, Some(1));
    assert_eq!(instrument.name.as_deref(), Some("RU000A0JX0J2 PAO"));
}

#[tokio::test]
async fn test_realized_pnl_survives_rebuy() {
    let f = setup();
    use TransactionSide::{Buy, Sell};

    for (side, quantity, price, day) in [
        (Buy, dec!(10), dec!(100), 1),
        (Sell, dec!(4), dec!(90), 2),
        (Sell, dec!(6), dec!(130), 3),
        (Buy, dec!(2), dec!(140), 4),
    ] {
        f.ledger
            .create_transaction(trade("LKOH", side, quantity, price, at(day, 10)), vec![])
            .await
            .unwrap();
    }

    let stored = f.positions.get_position(&key("LKOH")).unwrap().unwrap();
    assert_eq!(stored.quantity, dec!(2));
    assert_eq!(stored.average_cost, dec!(140));
    // 4 @ -10 + 6 @ +30
    assert_eq!(stored.realized_pnl, dec!(140));
}

#[tokio::test]
async fn test_update_clears_notes() {
    let f = setup();
    let mut new_transaction = trade("SBER", TransactionSide::Buy, dec!(1), dec!(100), at(1, 10));
    new_transaction.notes = Some("first lot".to_string());
    let created = f
        .ledger
        .create_transaction(new_transaction, vec![])
        .await
        .unwrap()
        .transaction
        .unwrap();

    let mut updated = created.clone();
    updated.notes = None;
    updated.quantity = dec!(3);
    updated.total = dec!(300);
    f.ledger.update_transaction(updated, vec![]).await.unwrap();

    let stored = f.ledger.get_transaction(created.id).unwrap();
    assert_eq!(stored.notes, None);
    assert_eq!(stored.total, dec!(300));
    assert_eq!(
        f.positions.get_position(&key("SBER")).unwrap().unwrap().quantity,
        dec!(3)
    );
}

#[tokio::test]
async fn test_delete_and_missing_transaction() {
    let f = setup();
    let created = f
        .ledger
        .create_transaction(
            trade("SBER", TransactionSide::Buy, dec!(1), dec!(100), at(1, 10)),
            vec![],
        )
        .await
        .unwrap()
        .transaction
        .unwrap();

    f.ledger.delete_transaction(created.id).await.unwrap();
    assert!(f.positions.get_position(&key("SBER")).unwrap().is_none());

    let err = f.ledger.delete_transaction(created.id).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        f.ledger.get_transaction(created.id),
        Err(Error::Ledger(LedgerError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_list_filters_and_order() {
    let f = setup();
    use TransactionSide::{Buy, Sell};

    for (ticker, side, date) in [
        ("SBER", Buy, at(1, 10)),
        ("SBER", Sell, at(3, 23)),
        ("GAZP", Buy, at(3, 12)),
        ("SBER", Buy, at(4, 0)),
    ] {
        f.ledger
            .create_transaction(trade(ticker, side, dec!(1), dec!(10), date), vec![])
            .await
            .unwrap();
    }

    let all = f.ledger.list_transactions(&TransactionFilter::default()).unwrap();
    let dates: Vec<NaiveDateTime> = all.iter().map(|t| t.trade_date).collect();
    assert_eq!(dates, vec![at(4, 0), at(3, 23), at(3, 12), at(1, 10)]);

    let filter = TransactionFilter {
        ticker: Some(" sber".to_string()),
        date_from: NaiveDate::from_ymd_opt(2024, 3, 2),
        date_to: NaiveDate::from_ymd_opt(2024, 3, 3),
        ..Default::default()
    };
    let sber = f.ledger.list_transactions(&filter).unwrap();
    assert_eq!(sber.len(), 1);
    assert_eq!(sber[0].side, Sell);

    let buys = f
        .ledger
        .list_transactions(&TransactionFilter {
            side: Some(Buy),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(buys.len(), 3);

    let keys = f.ledger.list_instrument_keys().unwrap();
    assert_eq!(keys, vec![key("GAZP"), key("SBER")]);
}

#[tokio::test]
async fn test_references_are_merged_into_instruments() {
    let f = setup();
    let mut bond = trade("RU000A0JX0J2", TransactionSide::Buy, dec!(2), dec!(950), at(1, 10));
    bond.instrument_kind = InstrumentKind::Bond;

    let reference = InstrumentReference {
        ticker: "RU000A0JX0J2".to_string(),
        kind: InstrumentKind::Bond,
        name: None,
        face_value: Some(dec!(1000)),
        face_currency: Some("USD".to_string()),
        lot_size: Some(1),
    };
    f.ledger.create_transaction(bond, vec![reference]).await.unwrap();

    let instrument = f.instruments.get_instrument("RU000A0JX0J2").unwrap().unwrap();
    assert_eq!(instrument.kind, InstrumentKind::Bond);
    assert_eq!(instrument.face_value, Some(dec!(1000)));
    assert_eq!(instrument.face_currency.as_deref(), Some("USD"));
    // The name came from the trade; an empty reference field does not erase it.
    assert_eq!(instrument.name.as_deref(), Some("RU000A0JX0J2 PAO"));
    assert!(!instrument.needs_reference());
}

#[tokio::test]
async fn test_failed_job_rolls_back_writes() {
    let f = setup();
    let pool = Arc::clone(&f.pool);

    let result: moexfolio_core::Result<()> = f
        .writer
        .exec(|conn| {
            diesel::sql_query(
                "INSERT INTO transactions (account_id, ticker, side, unit_price, quantity, total, \
                 instrument_kind, trade_date, created_at, updated_at) \
                 VALUES ('default', 'SBER', 'BUY', '1', '1', '1', 'EQUITY', \
                 '2024-03-01 10:00:00', '2024-03-01 10:00:00', '2024-03-01 10:00:00')",
            )
            .execute(conn)
            .map_err(|e| Error::Database(DatabaseError::QueryFailed(e.to_string())))?;
            Err(DatabaseError::QueryFailed("disk I/O error".to_string()).into())
        })
        .await;
    assert!(result.is_err());

    let mut conn = get_connection(&pool).unwrap();
    let count: i64 = transactions_dsl::transactions
        .count()
        .get_result(&mut conn)
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_recalculate_is_idempotent() {
    let f = setup();
    f.ledger
        .create_transaction(
            trade("SBER", TransactionSide::Buy, dec!(3), dec!(101.5), at(1, 10)),
            vec![],
        )
        .await
        .unwrap();

    let first = f.ledger.recalculate_position(key("SBER"), vec![]).await.unwrap();
    let second = f.ledger.recalculate_position(key("SBER"), vec![]).await.unwrap();

    let (first, second) = (first.position.unwrap(), second.position.unwrap());
    assert_eq!(first.quantity, second.quantity);
    assert_eq!(first.average_cost, second.average_cost);
    assert_eq!(first.total_cost_basis, second.total_cost_basis);
    assert_eq!(first.created_at, second.created_at);
}
