use std::sync::Arc;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::debug;

use super::model::InstrumentDB;
use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::schema::instruments::dsl as instruments_dsl;
use moexfolio_core::instruments::{
    Instrument, InstrumentKind, InstrumentReference, InstrumentRepositoryTrait,
};
use moexfolio_core::Result;

/// Read side of the instrument cache. Rows are written by the ledger
/// repository inside its recalculation transactions.
pub struct InstrumentRepository {
    pool: Arc<DbPool>,
}

impl InstrumentRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl InstrumentRepositoryTrait for InstrumentRepository {
    fn get_instrument(&self, ticker: &str) -> Result<Option<Instrument>> {
        let mut conn = get_connection(&self.pool)?;
        instruments_dsl::instruments
            .find(ticker)
            .select(InstrumentDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?
            .map(Instrument::try_from)
            .transpose()
    }

    fn list_instruments(&self) -> Result<Vec<Instrument>> {
        let mut conn = get_connection(&self.pool)?;
        instruments_dsl::instruments
            .order(instruments_dsl::ticker.asc())
            .select(InstrumentDB::as_select())
            .load(&mut conn)
            .into_core()?
            .into_iter()
            .map(Instrument::try_from)
            .collect()
    }
}

/// Makes sure a row exists for a traded ticker and carries its current kind.
///
/// A kind change invalidates the cached face data, which only means
/// something for bonds.
pub(crate) fn ensure_instrument(
    conn: &mut SqliteConnection,
    ticker: &str,
    kind: InstrumentKind,
    name: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let existing = instruments_dsl::instruments
        .find(ticker)
        .select(InstrumentDB::as_select())
        .first(conn)
        .optional()
        .into_core()?;

    match existing {
        None => {
            let row = InstrumentDB {
                ticker: ticker.to_string(),
                kind: kind.as_str().to_string(),
                name: name.map(str::to_string),
                face_value: None,
                face_currency: None,
                lot_size: None,
                updated_at: now,
            };
            diesel::insert_into(instruments_dsl::instruments)
                .values(&row)
                .execute(conn)
                .into_core()?;
        }
        Some(row) if row.kind != kind.as_str() => {
            debug!("Instrument {} changed kind {} -> {}", ticker, row.kind, kind);
            diesel::update(instruments_dsl::instruments.find(ticker))
                .set((
                    instruments_dsl::kind.eq(kind.as_str()),
                    instruments_dsl::face_value.eq(None::<String>),
                    instruments_dsl::face_currency.eq(None::<String>),
                    instruments_dsl::updated_at.eq(now),
                ))
                .execute(conn)
                .into_core()?;
        }
        Some(_) => {}
    }
    Ok(())
}

/// Writes discovered reference data, keeping cached fields the reference
/// leaves empty.
pub(crate) fn upsert_reference(
    conn: &mut SqliteConnection,
    reference: &InstrumentReference,
    now: NaiveDateTime,
) -> Result<()> {
    let existing = instruments_dsl::instruments
        .find(&reference.ticker)
        .select(InstrumentDB::as_select())
        .first(conn)
        .optional()
        .into_core()?;

    let row = match existing {
        Some(row) => row.merge(reference, now),
        None => InstrumentDB::from_reference(reference, now),
    };
    diesel::replace_into(instruments_dsl::instruments)
        .values(&row)
        .execute(conn)
        .into_core()?;
    Ok(())
}
