//! Database model for instruments.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::utils::{decimal_to_text, parse_optional_decimal};
use moexfolio_core::instruments::{Instrument, InstrumentReference};
use moexfolio_core::Result;

#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::instruments)]
#[diesel(primary_key(ticker))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstrumentDB {
    pub ticker: String,
    pub kind: String,
    pub name: Option<String>,
    pub face_value: Option<String>,
    pub face_currency: Option<String>,
    pub lot_size: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl InstrumentDB {
    /// Overlays the fields the reference knows onto this row.
    pub fn merge(mut self, reference: &InstrumentReference, now: NaiveDateTime) -> Self {
        self.kind = reference.kind.as_str().to_string();
        if reference.name.is_some() {
            self.name = reference.name.clone();
        }
        if let Some(face_value) = reference.face_value {
            self.face_value = Some(decimal_to_text(face_value));
        }
        if reference.face_currency.is_some() {
            self.face_currency = reference.face_currency.clone();
        }
        if reference.lot_size.is_some() {
            self.lot_size = reference.lot_size;
        }
        self.updated_at = now;
        self
    }

    pub fn from_reference(reference: &InstrumentReference, now: NaiveDateTime) -> Self {
        Self {
            ticker: reference.ticker.clone(),
            kind: reference.kind.as_str().to_string(),
            name: reference.name.clone(),
            face_value: reference.face_value.map(decimal_to_text),
            face_currency: reference.face_currency.clone(),
            lot_size: reference.lot_size,
            updated_at: now,
        }
    }
}

impl TryFrom<InstrumentDB> for Instrument {
    type Error = moexfolio_core::Error;

    fn try_from(db: InstrumentDB) -> Result<Self> {
        Ok(Self {
            face_value: parse_optional_decimal(db.face_value.as_deref(), "instruments.face_value")?,
            kind: db.kind.parse()?,
            ticker: db.ticker,
            name: db.name,
            face_currency: db.face_currency,
            lot_size: db.lot_size,
        })
    }
}
