//! Database model for positions.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::utils::{decimal_to_text, parse_decimal};
use moexfolio_core::portfolio::positions::Position;
use moexfolio_core::Result;

#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(primary_key(account_id, ticker))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub account_id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub instrument_kind: String,
    pub quantity: String,
    pub average_cost: String,
    pub total_cost_basis: String,
    pub open_quantity: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub realized_pnl: String,
}

impl From<&Position> for PositionDB {
    fn from(position: &Position) -> Self {
        Self {
            account_id: position.account_id.clone(),
            ticker: position.ticker.clone(),
            name: position.name.clone(),
            instrument_kind: position.instrument_kind.as_str().to_string(),
            quantity: decimal_to_text(position.quantity),
            average_cost: decimal_to_text(position.average_cost),
            total_cost_basis: decimal_to_text(position.total_cost_basis),
            open_quantity: decimal_to_text(position.open_quantity),
            created_at: position.created_at,
            updated_at: position.updated_at,
            realized_pnl: decimal_to_text(position.realized_pnl),
        }
    }
}

impl TryFrom<PositionDB> for Position {
    type Error = moexfolio_core::Error;

    fn try_from(db: PositionDB) -> Result<Self> {
        Ok(Self {
            instrument_kind: db.instrument_kind.parse()?,
            quantity: parse_decimal(&db.quantity, "positions.quantity")?,
            average_cost: parse_decimal(&db.average_cost, "positions.average_cost")?,
            total_cost_basis: parse_decimal(&db.total_cost_basis, "positions.total_cost_basis")?,
            open_quantity: parse_decimal(&db.open_quantity, "positions.open_quantity")?,
            realized_pnl: parse_decimal(&db.realized_pnl, "positions.realized_pnl")?,
            account_id: db.account_id,
            ticker: db.ticker,
            name: db.name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
