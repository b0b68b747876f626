use std::sync::Arc;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::model::PositionDB;
use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::schema::positions::dsl as positions_dsl;
use moexfolio_core::ledger::InstrumentKey;
use moexfolio_core::portfolio::positions::{Position, PositionChange, PositionRepositoryTrait};
use moexfolio_core::Result;

/// Read side of the position cache.
pub struct PositionRepository {
    pool: Arc<DbPool>,
}

impl PositionRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl PositionRepositoryTrait for PositionRepository {
    fn get_position(&self, key: &InstrumentKey) -> Result<Option<Position>> {
        let mut conn = get_connection(&self.pool)?;
        load_position(&mut conn, key)
    }

    fn list_positions(&self, account_id: Option<&str>) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = positions_dsl::positions.into_boxed();
        if let Some(account_id) = account_id {
            query = query.filter(positions_dsl::account_id.eq(account_id));
        }
        query
            .order((positions_dsl::account_id.asc(), positions_dsl::ticker.asc()))
            .select(PositionDB::as_select())
            .load(&mut conn)
            .into_core()?
            .into_iter()
            .map(Position::try_from)
            .collect()
    }
}

pub(crate) fn load_position(
    conn: &mut SqliteConnection,
    key: &InstrumentKey,
) -> Result<Option<Position>> {
    positions_dsl::positions
        .find((&key.account_id, &key.ticker))
        .select(PositionDB::as_select())
        .first(conn)
        .optional()
        .into_core()?
        .map(Position::try_from)
        .transpose()
}

pub(crate) fn apply_position_change(
    conn: &mut SqliteConnection,
    key: &InstrumentKey,
    change: PositionChange,
) -> Result<Option<Position>> {
    match change {
        PositionChange::Delete => {
            diesel::delete(positions_dsl::positions.find((&key.account_id, &key.ticker)))
                .execute(conn)
                .into_core()?;
            Ok(None)
        }
        PositionChange::Upsert(position) => {
            diesel::replace_into(positions_dsl::positions)
                .values(PositionDB::from(&position))
                .execute(conn)
                .into_core()?;
            Ok(Some(position))
        }
    }
}
