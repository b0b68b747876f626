use super::positions_model::Position;
use crate::errors::Result;
use crate::ledger::InstrumentKey;

/// Read access to stored positions. Writes go through the ledger repository.
pub trait PositionRepositoryTrait: Send + Sync {
    fn get_position(&self, key: &InstrumentKey) -> Result<Option<Position>>;

    /// All positions, or only those of `account_id`.
    fn list_positions(&self, account_id: Option<&str>) -> Result<Vec<Position>>;
}
