//! Positions module - derived holdings and their recalculation.

mod positions_model;
mod positions_traits;
mod recalculator;

pub use positions_model::{Position, PositionChange};
pub use positions_traits::PositionRepositoryTrait;
pub use recalculator::recalculate_position;
