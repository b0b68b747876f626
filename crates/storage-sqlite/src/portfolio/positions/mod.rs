//! SQLite storage implementation for derived positions.

mod model;
mod repository;

pub use model::PositionDB;
pub use repository::PositionRepository;

pub(crate) use repository::{apply_position_change, load_position};
