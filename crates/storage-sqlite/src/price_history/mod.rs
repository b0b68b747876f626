//! SQLite storage implementation for logged prices.

mod model;
mod repository;

pub use model::{NewPriceSampleDB, PriceSampleDB};
pub use repository::PriceHistoryRepository;
