//! Instruments module - reference data for tickers.

mod instruments_model;
mod instruments_traits;

pub use instruments_model::{Instrument, InstrumentKind, InstrumentReference};
pub use instruments_traits::InstrumentRepositoryTrait;
