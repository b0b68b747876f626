use super::instruments_model::Instrument;
use crate::errors::Result;

/// Read access to cached instrument reference data.
///
/// Writes happen inside the ledger repository's recalculation transaction.
pub trait InstrumentRepositoryTrait: Send + Sync {
    fn get_instrument(&self, ticker: &str) -> Result<Option<Instrument>>;
    fn list_instruments(&self) -> Result<Vec<Instrument>>;
}
