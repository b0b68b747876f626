use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One currency from the CBR daily table, normalised to a single unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CbrRate {
    pub code: String,
    /// Roubles per one unit of `code`.
    pub rate: Decimal,
    /// Roubles per one unit on the previous publication date.
    pub previous: Option<Decimal>,
}

/// The full daily table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CbrRates {
    pub published_at: Option<DateTime<FixedOffset>>,
    pub rates: HashMap<String, CbrRate>,
}
