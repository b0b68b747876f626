use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rate of one currency against the rouble, as published by the central bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub code: String,
    /// Roubles per one unit.
    pub rate_to_rub: Decimal,
    /// Roubles per one unit at the previous publication.
    pub previous_to_rub: Option<Decimal>,
}

/// A full publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub published_at: Option<DateTime<FixedOffset>>,
    pub rates: Vec<ExchangeRate>,
}

/// Current rate of a currency in home-currency units and its move since the
/// previous publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateInfo {
    pub code: String,
    pub rate: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}
