use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISS market a security trades on.
///
/// Bond prices on the bond market are quoted as a percentage of face value,
/// share prices are absolute prices in the trading currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Board {
    Shares,
    Bonds,
}

impl Board {
    /// Path segment under `/engines/stock/markets/`.
    pub fn market(&self) -> &'static str {
        match self {
            Board::Shares => "shares",
            Board::Bonds => "bonds",
        }
    }
}

/// Latest market snapshot for one security.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoexQuote {
    pub ticker: String,
    pub board: Board,
    /// Last trade price (shares) or percent of face value (bonds).
    pub price: Decimal,
    /// Absolute change against the previous close, rounded to 2 places.
    pub change: Decimal,
    /// Percent change, rounded to 2 places.
    pub change_percent: Decimal,
    /// Traded value for the day.
    pub volume: i64,
    /// Nominal value (bonds only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_value: Option<Decimal>,
    /// Currency of the nominal, with `SUR` already mapped to `RUB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<i32>,
    pub as_of: DateTime<Utc>,
}

/// Descriptive data for a security.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoexSecurity {
    pub ticker: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<i32>,
}
