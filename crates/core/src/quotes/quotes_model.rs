use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current market data for a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuote {
    pub ticker: String,
    /// Absolute price for equities, percent of face value for bonds.
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: i64,
    pub as_of: DateTime<Utc>,
    pub face_value: Option<Decimal>,
    pub face_currency: Option<String>,
}

/// Slow-changing instrument data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub name: Option<String>,
    pub face_value: Option<Decimal>,
    pub face_currency: Option<String>,
    pub lot_size: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityInfo {
    pub ticker: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

impl SecurityInfo {
    /// Short exchange name when present, otherwise the full name.
    pub fn display_name(&self) -> Option<&str> {
        self.short_name.as_deref().or(self.name.as_deref())
    }
}

/// Answer to "does this ticker trade on the exchange".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerValidation {
    pub ticker: String,
    pub exists: bool,
    pub company_name: Option<String>,
    pub current_price: Option<Decimal>,
}
