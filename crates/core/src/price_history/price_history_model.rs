use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A logged market price.
///
/// Bonds store the exchange quote as percent of face value; equities store
/// the absolute price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    pub id: i64,
    pub ticker: String,
    pub company_name: Option<String>,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: i64,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceSample {
    pub ticker: String,
    pub company_name: Option<String>,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub volume: i64,
    pub logged_at: DateTime<Utc>,
}

/// Summary of one logging run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPricesResult {
    pub logged: usize,
    pub total: usize,
}
