use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Deserialize;

/// `daily_json.js` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DailyResponse {
    #[serde(default)]
    pub date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub valute: HashMap<String, Valute>,
}

/// One currency row. `value` roubles buy `nominal` units of the currency.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Valute {
    #[serde(default)]
    pub char_code: Option<String>,
    #[serde(default)]
    pub nominal: Option<Decimal>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub previous: Option<Decimal>,
}
