use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::price_history_model::{LogPricesResult, NewPriceSample, PriceSample};
use crate::errors::Result;

#[async_trait]
pub trait PriceHistoryRepositoryTrait: Send + Sync {
    /// Every sample of `ticker`, oldest first.
    fn get_samples(&self, ticker: &str) -> Result<Vec<PriceSample>>;

    /// Newest first, at most `limit` rows.
    fn list_recent(&self, ticker: Option<&str>, limit: i64) -> Result<Vec<PriceSample>>;

    async fn insert_samples(&self, samples: Vec<NewPriceSample>) -> Result<usize>;
}

#[async_trait]
pub trait PriceLoggerServiceTrait: Send + Sync {
    /// Records the current price of every held ticker.
    async fn log_all_prices(&self) -> Result<LogPricesResult>;

    /// Newest first: `days` rows for one ticker, `days * 50` rows overall.
    fn get_price_history(&self, ticker: Option<&str>, days: i64) -> Result<Vec<PriceSample>>;

    /// The unfiltered history keyed by valuation date.
    fn get_price_history_grouped(&self, days: i64)
        -> Result<BTreeMap<NaiveDate, Vec<PriceSample>>>;
}
