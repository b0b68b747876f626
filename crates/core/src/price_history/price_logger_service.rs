use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::time::timeout;

use super::price_history_model::{LogPricesResult, NewPriceSample, PriceSample};
use super::price_history_traits::{PriceHistoryRepositoryTrait, PriceLoggerServiceTrait};
use crate::constants::PRICE_HISTORY_TICKERS_PER_DAY;
use crate::errors::{Result, ValidationError};
use crate::instruments::InstrumentKind;
use crate::ledger::normalize_ticker;
use crate::portfolio::positions::PositionRepositoryTrait;
use crate::quotes::QuoteProviderTrait;
use crate::utils::time_utils::{valuation_date_from_utc, DEFAULT_VALUATION_TZ};

/// Snapshots market prices of everything held. Scheduling is up to the caller.
pub struct PriceLoggerService {
    position_repository: Arc<dyn PositionRepositoryTrait>,
    price_history_repository: Arc<dyn PriceHistoryRepositoryTrait>,
    quote_provider: Arc<dyn QuoteProviderTrait>,
    lookup_timeout: Duration,
}

impl PriceLoggerService {
    pub fn new(
        position_repository: Arc<dyn PositionRepositoryTrait>,
        price_history_repository: Arc<dyn PriceHistoryRepositoryTrait>,
        quote_provider: Arc<dyn QuoteProviderTrait>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            position_repository,
            price_history_repository,
            quote_provider,
            lookup_timeout,
        }
    }

    fn validate_days(days: i64) -> Result<i64> {
        if days <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "days must be positive, got {}",
                days
            ))
            .into());
        }
        Ok(days)
    }

    async fn sample_for(
        &self,
        ticker: String,
        kind: InstrumentKind,
        company_name: Option<String>,
    ) -> Option<NewPriceSample> {
        let quote = match timeout(self.lookup_timeout, self.quote_provider.get_price(&ticker, kind))
            .await
        {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                warn!("No price for {}, not logged", ticker);
                return None;
            }
            Err(_) => {
                warn!("Price lookup for {} timed out, not logged", ticker);
                return None;
            }
        };

        debug!("Logging {} at {}", ticker, quote.price);
        Some(NewPriceSample {
            ticker,
            company_name,
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            logged_at: Utc::now(),
        })
    }
}

#[async_trait]
impl PriceLoggerServiceTrait for PriceLoggerService {
    async fn log_all_prices(&self) -> Result<LogPricesResult> {
        let positions = self.position_repository.list_positions(None)?;

        // One sample per ticker even when several accounts hold it.
        let mut tickers: HashMap<String, (InstrumentKind, Option<String>)> = HashMap::new();
        for position in positions {
            tickers
                .entry(position.ticker)
                .or_insert((position.instrument_kind, position.name));
        }

        if tickers.is_empty() {
            info!("Portfolio is empty, nothing to log");
            return Ok(LogPricesResult::default());
        }

        let total = tickers.len();
        let samples: Vec<NewPriceSample> = join_all(
            tickers
                .into_iter()
                .map(|(ticker, (kind, name))| self.sample_for(ticker, kind, name)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        let logged = if samples.is_empty() {
            0
        } else {
            self.price_history_repository.insert_samples(samples).await?
        };

        info!("Logged prices: {}/{}", logged, total);
        Ok(LogPricesResult { logged, total })
    }

    fn get_price_history(&self, ticker: Option<&str>, days: i64) -> Result<Vec<PriceSample>> {
        let days = Self::validate_days(days)?;
        match ticker.map(normalize_ticker).filter(|t| !t.is_empty()) {
            Some(ticker) => self
                .price_history_repository
                .list_recent(Some(&ticker), days),
            None => self
                .price_history_repository
                .list_recent(None, days.saturating_mul(PRICE_HISTORY_TICKERS_PER_DAY)),
        }
    }

    fn get_price_history_grouped(
        &self,
        days: i64,
    ) -> Result<BTreeMap<NaiveDate, Vec<PriceSample>>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<PriceSample>> = BTreeMap::new();
        for sample in self.get_price_history(None, days)? {
            let day = valuation_date_from_utc(sample.logged_at, DEFAULT_VALUATION_TZ);
            grouped.entry(day).or_default().push(sample);
        }
        Ok(grouped)
    }
}
