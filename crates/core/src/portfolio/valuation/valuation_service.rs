use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;
use tokio::time::timeout;

use super::valuation_calculator::{
    aggregate, latest_sample, select_reference_sample, value_position, PriceInputs,
};
use super::valuation_model::{
    PortfolioValuation, PositionValuation, PriceSource, ValuationSettings,
};
use super::valuation_traits::ValuationServiceTrait;
use crate::errors::Result;
use crate::fx::{normalize_currency_code, CurrencyConverterTrait};
use crate::instruments::{Instrument, InstrumentRepositoryTrait};
use crate::portfolio::positions::{Position, PositionRepositoryTrait};
use crate::price_history::{PriceHistoryRepositoryTrait, PriceSample};
use crate::quotes::{LiveQuote, QuoteProviderTrait, ReferenceData};
use crate::utils::time_utils::DEFAULT_VALUATION_TZ;

#[derive(Clone)]
pub struct ValuationService {
    position_repository: Arc<dyn PositionRepositoryTrait>,
    instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
    price_history_repository: Arc<dyn PriceHistoryRepositoryTrait>,
    quote_provider: Arc<dyn QuoteProviderTrait>,
    currency_converter: Arc<dyn CurrencyConverterTrait>,
    settings: ValuationSettings,
}

impl ValuationService {
    pub fn new(
        position_repository: Arc<dyn PositionRepositoryTrait>,
        instrument_repository: Arc<dyn InstrumentRepositoryTrait>,
        price_history_repository: Arc<dyn PriceHistoryRepositoryTrait>,
        quote_provider: Arc<dyn QuoteProviderTrait>,
        currency_converter: Arc<dyn CurrencyConverterTrait>,
        settings: ValuationSettings,
    ) -> Self {
        Self {
            position_repository,
            instrument_repository,
            price_history_repository,
            quote_provider,
            currency_converter,
            settings,
        }
    }

    pub(crate) async fn valuation_at(
        &self,
        account_id: Option<&str>,
        lookback_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<PortfolioValuation> {
        let positions = self.position_repository.list_positions(account_id)?;
        debug!("Valuing {} positions", positions.len());

        let rows: Vec<PositionValuation> = join_all(
            positions
                .iter()
                .map(|position| self.value_one(position, lookback_days, now)),
        )
        .await;

        let summary = aggregate(&rows);
        Ok(PortfolioValuation {
            home_currency: self.settings.home_currency.clone(),
            positions: rows,
            summary,
            valued_at: now,
        })
    }

    async fn value_one(
        &self,
        position: &Position,
        lookback_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> PositionValuation {
        let ticker = position.ticker.as_str();
        let kind = position.instrument_kind;

        let instrument = match self.instrument_repository.get_instrument(ticker) {
            Ok(instrument) => instrument,
            Err(e) => {
                warn!("Failed to read instrument {}: {}", ticker, e);
                None
            }
        };
        let wants_reference = kind.is_bond()
            && instrument
                .as_ref()
                .map_or(true, |i| i.kind != kind || i.needs_reference());

        let (quote, reference) = tokio::join!(
            self.lookup_quote(ticker, position),
            self.lookup_reference(ticker, position, wants_reference)
        );

        let samples = match self.price_history_repository.get_samples(ticker) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Failed to read price history for {}: {}", ticker, e);
                Vec::new()
            }
        };

        let (face_value, face_currency) =
            self.face_terms(quote.as_ref(), instrument.as_ref(), reference.as_ref());
        let fx_rate = if kind.is_bond() {
            self.currency_converter.rate_to_home(&face_currency).await
        } else {
            Decimal::ONE
        };

        let inputs = self.price_inputs(
            position,
            quote,
            &samples,
            lookback_days,
            now,
            face_value,
            face_currency,
            fx_rate,
        );
        value_position(position, &inputs)
    }

    async fn lookup_quote(&self, ticker: &str, position: &Position) -> Option<LiveQuote> {
        match timeout(
            self.settings.lookup_timeout,
            self.quote_provider.get_price(ticker, position.instrument_kind),
        )
        .await
        {
            Ok(quote) => quote,
            Err(_) => {
                warn!("Quote lookup for {} timed out", ticker);
                None
            }
        }
    }

    async fn lookup_reference(
        &self,
        ticker: &str,
        position: &Position,
        wanted: bool,
    ) -> Option<ReferenceData> {
        if !wanted {
            return None;
        }
        match timeout(
            self.settings.lookup_timeout,
            self.quote_provider
                .get_reference(ticker, position.instrument_kind),
        )
        .await
        {
            Ok(reference) => reference,
            Err(_) => {
                warn!("Reference lookup for {} timed out", ticker);
                None
            }
        }
    }

    /// Face value and currency, most specific source first.
    fn face_terms(
        &self,
        quote: Option<&LiveQuote>,
        instrument: Option<&Instrument>,
        reference: Option<&ReferenceData>,
    ) -> (Decimal, String) {
        let positive = |v: &Decimal| *v > Decimal::ZERO;
        let face_value = quote
            .and_then(|q| q.face_value)
            .filter(positive)
            .or_else(|| instrument.and_then(|i| i.face_value).filter(positive))
            .or_else(|| reference.and_then(|r| r.face_value).filter(positive))
            .unwrap_or(self.settings.default_face_value);
        let known = |c: &String| !c.trim().is_empty();
        let face_currency = quote
            .and_then(|q| q.face_currency.clone())
            .filter(known)
            .or_else(|| instrument.and_then(|i| i.face_currency.clone()).filter(known))
            .or_else(|| reference.and_then(|r| r.face_currency.clone()).filter(known))
            .map(|c| normalize_currency_code(&c))
            .unwrap_or_else(|| self.settings.home_currency.clone());
        (face_value, face_currency)
    }

    #[allow(clippy::too_many_arguments)]
    fn price_inputs(
        &self,
        position: &Position,
        quote: Option<LiveQuote>,
        samples: &[PriceSample],
        lookback_days: Option<i64>,
        now: DateTime<Utc>,
        face_value: Decimal,
        face_currency: String,
        fx_rate: Decimal,
    ) -> PriceInputs {
        let (price, source, as_of) = match (quote, latest_sample(samples)) {
            (Some(quote), _) => (quote.price, PriceSource::Live, Some(quote.as_of)),
            (None, Some(sample)) => {
                debug!(
                    "No live quote for {}, using sample from {}",
                    position.ticker, sample.logged_at
                );
                (sample.price, PriceSource::Cached, Some(sample.logged_at))
            }
            (None, None) => {
                warn!(
                    "No market data for {}, valuing at average cost",
                    position.ticker
                );
                (position.average_cost, PriceSource::CostBasis, None)
            }
        };

        let reference_price = match source {
            PriceSource::CostBasis => price,
            PriceSource::Live | PriceSource::Cached => {
                select_reference_sample(samples, now, lookback_days, DEFAULT_VALUATION_TZ)
                    .map_or(price, |sample| sample.price)
            }
        };

        PriceInputs {
            price,
            source,
            as_of,
            reference_price,
            face_value,
            face_currency,
            fx_rate,
        }
    }
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn get_portfolio_valuation(
        &self,
        account_id: Option<&str>,
        lookback_days: Option<i64>,
    ) -> Result<PortfolioValuation> {
        self.valuation_at(account_id, lookback_days, Utc::now()).await
    }
}
