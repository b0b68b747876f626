//! Central bank rate source - facade for the market-data CBR client.

use async_trait::async_trait;

use moexfolio_market_data::{CbrRates, CbrRatesClient};

use crate::errors::Result;
use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::{ExchangeRate, RateTable};
use crate::fx::fx_traits::RateSourceTrait;

impl From<CbrRates> for RateTable {
    fn from(rates: CbrRates) -> Self {
        let mut rates_vec: Vec<ExchangeRate> = rates
            .rates
            .into_values()
            .map(|rate| ExchangeRate {
                code: rate.code,
                rate_to_rub: rate.rate,
                previous_to_rub: rate.previous,
            })
            .collect();
        rates_vec.sort_by(|a, b| a.code.cmp(&b.code));

        RateTable {
            published_at: rates.published_at,
            rates: rates_vec,
        }
    }
}

pub struct CbrRateSource {
    client: CbrRatesClient,
}

impl CbrRateSource {
    pub fn new(client: CbrRatesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateSourceTrait for CbrRateSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        let rates = self
            .client
            .fetch_daily()
            .await
            .map_err(|e| FxError::SourceUnavailable(e.to_string()))?;
        Ok(rates.into())
    }
}
