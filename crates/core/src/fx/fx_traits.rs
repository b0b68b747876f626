use async_trait::async_trait;
use rust_decimal::Decimal;

use super::fx_model::{RateInfo, RateTable};
use crate::errors::Result;

/// Conversion into the home currency.
#[async_trait]
pub trait CurrencyConverterTrait: Send + Sync {
    /// Home-currency units per one unit of `code`. `1` for the home currency
    /// itself and for codes no rate is known for.
    async fn rate_to_home(&self, code: &str) -> Decimal;
}

/// Where published rates come from.
#[async_trait]
pub trait RateSourceTrait: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable>;
}

#[async_trait]
pub trait FxServiceTrait: CurrencyConverterTrait {
    /// Rate and daily change for `codes`, or every known currency when `None`.
    async fn rates_info(&self, codes: Option<&[String]>) -> Result<Vec<RateInfo>>;
}
