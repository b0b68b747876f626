use async_trait::async_trait;

use super::quotes_model::{LiveQuote, ReferenceData, SecurityInfo, TickerValidation};
use crate::errors::Result;
use crate::instruments::InstrumentKind;

/// External source of prices and reference data.
///
/// Lookups never fail: an unreachable or unknown ticker is `None` and the
/// caller decides how to degrade.
#[async_trait]
pub trait QuoteProviderTrait: Send + Sync {
    async fn get_price(&self, ticker: &str, kind: InstrumentKind) -> Option<LiveQuote>;
    async fn get_reference(&self, ticker: &str, kind: InstrumentKind) -> Option<ReferenceData>;
    async fn get_security_info(&self, ticker: &str) -> Option<SecurityInfo>;
}

#[async_trait]
pub trait QuoteServiceTrait: Send + Sync {
    async fn get_quote(&self, ticker: &str, kind: InstrumentKind) -> Result<LiveQuote>;
    async fn validate_ticker(&self, ticker: &str) -> Result<TickerValidation>;
}
