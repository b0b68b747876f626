//! Quote-related error types.

use thiserror::Error;

use moexfolio_market_data::errors::MarketDataError as ExternalMarketDataError;

/// Errors that can occur during quote lookups.
///
/// Bridges the market-data crate's provider errors into the core domain.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No data found for {0}")]
    NoData(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl From<ExternalMarketDataError> for MarketDataError {
    fn from(err: ExternalMarketDataError) -> Self {
        match err {
            ExternalMarketDataError::SymbolNotFound(ticker) => MarketDataError::NotFound(ticker),
            ExternalMarketDataError::NoPrice(ticker) => MarketDataError::NoData(ticker),
            ExternalMarketDataError::Timeout { provider } => MarketDataError::Timeout(provider),
            other => MarketDataError::ProviderError(other.to_string()),
        }
    }
}
