//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while talking to the exchange or the rate feed.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol is not traded on the requested board.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but the board returned no usable price.
    #[error("No price available for {0}")]
    NoPrice(String),

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider answered with something we could not use.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The payload did not have the expected shape.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
