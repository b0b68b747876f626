use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),
}
