use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Recalculation failed for {ticker} in account {account_id}: {message}")]
    RecalculationFailed {
        account_id: String,
        ticker: String,
        message: String,
    },
}
