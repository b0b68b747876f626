use async_trait::async_trait;

use super::valuation_model::PortfolioValuation;
use crate::errors::Result;

#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Values every position, optionally restricted to one account.
    ///
    /// `lookback_days` picks the period the change columns are measured over;
    /// `None` means "since yesterday's close".
    async fn get_portfolio_valuation(
        &self,
        account_id: Option<&str>,
        lookback_days: Option<i64>,
    ) -> Result<PortfolioValuation>;
}
