//! MOEX quote provider - facade for the market-data crate.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Core Domain Layer                       │
//! │                                                              │
//! │  (ticker, InstrumentKind) ──▶ MoexQuoteProvider ──▶ LiveQuote │
//! │                                  │          ▲                │
//! │                        Board ────┘          │ convert        │
//! │                                  ▼          │                │
//! │                          MoexIssClient ─▶ MoexQuote          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use log::{debug, warn};

use moexfolio_market_data::{Board, MoexIssClient, MoexQuote, MoexSecurity};

use crate::instruments::InstrumentKind;
use crate::quotes::quotes_errors::MarketDataError;
use crate::quotes::quotes_model::{LiveQuote, ReferenceData, SecurityInfo};
use crate::quotes::quotes_traits::QuoteProviderTrait;

fn board_for(kind: InstrumentKind) -> Board {
    match kind {
        InstrumentKind::Equity => Board::Shares,
        InstrumentKind::Bond => Board::Bonds,
    }
}

impl From<MoexQuote> for LiveQuote {
    fn from(quote: MoexQuote) -> Self {
        LiveQuote {
            ticker: quote.ticker,
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            as_of: quote.as_of,
            face_value: quote.face_value,
            face_currency: quote.face_currency,
        }
    }
}

impl From<MoexSecurity> for ReferenceData {
    fn from(security: MoexSecurity) -> Self {
        ReferenceData {
            name: security.short_name.or(security.name),
            face_value: security.face_value,
            face_currency: security.face_currency,
            lot_size: security.lot_size,
        }
    }
}

/// Quote provider backed by the Moscow Exchange ISS API.
pub struct MoexQuoteProvider {
    client: MoexIssClient,
}

impl MoexQuoteProvider {
    pub fn new(client: MoexIssClient) -> Self {
        Self { client }
    }

    pub async fn fetch_quote(
        &self,
        ticker: &str,
        kind: InstrumentKind,
    ) -> Result<LiveQuote, MarketDataError> {
        let quote = self.client.get_quote(ticker, board_for(kind)).await?;
        Ok(quote.into())
    }

    pub async fn fetch_security(
        &self,
        ticker: &str,
        board: Board,
    ) -> Result<MoexSecurity, MarketDataError> {
        Ok(self.client.get_security(ticker, board).await?)
    }
}

#[async_trait]
impl QuoteProviderTrait for MoexQuoteProvider {
    async fn get_price(&self, ticker: &str, kind: InstrumentKind) -> Option<LiveQuote> {
        match self.fetch_quote(ticker, kind).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("No quote for {} ({}): {}", ticker, kind, e);
                None
            }
        }
    }

    async fn get_reference(&self, ticker: &str, kind: InstrumentKind) -> Option<ReferenceData> {
        match self.fetch_security(ticker, board_for(kind)).await {
            Ok(security) => Some(security.into()),
            Err(e) => {
                warn!("No reference data for {} ({}): {}", ticker, kind, e);
                None
            }
        }
    }

    /// Tries the shares board first, then bonds.
    async fn get_security_info(&self, ticker: &str) -> Option<SecurityInfo> {
        for board in [Board::Shares, Board::Bonds] {
            match self.fetch_security(ticker, board).await {
                Ok(security) => {
                    return Some(SecurityInfo {
                        ticker: security.ticker,
                        name: security.name,
                        short_name: security.short_name,
                    })
                }
                Err(MarketDataError::NotFound(_)) => {
                    debug!("{} not listed on the {} board", ticker, board.market());
                }
                Err(e) => {
                    warn!("Security lookup for {} failed: {}", ticker, e);
                    return None;
                }
            }
        }
        None
    }
}
