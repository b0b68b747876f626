use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::time::timeout;

use crate::errors::{Result, ValidationError};
use crate::instruments::InstrumentKind;
use crate::ledger::normalize_ticker;
use crate::quotes::quotes_errors::MarketDataError;
use crate::quotes::quotes_model::{LiveQuote, TickerValidation};
use crate::quotes::quotes_traits::{QuoteProviderTrait, QuoteServiceTrait};

/// Ad-hoc quote lookups for callers outside the valuation path.
pub struct QuoteService {
    provider: Arc<dyn QuoteProviderTrait>,
    lookup_timeout: Duration,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProviderTrait>, lookup_timeout: Duration) -> Self {
        Self {
            provider,
            lookup_timeout,
        }
    }

    fn normalize(ticker: &str) -> Result<String> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(ValidationError::MissingField("ticker".to_string()).into());
        }
        Ok(ticker)
    }
}

#[async_trait]
impl QuoteServiceTrait for QuoteService {
    async fn get_quote(&self, ticker: &str, kind: InstrumentKind) -> Result<LiveQuote> {
        let ticker = Self::normalize(ticker)?;
        match timeout(self.lookup_timeout, self.provider.get_price(&ticker, kind)).await {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => Err(MarketDataError::NoData(ticker).into()),
            Err(_) => Err(MarketDataError::Timeout(ticker).into()),
        }
    }

    /// A ticker exists when the exchange knows the security. The price is
    /// informational and may be missing outside trading hours.
    async fn validate_ticker(&self, ticker: &str) -> Result<TickerValidation> {
        let ticker = Self::normalize(ticker)?;

        let info = match timeout(self.lookup_timeout, self.provider.get_security_info(&ticker)).await
        {
            Ok(info) => info,
            Err(_) => {
                warn!("Security lookup for {} timed out", ticker);
                None
            }
        };

        let Some(info) = info else {
            debug!("Ticker {} is not listed", ticker);
            return Ok(TickerValidation {
                ticker,
                exists: false,
                company_name: None,
                current_price: None,
            });
        };

        let current_price = timeout(
            self.lookup_timeout,
            self.provider.get_price(&ticker, InstrumentKind::Equity),
        )
        .await
        .ok()
        .flatten()
        .map(|quote| quote.price);

        Ok(TickerValidation {
            company_name: info.display_name().map(str::to_string),
            ticker,
            exists: true,
            current_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotes::{ReferenceData, SecurityInfo};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct StaticProvider;

    #[async_trait]
    impl QuoteProviderTrait for StaticProvider {
        async fn get_price(&self, ticker: &str, _kind: InstrumentKind) -> Option<LiveQuote> {
            (ticker == "SBER").then(|| LiveQuote {
                ticker: ticker.to_string(),
                price: dec!(300),
                change: dec!(1),
                change_percent: dec!(0.33),
                volume: 10,
                as_of: Utc::now(),
                face_value: None,
                face_currency: None,
            })
        }

        async fn get_reference(
            &self,
            _ticker: &str,
            _kind: InstrumentKind,
        ) -> Option<ReferenceData> {
            None
        }

        async fn get_security_info(&self, ticker: &str) -> Option<SecurityInfo> {
            match ticker {
                "SBER" => Some(SecurityInfo {
                    ticker: ticker.to_string(),
                    name: Some("Сбербанк России ПАО ао".to_string()),
                    short_name: Some("Сбербанк".to_string()),
                }),
                "HALT" => Some(SecurityInfo {
                    ticker: ticker.to_string(),
                    name: Some("Halted Corp".to_string()),
                    short_name: None,
                }),
                _ => None,
            }
        }
    }

    fn service() -> QuoteService {
        QuoteService::new(Arc::new(StaticProvider), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_get_quote_normalizes_ticker() {
        let quote = service().get_quote(" sber ", InstrumentKind::Equity).await.unwrap();
        assert_eq!(quote.price, dec!(300));
    }

    #[tokio::test]
    async fn test_get_quote_without_data_is_an_error() {
        let err = service()
            .get_quote("GAZP", InstrumentKind::Equity)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::MarketData(MarketDataError::NoData(ref t)) if t == "GAZP"
        ));
    }

    #[tokio::test]
    async fn test_validate_known_ticker_prefers_short_name() {
        let validation = service().validate_ticker("sber").await.unwrap();
        assert!(validation.exists);
        assert_eq!(validation.company_name.as_deref(), Some("Сбербанк"));
        assert_eq!(validation.current_price, Some(dec!(300)));
    }

    #[tokio::test]
    async fn test_validate_listed_ticker_without_price() {
        let validation = service().validate_ticker("HALT").await.unwrap();
        assert!(validation.exists);
        assert_eq!(validation.company_name.as_deref(), Some("Halted Corp"));
        assert_eq!(validation.current_price, None);
    }

    #[tokio::test]
    async fn test_validate_unknown_ticker() {
        let validation = service().validate_ticker("NOPE").await.unwrap();
        assert!(!validation.exists);
        assert!(service().validate_ticker("  ").await.is_err());
    }
}
