//! Central Bank of Russia daily rates.
//!
//! Uses the `cbr-xml-daily.ru` JSON mirror of the official XML feed. The
//! table is quoted against the rouble: `Value` roubles for `Nominal` units.

mod models;

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{CbrRate, CbrRates};

use models::DailyResponse;

const PROVIDER_ID: &str = "CBR";

/// Public daily endpoint.
pub const DEFAULT_CBR_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CbrRatesClient {
    client: Client,
    url: String,
}

impl Default for CbrRatesClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CbrRatesClient {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_CBR_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch today's table.
    pub async fn fetch_daily(&self) -> Result<CbrRates, MarketDataError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("CBR rates request failed with {}", status);
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        // The mirror serves `application/javascript`, so read text and parse.
        let body = response.text().await?;
        let rates = parse_daily(&body)?;
        debug!("Fetched {} CBR rates", rates.rates.len());
        Ok(rates)
    }
}

fn parse_daily(body: &str) -> Result<CbrRates, MarketDataError> {
    let payload: DailyResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::ValidationFailed {
            message: format!("CBR payload: {}", e),
        })?;

    let mut rates = HashMap::with_capacity(payload.valute.len());
    for (key, valute) in payload.valute {
        let code = valute
            .char_code
            .unwrap_or(key)
            .trim()
            .to_uppercase();
        let nominal = valute
            .nominal
            .filter(|n| *n > Decimal::ZERO)
            .unwrap_or(Decimal::ONE);

        let Some(value) = valute.value.filter(|v| *v > Decimal::ZERO) else {
            continue;
        };
        let previous = valute
            .previous
            .filter(|p| *p > Decimal::ZERO)
            .map(|p| p / nominal);

        rates.insert(
            code.clone(),
            CbrRate {
                code,
                rate: value / nominal,
                previous,
            },
        );
    }

    if rates.is_empty() {
        return Err(MarketDataError::ValidationFailed {
            message: "CBR payload has no rates".to_string(),
        });
    }

    Ok(CbrRates {
        published_at: payload.date,
        rates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"{
        "Date": "2024-03-01T11:30:00+03:00",
        "PreviousDate": "2024-02-29T11:30:00+03:00",
        "Timestamp": "2024-02-29T20:00:00+03:00",
        "Valute": {
            "USD": {"ID": "R01235", "NumCode": "840", "CharCode": "USD", "Nominal": 1, "Name": "Доллар США", "Value": 91.5, "Previous": 90.5},
            "CNY": {"ID": "R01375", "NumCode": "156", "CharCode": "CNY", "Nominal": 1, "Name": "Юань", "Value": 12.6, "Previous": 12.5},
            "JPY": {"ID": "R01820", "NumCode": "392", "CharCode": "JPY", "Nominal": 100, "Name": "Иен", "Value": 60.0, "Previous": 61.0},
            "XXX": {"ID": "R00000", "NumCode": "000", "CharCode": "XXX", "Nominal": 1, "Name": "Broken", "Value": 0}
        }
    }"#;

    #[test]
    fn test_parse_daily_normalises_nominal() {
        let rates = parse_daily(SAMPLE).unwrap();
        assert_eq!(rates.rates["USD"].rate, dec!(91.5));
        assert_eq!(rates.rates["USD"].previous, Some(dec!(90.5)));
        assert_eq!(rates.rates["JPY"].rate, dec!(0.6));
        assert_eq!(rates.rates["JPY"].previous, Some(dec!(0.61)));
        assert!(rates.published_at.is_some());
    }

    #[test]
    fn test_parse_daily_skips_non_positive_values() {
        let rates = parse_daily(SAMPLE).unwrap();
        assert!(!rates.rates.contains_key("XXX"));
        assert_eq!(rates.rates.len(), 3);
    }

    #[test]
    fn test_parse_daily_rejects_garbage() {
        assert!(matches!(
            parse_daily("not json"),
            Err(MarketDataError::ValidationFailed { .. })
        ));
        assert!(matches!(
            parse_daily(r#"{"Valute": {}}"#),
            Err(MarketDataError::ValidationFailed { .. })
        ));
    }
}
