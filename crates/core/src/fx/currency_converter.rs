use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use crate::fx::currency::normalize_currency_code;
use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::{ExchangeRate, RateInfo, RateTable};

const RUB: &str = "RUB";

/// Converts between currencies through a rouble-quoted rate table.
///
/// Every published rate is "roubles per unit", so any pair is a cross rate
/// through RUB: `rate(from -> home) = rub(from) / rub(home)`.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    home_currency: String,
    published_at: Option<DateTime<FixedOffset>>,
    rates: HashMap<String, ExchangeRate>,
}

impl CurrencyConverter {
    pub fn new(table: RateTable, home_currency: &str) -> Self {
        let rates = table
            .rates
            .into_iter()
            .filter(|rate| rate.rate_to_rub > Decimal::ZERO)
            .map(|rate| (normalize_currency_code(&rate.code), rate))
            .collect();
        Self {
            home_currency: normalize_currency_code(home_currency),
            published_at: table.published_at,
            rates,
        }
    }

    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        self.published_at
    }

    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.push(RUB.to_string());
        codes.sort();
        codes.dedup();
        codes
    }

    fn rub_rate(&self, code: &str) -> Option<Decimal> {
        if code == RUB {
            return Some(Decimal::ONE);
        }
        self.rates.get(code).map(|rate| rate.rate_to_rub)
    }

    fn rub_previous(&self, code: &str) -> Option<Decimal> {
        if code == RUB {
            return Some(Decimal::ONE);
        }
        self.rates
            .get(code)
            .map(|rate| rate.previous_to_rub.unwrap_or(rate.rate_to_rub))
    }

    /// Home-currency units per one unit of `code`.
    pub fn rate_to_home(&self, code: &str) -> Result<Decimal, FxError> {
        let code = normalize_currency_code(code);
        if code == self.home_currency {
            return Ok(Decimal::ONE);
        }
        let from = self
            .rub_rate(&code)
            .ok_or_else(|| FxError::RateNotFound(format!("{}->{}", code, self.home_currency)))?;
        let home = self.rub_rate(&self.home_currency).ok_or_else(|| {
            FxError::RateNotFound(format!("{}->{}", RUB, self.home_currency))
        })?;
        Ok(from / home)
    }

    fn previous_rate_to_home(&self, code: &str) -> Option<Decimal> {
        let from = self.rub_previous(code)?;
        let home = self.rub_previous(&self.home_currency)?;
        if home.is_zero() {
            return None;
        }
        Some(from / home)
    }

    /// Current rate and change against the previous publication.
    pub fn rate_info(&self, code: &str) -> Result<RateInfo, FxError> {
        let code = normalize_currency_code(code);
        let rate = self.rate_to_home(&code)?;
        let previous = self.previous_rate_to_home(&code).unwrap_or(rate);
        let change = rate - previous;
        let change_percent = if previous.is_zero() {
            Decimal::ZERO
        } else {
            change / previous * Decimal::ONE_HUNDRED
        };
        Ok(RateInfo {
            code,
            rate,
            change,
            change_percent,
        })
    }
}
