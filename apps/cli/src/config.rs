use std::time::Duration;

use anyhow::{bail, Context};
use rust_decimal::Decimal;

use moexfolio_core::constants::{
    DEFAULT_ACCOUNT_ID, DEFAULT_BOND_FACE_VALUE, DEFAULT_HOME_CURRENCY, DEFAULT_LOOKUP_TIMEOUT_MS,
};
use moexfolio_core::fx::currency::is_valid_currency_code;
use moexfolio_core::fx::normalize_currency_code;
use moexfolio_core::portfolio::valuation::ValuationSettings;
use moexfolio_market_data::cbr::DEFAULT_CBR_URL;
use moexfolio_market_data::moex::DEFAULT_ISS_URL;

pub const DEFAULT_DB_PATH: &str = "./db/portfolio.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: String,
    pub home_currency: String,
    pub default_face_value: Decimal,
    pub lookup_timeout: Duration,
    pub moex_url: String,
    pub cbr_url: String,
    pub account_id: String,
}

impl Config {
    /// Reads `MOEXFOLIO_*` variables, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let home_currency = normalize_currency_code(
            &var("MOEXFOLIO_HOME_CURRENCY").unwrap_or_else(|| DEFAULT_HOME_CURRENCY.to_string()),
        );
        if !is_valid_currency_code(&home_currency) {
            bail!("MOEXFOLIO_HOME_CURRENCY must be a 3-letter code, got '{}'", home_currency);
        }

        let default_face_value = match var("MOEXFOLIO_DEFAULT_FACE_VALUE") {
            Some(raw) => raw
                .parse::<Decimal>()
                .with_context(|| format!("MOEXFOLIO_DEFAULT_FACE_VALUE is not a number: {}", raw))?,
            None => Decimal::from(DEFAULT_BOND_FACE_VALUE),
        };
        if default_face_value <= Decimal::ZERO {
            bail!("MOEXFOLIO_DEFAULT_FACE_VALUE must be positive");
        }

        let timeout_ms = match var("MOEXFOLIO_LOOKUP_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("MOEXFOLIO_LOOKUP_TIMEOUT_MS is not an integer: {}", raw))?,
            None => DEFAULT_LOOKUP_TIMEOUT_MS,
        };

        Ok(Self {
            db_path: var("MOEXFOLIO_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            home_currency,
            default_face_value,
            lookup_timeout: Duration::from_millis(timeout_ms),
            moex_url: var("MOEXFOLIO_MOEX_URL").unwrap_or_else(|| DEFAULT_ISS_URL.to_string()),
            cbr_url: var("MOEXFOLIO_CBR_URL").unwrap_or_else(|| DEFAULT_CBR_URL.to_string()),
            account_id: var("MOEXFOLIO_ACCOUNT").unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string()),
        })
    }

    pub fn valuation_settings(&self) -> ValuationSettings {
        ValuationSettings {
            home_currency: self.home_currency.clone(),
            default_face_value: self.default_face_value,
            lookup_timeout: self.lookup_timeout,
        }
    }
}
