//! FX (Foreign Exchange) module - central bank rates and home-currency conversion.

mod client;
pub mod currency;
mod currency_converter;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;

pub use client::CbrRateSource;
pub use currency::normalize_currency_code;
pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::{ExchangeRate, RateInfo, RateTable};
pub use fx_service::FxService;
pub use fx_traits::{CurrencyConverterTrait, FxServiceTrait, RateSourceTrait};
