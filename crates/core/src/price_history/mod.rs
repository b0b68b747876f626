//! Price history module - logged market prices.

mod price_history_model;
mod price_history_traits;
mod price_logger_service;

#[cfg(test)]
mod price_logger_service_tests;

pub use price_history_model::{LogPricesResult, NewPriceSample, PriceSample};
pub use price_history_traits::{PriceHistoryRepositoryTrait, PriceLoggerServiceTrait};
pub use price_logger_service::PriceLoggerService;
