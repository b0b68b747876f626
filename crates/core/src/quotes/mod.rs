//! Quotes module - live prices and reference data from the exchange.

mod client;
mod quotes_errors;
mod quotes_model;
mod quotes_traits;
mod service;

pub use client::MoexQuoteProvider;
pub use quotes_errors::MarketDataError;
pub use quotes_model::{LiveQuote, ReferenceData, SecurityInfo, TickerValidation};
pub use quotes_traits::{QuoteProviderTrait, QuoteServiceTrait};
pub use service::QuoteService;
