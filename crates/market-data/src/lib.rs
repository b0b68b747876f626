//! Moexfolio Market Data Crate
//!
//! Thin, provider-specific clients for the two external collaborators the
//! portfolio engine talks to:
//!
//! - [`MoexIssClient`] - Moscow Exchange ISS API (share and bond boards):
//!   last price, intraday change, face value, face currency and lot size.
//! - [`CbrRatesClient`] - Central Bank of Russia daily exchange rates.
//!
//! # Architecture
//!
//! ```text
//! +------------------+      +------------------+
//! |  moexfolio-core  | ---> |  MoexIssClient   | ---> iss.moex.com
//! |  (quote / fx     |      +------------------+
//! |   adapters)      | ---> |  CbrRatesClient  | ---> cbr-xml-daily.ru
//! +------------------+      +------------------+
//! ```
//!
//! The clients return their own models and [`MarketDataError`]; the core crate
//! decides how failures degrade (usually "no data" for that instrument).

pub mod cbr;
pub mod errors;
pub mod models;
pub mod moex;

pub use cbr::CbrRatesClient;
pub use errors::MarketDataError;
pub use models::{Board, CbrRate, CbrRates, MoexQuote, MoexSecurity};
pub use moex::MoexIssClient;
