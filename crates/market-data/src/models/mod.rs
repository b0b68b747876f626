//! Data models returned by the exchange and rate clients.

mod quote;
mod rates;

pub use quote::{Board, MoexQuote, MoexSecurity};
pub use rates::{CbrRate, CbrRates};
