//! Valuation module - live values, P&L and period change of positions.

mod valuation_calculator;
mod valuation_model;
mod valuation_service;
mod valuation_traits;


pub use valuation_calculator::{
    aggregate, latest_sample, select_reference_sample, unit_value, value_position, PriceInputs,
};
pub use valuation_model::{
    PortfolioSummary, PortfolioValuation, PositionValuation, PriceSource, ValuationSettings,
};
pub use valuation_service::ValuationService;
pub use valuation_traits::ValuationServiceTrait;
