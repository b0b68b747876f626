use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BOND_FACE_VALUE, DEFAULT_HOME_CURRENCY, DEFAULT_LOOKUP_TIMEOUT_MS};
use crate::instruments::InstrumentKind;

/// Engine parameters that would otherwise be scattered literals.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationSettings {
    pub home_currency: String,
    /// Nominal assumed for bonds whose face value is unknown.
    pub default_face_value: Decimal,
    /// Bound for each quote or reference lookup.
    pub lookup_timeout: Duration,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            home_currency: DEFAULT_HOME_CURRENCY.to_string(),
            default_face_value: Decimal::from(DEFAULT_BOND_FACE_VALUE),
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }
}

/// Where the current price of a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceSource {
    /// Quote fetched from the exchange just now.
    Live,
    /// Last logged price sample.
    Cached,
    /// No market data at all; valued at average cost.
    CostBasis,
}

/// Valuation of one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub account_id: String,
    pub ticker: String,
    pub name: Option<String>,
    pub instrument_kind: InstrumentKind,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    /// Price as quoted: absolute for equities, percent of face for bonds.
    pub quoted_price: Decimal,
    /// Value of one unit in home currency.
    pub current_unit_value: Decimal,
    pub position_value: Decimal,
    pub cost_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_pct: Decimal,
    /// Gain already locked in by sales of this ticker.
    pub realized_pnl: Decimal,
    /// Reference price in the same terms as `quoted_price`.
    pub reference_price: Decimal,
    pub period_change: Decimal,
    pub period_change_pct: Decimal,
    pub face_value: Option<Decimal>,
    pub face_currency: Option<String>,
    pub fx_rate: Decimal,
    pub price_source: PriceSource,
    pub is_stale: bool,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_pct: Decimal,
    /// Σ realized P&L of the held positions; not part of `total_pnl`.
    pub total_realized_pnl: Decimal,
    /// Value-weighted average of the positions' period change.
    pub period_change_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub home_currency: String,
    pub positions: Vec<PositionValuation>,
    pub summary: PortfolioSummary,
    pub valued_at: DateTime<Utc>,
}
