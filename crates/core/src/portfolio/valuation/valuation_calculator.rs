//! Pure valuation math: unit values, P&L, reference selection, aggregation.
//!
//! Nothing here rounds; display rounding is the caller's job.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::valuation_model::{PortfolioSummary, PositionValuation, PriceSource};
use crate::instruments::InstrumentKind;
use crate::portfolio::positions::Position;
use crate::price_history::PriceSample;
use crate::utils::time_utils::start_of_valuation_day;

/// Market data resolved for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceInputs {
    /// Quoted price (percent of face for bonds), or the average cost when
    /// `source` is [`PriceSource::CostBasis`].
    pub price: Decimal,
    pub source: PriceSource,
    pub as_of: Option<DateTime<Utc>>,
    /// Reference price in the same terms as `price`.
    pub reference_price: Decimal,
    /// Bond nominal; ignored for equities.
    pub face_value: Decimal,
    pub face_currency: String,
    /// Home-currency units per one unit of `face_currency`.
    pub fx_rate: Decimal,
}

/// Converts a quoted price to home-currency value per unit.
///
/// Bonds are quoted in percent of face value, and the face may be in a
/// foreign currency.
pub fn unit_value(
    kind: InstrumentKind,
    price: Decimal,
    face_value: Decimal,
    fx_rate: Decimal,
) -> Decimal {
    match kind {
        InstrumentKind::Equity => price,
        InstrumentKind::Bond => price * face_value / Decimal::ONE_HUNDRED * fx_rate,
    }
}

fn percent_change(current: Decimal, reference: Decimal) -> Decimal {
    if reference <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current - reference) / reference * Decimal::ONE_HUNDRED
}

pub fn value_position(position: &Position, inputs: &PriceInputs) -> PositionValuation {
    let kind = position.instrument_kind;

    // Average cost is already a home-currency unit value; never reconvert it.
    let (current_unit_value, reference_unit_value) = match inputs.source {
        PriceSource::CostBasis => (inputs.price, inputs.reference_price),
        PriceSource::Live | PriceSource::Cached => (
            unit_value(kind, inputs.price, inputs.face_value, inputs.fx_rate),
            unit_value(kind, inputs.reference_price, inputs.face_value, inputs.fx_rate),
        ),
    };

    let position_value = position.quantity * current_unit_value;
    let cost_value = position.cost_value();
    let unrealized_pnl = position_value - cost_value;
    let unrealized_pnl_pct = if position.average_cost > Decimal::ZERO {
        (current_unit_value - position.average_cost) / position.average_cost * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let period_change = current_unit_value - reference_unit_value;
    // Bonds compare raw percent quotes so FX moves don't leak into the change.
    let period_change_pct = percent_change(inputs.price, inputs.reference_price);

    let is_bond = kind.is_bond();
    PositionValuation {
        account_id: position.account_id.clone(),
        ticker: position.ticker.clone(),
        name: position.name.clone(),
        instrument_kind: kind,
        quantity: position.quantity,
        average_cost: position.average_cost,
        quoted_price: inputs.price,
        current_unit_value,
        position_value,
        cost_value,
        unrealized_pnl,
        unrealized_pnl_pct,
        realized_pnl: position.realized_pnl,
        reference_price: inputs.reference_price,
        period_change,
        period_change_pct,
        face_value: is_bond.then_some(inputs.face_value),
        face_currency: is_bond.then(|| inputs.face_currency.clone()),
        fx_rate: inputs.fx_rate,
        price_source: inputs.source,
        is_stale: inputs.source != PriceSource::Live,
        as_of: inputs.as_of,
    }
}

/// Picks the sample that period change is measured against.
///
/// `samples` may be in any order. With a lookback of `days`, the oldest
/// sample inside `[now - days, now]`, else the newest sample overall. Without
/// one, the newest sample from before today's start in `tz`, else the oldest
/// sample before `now`. `None` means "no reference": the change is zero.
pub fn select_reference_sample<'a>(
    samples: &'a [PriceSample],
    now: DateTime<Utc>,
    lookback_days: Option<i64>,
    tz: Tz,
) -> Option<&'a PriceSample> {
    match lookback_days {
        Some(days) => {
            let window_start = now - Duration::days(days.max(0));
            samples
                .iter()
                .filter(|s| s.logged_at >= window_start && s.logged_at <= now)
                .min_by_key(|s| (s.logged_at, s.id))
                .or_else(|| samples.iter().max_by_key(|s| (s.logged_at, s.id)))
        }
        None => {
            let today_start = start_of_valuation_day(now, tz);
            samples
                .iter()
                .filter(|s| s.logged_at < today_start)
                .max_by_key(|s| (s.logged_at, s.id))
                .or_else(|| {
                    samples
                        .iter()
                        .filter(|s| s.logged_at < now)
                        .min_by_key(|s| (s.logged_at, s.id))
                })
        }
    }
}

/// Newest sample, used as the price when the live quote is unavailable.
pub fn latest_sample(samples: &[PriceSample]) -> Option<&PriceSample> {
    samples.iter().max_by_key(|s| (s.logged_at, s.id))
}

/// Portfolio totals.
///
/// P&L is the exact sum of the rows' P&L. The period change is weighted by
/// position value; rows that did not move are left out of the denominator.
pub fn aggregate(positions: &[PositionValuation]) -> PortfolioSummary {
    let total_value: Decimal = positions.iter().map(|p| p.position_value).sum();
    let total_cost: Decimal = positions.iter().map(|p| p.cost_value).sum();
    let total_pnl: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();
    let total_realized_pnl: Decimal = positions.iter().map(|p| p.realized_pnl).sum();

    let total_pnl_pct = if total_cost.is_zero() {
        Decimal::ZERO
    } else {
        total_pnl / total_cost * Decimal::ONE_HUNDRED
    };

    let (weighted, weight) = positions
        .iter()
        .filter(|p| !p.period_change_pct.is_zero())
        .fold((Decimal::ZERO, Decimal::ZERO), |(w, total), p| {
            (w + p.period_change_pct * p.position_value, total + p.position_value)
        });
    let period_change_pct = if weight.is_zero() {
        Decimal::ZERO
    } else {
        weighted / weight
    };

    PortfolioSummary {
        total_value,
        total_cost,
        total_pnl,
        total_pnl_pct,
        total_realized_pnl,
        period_change_pct,
    }
}
