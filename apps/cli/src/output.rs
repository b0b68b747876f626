//! Plain-text rendering of command results.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use moexfolio_core::constants::DISPLAY_DECIMAL_PRECISION;
use moexfolio_core::fx::RateInfo;
use moexfolio_core::ledger::{RecalculationOutcome, Transaction};
use moexfolio_core::portfolio::valuation::{PortfolioValuation, PriceSource};
use moexfolio_core::price_history::PriceSample;

fn money(value: Decimal) -> String {
    value.round_dp(DISPLAY_DECIMAL_PRECISION).to_string()
}

fn signed(value: Decimal) -> String {
    let rounded = value.round_dp(DISPLAY_DECIMAL_PRECISION);
    if rounded > Decimal::ZERO {
        format!("+{}", rounded)
    } else {
        rounded.to_string()
    }
}

fn source_marker(source: PriceSource) -> &'static str {
    match source {
        PriceSource::Live => "",
        PriceSource::Cached => " (cached)",
        PriceSource::CostBasis => " (cost)",
    }
}

pub fn render_portfolio(valuation: &PortfolioValuation) -> String {
    let mut out = String::new();
    if valuation.positions.is_empty() {
        out.push_str("Portfolio is empty\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<8} {:<14} {:>12} {:>12} {:>14} {:>14} {:>10} {:>14} {:>8}",
        "ACCOUNT", "TICKER", "QTY", "AVG", "VALUE", "P&L", "P&L %", "REALIZED", "CHG %"
    );
    for row in &valuation.positions {
        let _ = writeln!(
            out,
            "{:<8} {:<14} {:>12} {:>12} {:>14} {:>14} {:>10} {:>14} {:>8}{}",
            row.account_id,
            row.ticker,
            row.quantity.normalize(),
            money(row.average_cost),
            money(row.position_value),
            signed(row.unrealized_pnl),
            signed(row.unrealized_pnl_pct),
            signed(row.realized_pnl),
            signed(row.period_change_pct),
            source_marker(row.price_source),
        );
    }

    let summary = &valuation.summary;
    let _ = writeln!(
        out,
        "Total: {} {} | cost {} | P&L {} ({}%) | realized {} | change {}%",
        money(summary.total_value),
        valuation.home_currency,
        money(summary.total_cost),
        signed(summary.total_pnl),
        signed(summary.total_pnl_pct),
        signed(summary.total_realized_pnl),
        signed(summary.period_change_pct),
    );
    out
}

pub fn render_transactions(transactions: &[Transaction]) -> String {
    let mut out = String::new();
    if transactions.is_empty() {
        out.push_str("No transactions\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:>6} {:<19} {:<8} {:<14} {:<4} {:>12} {:>12} {:>14}",
        "ID", "DATE", "ACCOUNT", "TICKER", "SIDE", "QTY", "PRICE", "TOTAL"
    );
    for t in transactions {
        let _ = writeln!(
            out,
            "{:>6} {:<19} {:<8} {:<14} {:<4} {:>12} {:>12} {:>14}",
            t.id,
            t.trade_date.format("%Y-%m-%d %H:%M:%S"),
            t.account_id,
            t.ticker,
            t.side,
            t.quantity.normalize(),
            t.unit_price.normalize(),
            money(t.total),
        );
    }
    out
}

pub fn render_recalculations(outcomes: &[RecalculationOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let _ = match &outcome.position {
            Some(position) => writeln!(
                out,
                "{}: {} @ {}",
                outcome.key,
                position.quantity.normalize(),
                money(position.average_cost)
            ),
            None => writeln!(out, "{}: closed", outcome.key),
        };
    }
    out
}

pub fn render_samples(samples: &[PriceSample]) -> String {
    let mut out = String::new();
    for s in samples {
        let _ = writeln!(
            out,
            "{} {:<14} {:>12} {:>8}",
            s.logged_at.format("%Y-%m-%d %H:%M"),
            s.ticker,
            s.price.normalize(),
            signed(s.change_percent),
        );
    }
    out
}

pub fn render_grouped_samples(grouped: &BTreeMap<NaiveDate, Vec<PriceSample>>) -> String {
    let mut out = String::new();
    for (day, samples) in grouped.iter().rev() {
        let _ = writeln!(out, "{}", day);
        for line in render_samples(samples).lines() {
            let _ = writeln!(out, "  {}", line);
        }
    }
    out
}

pub fn render_rates(rates: &[RateInfo], home_currency: &str) -> String {
    let mut out = String::new();
    for rate in rates {
        let _ = writeln!(
            out,
            "{} {:>12} {} {:>10} ({}%)",
            rate.code,
            rate.rate.round_dp(4),
            home_currency,
            signed(rate.change),
            signed(rate.change_percent),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use moexfolio_core::instruments::InstrumentKind;
    use moexfolio_core::portfolio::valuation::{PortfolioSummary, PositionValuation};
    use rust_decimal_macros::dec;

    fn row(ticker: &str, source: PriceSource) -> PositionValuation {
        PositionValuation {
            account_id: "default".to_string(),
            ticker: ticker.to_string(),
            name: None,
            instrument_kind: InstrumentKind::Equity,
            quantity: dec!(10),
            average_cost: dec!(250),
            quoted_price: dec!(300),
            current_unit_value: dec!(300),
            position_value: dec!(3000),
            cost_value: dec!(2500),
            unrealized_pnl: dec!(500),
            unrealized_pnl_pct: dec!(20),
            realized_pnl: dec!(-25),
            reference_price: dec!(300),
            period_change: Decimal::ZERO,
            period_change_pct: Decimal::ZERO,
            face_value: None,
            face_currency: None,
            fx_rate: Decimal::ONE,
            price_source: source,
            is_stale: source != PriceSource::Live,
            as_of: None,
        }
    }

    #[test]
    fn test_render_portfolio_marks_stale_rows() {
        let valuation = PortfolioValuation {
            home_currency: "RUB".to_string(),
            positions: vec![row("SBER", PriceSource::Live), row("GAZP", PriceSource::Cached)],
            summary: PortfolioSummary {
                total_value: dec!(6000),
                total_cost: dec!(5000),
                total_pnl: dec!(1000),
                total_pnl_pct: dec!(20),
                total_realized_pnl: dec!(-50),
                period_change_pct: Decimal::ZERO,
            },
            valued_at: Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap(),
        };

        let text = render_portfolio(&valuation);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!lines[1].ends_with("(cached)"));
        assert!(lines[2].ends_with("(cached)"));
        assert!(lines[3].contains("P&L +1000 (+20%)"));
        assert!(lines[3].contains("realized -50"));
    }

    #[test]
    fn test_render_empty_portfolio() {
        let valuation = PortfolioValuation {
            home_currency: "RUB".to_string(),
            positions: vec![],
            summary: PortfolioSummary::default(),
            valued_at: Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap(),
        };
        assert_eq!(render_portfolio(&valuation), "Portfolio is empty\n");
    }

    #[test]
    fn test_signed_rounding() {
        assert_eq!(signed(dec!(2.105263)), "+2.11");
        assert_eq!(signed(dec!(-1.5)), "-1.5");
        assert_eq!(money(dec!(85500)), "85500");
    }
}
