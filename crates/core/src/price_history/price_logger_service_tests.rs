use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::errors::Result;
use crate::instruments::InstrumentKind;
use crate::ledger::InstrumentKey;
use crate::portfolio::positions::{Position, PositionRepositoryTrait};
use crate::quotes::{LiveQuote, QuoteProviderTrait, ReferenceData, SecurityInfo};

struct MockPositionRepository {
    positions: Vec<Position>,
}

impl PositionRepositoryTrait for MockPositionRepository {
    fn get_position(&self, key: &InstrumentKey) -> Result<Option<Position>> {
        Ok(self.positions.iter().find(|p| &p.key() == key).cloned())
    }

    fn list_positions(&self, account_id: Option<&str>) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .iter()
            .filter(|p| account_id.map_or(true, |a| p.account_id == a))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MockPriceHistoryRepository {
    samples: Mutex<Vec<PriceSample>>,
    last_limit: Mutex<Option<i64>>,
}

#[async_trait]
impl PriceHistoryRepositoryTrait for MockPriceHistoryRepository {
    fn get_samples(&self, ticker: &str) -> Result<Vec<PriceSample>> {
        Ok(self
            .samples
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.ticker == ticker)
            .cloned()
            .collect())
    }

    fn list_recent(&self, ticker: Option<&str>, limit: i64) -> Result<Vec<PriceSample>> {
        *self.last_limit.lock().unwrap() = Some(limit);
        let mut samples: Vec<PriceSample> = self
            .samples
            .lock()
            .unwrap()
            .iter()
            .filter(|s| ticker.map_or(true, |t| s.ticker == t))
            .cloned()
            .collect();
        samples.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
        samples.truncate(limit as usize);
        Ok(samples)
    }

    async fn insert_samples(&self, samples: Vec<NewPriceSample>) -> Result<usize> {
        let mut stored = self.samples.lock().unwrap();
        let count = samples.len();
        for sample in samples {
            let id = stored.len() as i64 + 1;
            stored.push(PriceSample {
                id,
                ticker: sample.ticker,
                company_name: sample.company_name,
                price: sample.price,
                change: sample.change,
                change_percent: sample.change_percent,
                volume: sample.volume,
                logged_at: sample.logged_at,
            });
        }
        Ok(count)
    }
}

struct MockQuoteProvider {
    prices: HashMap<String, Decimal>,
}

#[async_trait]
impl QuoteProviderTrait for MockQuoteProvider {
    async fn get_price(&self, ticker: &str, _kind: InstrumentKind) -> Option<LiveQuote> {
        self.prices.get(ticker).map(|price| LiveQuote {
            ticker: ticker.to_string(),
            price: *price,
            change: dec!(1),
            change_percent: dec!(0.5),
            volume: 100,
            as_of: Utc::now(),
            face_value: None,
            face_currency: None,
        })
    }

    async fn get_reference(&self, _ticker: &str, _kind: InstrumentKind) -> Option<ReferenceData> {
        None
    }

    async fn get_security_info(&self, _ticker: &str) -> Option<SecurityInfo> {
        None
    }
}

fn position(account_id: &str, ticker: &str, kind: InstrumentKind) -> Position {
    let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Position {
        account_id: account_id.to_string(),
        ticker: ticker.to_string(),
        name: Some(format!("{} name", ticker)),
        instrument_kind: kind,
        quantity: dec!(1),
        average_cost: dec!(100),
        total_cost_basis: dec!(100),
        open_quantity: dec!(1),
        realized_pnl: Decimal::ZERO,
        created_at: ts,
        updated_at: ts,
    }
}

fn sample(id: i64, ticker: &str, day: u32, hour: u32) -> PriceSample {
    PriceSample {
        id,
        ticker: ticker.to_string(),
        company_name: None,
        price: dec!(100),
        change: Decimal::ZERO,
        change_percent: Decimal::ZERO,
        volume: 0,
        logged_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
    }
}

fn service(
    positions: Vec<Position>,
    prices: &[(&str, Decimal)],
    history: Arc<MockPriceHistoryRepository>,
) -> PriceLoggerService {
    PriceLoggerService::new(
        Arc::new(MockPositionRepository { positions }),
        history,
        Arc::new(MockQuoteProvider {
            prices: prices
                .iter()
                .map(|(t, p)| (t.to_string(), *p))
                .collect(),
        }),
        Duration::from_secs(1),
    )
}

#[tokio::test]
async fn test_log_all_prices_counts_logged_and_total() {
    let history = Arc::new(MockPriceHistoryRepository::default());
    let service = service(
        vec![
            position("default", "SBER", InstrumentKind::Equity),
            position("iis", "SBER", InstrumentKind::Equity),
            position("default", "SU26238RMFS4", InstrumentKind::Bond),
            position("default", "DELISTED", InstrumentKind::Equity),
        ],
        &[("SBER", dec!(300)), ("SU26238RMFS4", dec!(61.2))],
        history.clone(),
    );

    let result = service.log_all_prices().await.unwrap();
    assert_eq!(result, LogPricesResult { logged: 2, total: 3 });

    let bond = history.get_samples("SU26238RMFS4").unwrap();
    assert_eq!(bond.len(), 1);
    assert_eq!(bond[0].price, dec!(61.2));
    assert_eq!(bond[0].company_name.as_deref(), Some("SU26238RMFS4 name"));
}

#[tokio::test]
async fn test_log_all_prices_with_empty_portfolio() {
    let history = Arc::new(MockPriceHistoryRepository::default());
    let service = service(vec![], &[], history);
    assert_eq!(
        service.log_all_prices().await.unwrap(),
        LogPricesResult::default()
    );
}

#[test]
fn test_history_limits() {
    let history = Arc::new(MockPriceHistoryRepository::default());
    let service = service(vec![], &[], history.clone());

    service.get_price_history(Some(" sber "), 7).unwrap();
    assert_eq!(*history.last_limit.lock().unwrap(), Some(7));

    service.get_price_history(None, 7).unwrap();
    assert_eq!(*history.last_limit.lock().unwrap(), Some(350));

    assert!(service.get_price_history(None, 0).is_err());
}

#[test]
fn test_history_grouped_by_moscow_date() {
    let history = Arc::new(MockPriceHistoryRepository::default());
    {
        let mut samples = history.samples.lock().unwrap();
        samples.push(sample(1, "SBER", 1, 10));
        // 22:00 UTC is already the next day in Moscow.
        samples.push(sample(2, "SBER", 1, 22));
        samples.push(sample(3, "GAZP", 2, 9));
    }
    let service = service(vec![], &[], history);

    let grouped = service.get_price_history_grouped(30).unwrap();
    let day1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let day2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[&day1].len(), 1);
    let ids: Vec<i64> = grouped[&day2].iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![3, 2]);
}
