use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::currency::normalize_currency_code;
use super::currency_converter::CurrencyConverter;
use super::fx_errors::FxError;
use super::fx_model::RateInfo;
use super::fx_traits::{CurrencyConverterTrait, FxServiceTrait, RateSourceTrait};
use crate::errors::Result;
use crate::utils::time_utils::{valuation_date_from_utc, DEFAULT_VALUATION_TZ};

/// Minimum wait before retrying after a failed fetch.
const RETRY_INTERVAL_MINUTES: i64 = 10;

#[derive(Default)]
struct FxState {
    converter: Option<CurrencyConverter>,
    loaded_on: Option<NaiveDate>,
    last_failure: Option<DateTime<Utc>>,
}

/// Daily-cached exchange rates.
///
/// The table is fetched at most once per valuation day. A failed fetch keeps
/// the previous table and is retried no sooner than ten minutes later.
pub struct FxService {
    source: Arc<dyn RateSourceTrait>,
    home_currency: String,
    state: Mutex<FxState>,
}

impl FxService {
    pub fn new(source: Arc<dyn RateSourceTrait>, home_currency: &str) -> Self {
        Self {
            source,
            home_currency: normalize_currency_code(home_currency),
            state: Mutex::new(FxState::default()),
        }
    }

    pub fn home_currency(&self) -> &str {
        &self.home_currency
    }

    async fn refresh_if_needed(&self, state: &mut FxState, now: DateTime<Utc>) {
        let today = valuation_date_from_utc(now, DEFAULT_VALUATION_TZ);
        if state.converter.is_some() && state.loaded_on == Some(today) {
            return;
        }
        if let Some(failed_at) = state.last_failure {
            if now - failed_at < Duration::minutes(RETRY_INTERVAL_MINUTES) {
                debug!("Skipping rate refresh, last attempt failed at {}", failed_at);
                return;
            }
        }

        match self.source.fetch_rates().await {
            Ok(table) => {
                let converter = CurrencyConverter::new(table, &self.home_currency);
                info!(
                    "Loaded {} exchange rates (published {:?})",
                    converter.codes().len(),
                    converter.published_at()
                );
                state.converter = Some(converter);
                state.loaded_on = Some(today);
                state.last_failure = None;
            }
            Err(e) => {
                warn!("Exchange rate refresh failed, keeping previous rates: {}", e);
                state.last_failure = Some(now);
            }
        }
    }

    pub(crate) async fn rate_to_home_at(&self, code: &str, now: DateTime<Utc>) -> Decimal {
        let code = normalize_currency_code(code);
        if code.is_empty() || code == self.home_currency {
            return Decimal::ONE;
        }

        let mut state = self.state.lock().await;
        self.refresh_if_needed(&mut state, now).await;

        match state.converter.as_ref().map(|c| c.rate_to_home(&code)) {
            Some(Ok(rate)) => rate,
            Some(Err(e)) => {
                warn!("{}; using 1", e);
                Decimal::ONE
            }
            None => {
                warn!("No exchange rates loaded; using 1 for {}", code);
                Decimal::ONE
            }
        }
    }

    pub(crate) async fn rates_info_at(
        &self,
        codes: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Result<Vec<RateInfo>> {
        let mut state = self.state.lock().await;
        self.refresh_if_needed(&mut state, now).await;

        let converter = state
            .converter
            .as_ref()
            .ok_or_else(|| FxError::SourceUnavailable("no exchange rates loaded".to_string()))?;

        let codes: Vec<String> = match codes {
            Some(codes) => codes.iter().map(|c| normalize_currency_code(c)).collect(),
            None => converter.codes(),
        };

        let mut infos = Vec::with_capacity(codes.len());
        for code in codes {
            match converter.rate_info(&code) {
                Ok(info) => infos.push(info),
                Err(e) => warn!("Skipping {}: {}", code, e),
            }
        }
        Ok(infos)
    }
}

#[async_trait]
impl CurrencyConverterTrait for FxService {
    async fn rate_to_home(&self, code: &str) -> Decimal {
        self.rate_to_home_at(code, Utc::now()).await
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    async fn rates_info(&self, codes: Option<&[String]>) -> Result<Vec<RateInfo>> {
        self.rates_info_at(codes, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{ExchangeRate, RateTable};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct ScriptedSource {
        calls: AtomicUsize,
        failing: AtomicBool,
        usd: Decimal,
    }

    impl ScriptedSource {
        fn new(usd: Decimal) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                usd,
            }
        }
    }

    #[async_trait]
    impl RateSourceTrait for ScriptedSource {
        async fn fetch_rates(&self) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(FxError::SourceUnavailable("HTTP 503".to_string()).into());
            }
            Ok(RateTable {
                published_at: None,
                rates: vec![ExchangeRate {
                    code: "USD".to_string(),
                    rate_to_rub: self.usd,
                    previous_to_rub: Some(self.usd - dec!(1)),
                }],
            })
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_home_currency_needs_no_fetch() {
        let source = Arc::new(ScriptedSource::new(dec!(90)));
        let service = FxService::new(source.clone(), "RUB");

        assert_eq!(service.rate_to_home_at("rub", at(1, 9, 0)).await, Decimal::ONE);
        assert_eq!(service.rate_to_home_at("SUR", at(1, 9, 0)).await, Decimal::ONE);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rates_are_cached_for_the_day() {
        let source = Arc::new(ScriptedSource::new(dec!(90)));
        let service = FxService::new(source.clone(), "RUB");

        assert_eq!(service.rate_to_home_at("USD", at(1, 9, 0)).await, dec!(90));
        assert_eq!(service.rate_to_home_at("USD", at(1, 15, 0)).await, dec!(90));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        // Next Moscow day triggers a refresh.
        service.rate_to_home_at("USD", at(2, 9, 0)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_rates_and_backs_off() {
        let source = Arc::new(ScriptedSource::new(dec!(90)));
        let service = FxService::new(source.clone(), "RUB");

        service.rate_to_home_at("USD", at(1, 9, 0)).await;
        source.failing.store(true, Ordering::SeqCst);

        assert_eq!(service.rate_to_home_at("USD", at(2, 9, 0)).await, dec!(90));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // Within the retry interval: no new request.
        service.rate_to_home_at("USD", at(2, 9, 5)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // After it: retried.
        service.rate_to_home_at("USD", at(2, 9, 11)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_currency_or_no_rates_falls_back_to_one() {
        let source = Arc::new(ScriptedSource::new(dec!(90)));
        source.failing.store(true, Ordering::SeqCst);
        let service = FxService::new(source.clone(), "RUB");

        assert_eq!(service.rate_to_home_at("USD", at(1, 9, 0)).await, Decimal::ONE);
        assert!(service.rates_info_at(None, at(1, 9, 1)).await.is_err());

        source.failing.store(false, Ordering::SeqCst);
        assert_eq!(service.rate_to_home_at("XYZ", at(1, 10, 0)).await, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_rates_info() {
        let source = Arc::new(ScriptedSource::new(dec!(90)));
        let service = FxService::new(source, "RUB");

        let codes = vec!["usd".to_string(), "XYZ".to_string()];
        let infos = service.rates_info_at(Some(&codes), at(1, 9, 0)).await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].code, "USD");
        assert_eq!(infos[0].rate, dec!(90));
        assert_eq!(infos[0].change, dec!(1));

        let all = service.rates_info_at(None, at(1, 9, 0)).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
