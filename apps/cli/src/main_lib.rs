use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use moexfolio_core::fx::{CbrRateSource, FxService, FxServiceTrait};
use moexfolio_core::ledger::{LedgerService, LedgerServiceTrait};
use moexfolio_core::portfolio::valuation::{ValuationService, ValuationServiceTrait};
use moexfolio_core::price_history::{PriceLoggerService, PriceLoggerServiceTrait};
use moexfolio_core::quotes::{MoexQuoteProvider, QuoteProviderTrait, QuoteService, QuoteServiceTrait};
use moexfolio_market_data::{CbrRatesClient, MoexIssClient};
use moexfolio_storage_sqlite::{
    get_db_path, open, InstrumentRepository, LedgerRepository, PositionRepository,
    PriceHistoryRepository,
};

/// Services the commands run against.
pub struct AppContext {
    pub config: Config,
    pub ledger_service: Arc<dyn LedgerServiceTrait>,
    pub valuation_service: Arc<dyn ValuationServiceTrait>,
    pub price_logger_service: Arc<dyn PriceLoggerServiceTrait>,
    pub quote_service: Arc<dyn QuoteServiceTrait>,
    pub fx_service: Arc<dyn FxServiceTrait>,
}

/// Installs the global subscriber. `log` records from the library crates are
/// forwarded into it.
pub fn init_tracing() {
    let log_format = std::env::var("MOEXFOLIO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

pub fn build_context(config: Config) -> anyhow::Result<AppContext> {
    let db_path = get_db_path(&config.db_path);
    let (pool, writer) = open(&db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let ledger_repository = Arc::new(LedgerRepository::new(pool.clone(), writer.clone()));
    let position_repository = Arc::new(PositionRepository::new(pool.clone()));
    let instrument_repository = Arc::new(InstrumentRepository::new(pool.clone()));
    let price_history_repository = Arc::new(PriceHistoryRepository::new(pool, writer));

    let quote_provider: Arc<dyn QuoteProviderTrait> = Arc::new(MoexQuoteProvider::new(
        MoexIssClient::with_base_url(config.moex_url.as_str()),
    ));
    let fx_service = Arc::new(FxService::new(
        Arc::new(CbrRateSource::new(CbrRatesClient::with_url(config.cbr_url.as_str()))),
        &config.home_currency,
    ));

    let ledger_service = Arc::new(LedgerService::new(
        ledger_repository,
        instrument_repository.clone(),
        quote_provider.clone(),
        config.lookup_timeout,
    ));
    let valuation_service = Arc::new(ValuationService::new(
        position_repository.clone(),
        instrument_repository,
        price_history_repository.clone(),
        quote_provider.clone(),
        fx_service.clone(),
        config.valuation_settings(),
    ));
    let price_logger_service = Arc::new(PriceLoggerService::new(
        position_repository,
        price_history_repository,
        quote_provider.clone(),
        config.lookup_timeout,
    ));
    let quote_service = Arc::new(QuoteService::new(quote_provider, config.lookup_timeout));

    Ok(AppContext {
        config,
        ledger_service,
        valuation_service,
        price_logger_service,
        quote_service,
        fx_service,
    })
}
