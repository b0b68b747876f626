//! Moscow Exchange ISS client.
//!
//! Documentation: <https://www.moex.com/a2193>
//!
//! Quotes are cached per `(board, ticker)` for a couple of seconds; a portfolio
//! page that lists the same ticker twice, or the price logger running right
//! after a valuation, should not hit ISS again.

mod models;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{Board, MoexQuote, MoexSecurity};

use models::{IssRow, IssSecurityResponse};

/// Provider ID constant
const PROVIDER_ID: &str = "MOEX_ISS";

/// Public ISS endpoint.
pub const DEFAULT_ISS_URL: &str = "https://iss.moex.com/iss";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a fetched quote is served from memory.
const CACHE_TTL: Duration = Duration::from_secs(2);

const SECURITY_COLUMNS: &str =
    "SECID,BOARDID,SHORTNAME,SECNAME,PREVPRICE,FACEVALUE,FACEUNIT,LOTSIZE";
const MARKETDATA_COLUMNS: &str = "SECID,BOARDID,LAST,OPEN,CHANGE,LASTTOPREVPRICE,VALTODAY,VOLTODAY";

/// Client for `/engines/stock/markets/{shares|bonds}/securities/{ticker}.json`.
pub struct MoexIssClient {
    client: Client,
    base_url: String,
    cache: RwLock<HashMap<(Board, String), (Instant, MoexQuote)>>,
}

impl Default for MoexIssClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MoexIssClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ISS_URL)
    }

    /// Create a client against a different ISS root (mirrors, test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Latest price for `ticker` on `board`.
    pub async fn get_quote(&self, ticker: &str, board: Board) -> Result<MoexQuote, MarketDataError> {
        let ticker = ticker.trim().to_uppercase();
        let key = (board, ticker.clone());

        if let Some((fetched_at, quote)) = self.cache.read().await.get(&key) {
            if fetched_at.elapsed() < CACHE_TTL {
                debug!("Serving cached ISS quote for {}", ticker);
                return Ok(quote.clone());
            }
        }

        let response = self
            .request(
                &ticker,
                board,
                &[
                    ("iss.only", "securities,marketdata"),
                    ("securities.columns", SECURITY_COLUMNS),
                    ("marketdata.columns", MARKETDATA_COLUMNS),
                ],
            )
            .await?;

        let quote = parse_quote(&ticker, board, &response, Utc::now())?;
        self.cache
            .write()
            .await
            .insert(key, (Instant::now(), quote.clone()));
        Ok(quote)
    }

    /// Names, nominal and lot size for `ticker` on `board`.
    pub async fn get_security(
        &self,
        ticker: &str,
        board: Board,
    ) -> Result<MoexSecurity, MarketDataError> {
        let ticker = ticker.trim().to_uppercase();
        let response = self
            .request(
                &ticker,
                board,
                &[
                    ("iss.only", "securities"),
                    ("securities.columns", SECURITY_COLUMNS),
                ],
            )
            .await?;
        parse_security(&ticker, &response)
    }

    async fn request(
        &self,
        ticker: &str,
        board: Board,
        params: &[(&str, &str)],
    ) -> Result<IssSecurityResponse, MarketDataError> {
        let url = format!(
            "{}/engines/stock/markets/{}/securities/{}.json",
            self.base_url,
            board.market(),
            ticker
        );

        let response = self
            .client
            .get(&url)
            .query(&[("iss.meta", "off")])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(MarketDataError::SymbolNotFound(ticker.to_string())),
            status if !status.is_success() => {
                warn!("ISS returned {} for {}", status, url);
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("HTTP {}", status),
                });
            }
            _ => {}
        }

        response
            .json::<IssSecurityResponse>()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })
    }
}

/// ISS reports rouble nominals as `SUR`.
fn normalize_face_unit(unit: &str) -> String {
    match unit.trim().to_uppercase().as_str() {
        "SUR" | "RUR" => "RUB".to_string(),
        other => other.to_string(),
    }
}

fn parse_quote(
    ticker: &str,
    board: Board,
    response: &IssSecurityResponse,
    now: DateTime<Utc>,
) -> Result<MoexQuote, MarketDataError> {
    if response.securities.is_empty() && response.marketdata.is_empty() {
        return Err(MarketDataError::SymbolNotFound(ticker.to_string()));
    }

    // The freshest board is the last row that actually traded.
    let marketdata = response
        .marketdata
        .rows()
        .rev()
        .find(|row| row.get("LAST").is_some());
    let board_id = marketdata.and_then(|row| row.string("BOARDID"));
    let security = pick_security_row(response, board_id.as_deref());

    let price = marketdata
        .and_then(|row| row.decimal("LAST"))
        .or_else(|| security.and_then(|row| row.decimal("PREVPRICE")))
        .ok_or_else(|| MarketDataError::NoPrice(ticker.to_string()))?;

    let change = marketdata
        .and_then(|row| {
            row.decimal("CHANGE")
                .or_else(|| row.decimal("LASTTOPREVPRICE"))
        })
        .unwrap_or(Decimal::ZERO);
    let open = marketdata.and_then(|row| row.decimal("OPEN"));

    let change_percent = match open {
        Some(open) if open > Decimal::ZERO => change / open * Decimal::ONE_HUNDRED,
        _ if price > Decimal::ZERO && !change.is_zero() => change / price * Decimal::ONE_HUNDRED,
        _ => Decimal::ZERO,
    };

    let volume = marketdata
        .and_then(|row| row.integer("VALTODAY").or_else(|| row.integer("VOLTODAY")))
        .unwrap_or(0);

    Ok(MoexQuote {
        ticker: ticker.to_string(),
        board,
        price,
        change: change.round_dp(2),
        change_percent: change_percent.round_dp(2),
        volume,
        face_value: security.and_then(|row| row.decimal("FACEVALUE")),
        face_currency: security
            .and_then(|row| row.string("FACEUNIT"))
            .map(|unit| normalize_face_unit(&unit)),
        lot_size: security
            .and_then(|row| row.integer("LOTSIZE"))
            .and_then(|v| i32::try_from(v).ok()),
        as_of: now,
    })
}

fn parse_security(
    ticker: &str,
    response: &IssSecurityResponse,
) -> Result<MoexSecurity, MarketDataError> {
    let row = pick_security_row(response, None)
        .ok_or_else(|| MarketDataError::SymbolNotFound(ticker.to_string()))?;

    Ok(MoexSecurity {
        ticker: row.string("SECID").unwrap_or_else(|| ticker.to_string()),
        name: row.string("SECNAME"),
        short_name: row.string("SHORTNAME"),
        face_value: row.decimal("FACEVALUE"),
        face_currency: row.string("FACEUNIT").map(|unit| normalize_face_unit(&unit)),
        lot_size: row
            .integer("LOTSIZE")
            .and_then(|v| i32::try_from(v).ok()),
    })
}

fn pick_security_row<'a>(
    response: &'a IssSecurityResponse,
    board_id: Option<&str>,
) -> Option<IssRow<'a>> {
    board_id
        .and_then(|board_id| {
            response
                .securities
                .rows()
                .find(|row| row.string("BOARDID").as_deref() == Some(board_id))
        })
        .or_else(|| response.securities.rows().last())
}
