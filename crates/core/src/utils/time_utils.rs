use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::constants::TRADE_DATE_FORMATS;
use crate::errors::{Result, ValidationError};

/// Default timezone for valuation dates.
/// Trades, price samples and "today" are all Moscow Exchange wall-clock time.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::Europe::Moscow;

/// Converts a UTC instant to a valuation date in the given timezone.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Current wall-clock time in the valuation timezone.
pub fn valuation_now() -> NaiveDateTime {
    Utc::now().with_timezone(&DEFAULT_VALUATION_TZ).naive_local()
}

/// Midnight of the valuation day containing `instant`, as a UTC instant.
pub fn start_of_valuation_day(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let midnight = valuation_date_from_utc(instant, tz).and_time(NaiveTime::MIN);
    local_to_utc(midnight, tz)
}

/// Interprets a wall-clock time in `tz`. On DST gaps the earliest valid
/// instant is used; Moscow has none since 2014 but other zones might.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// Parses a trade date entered as `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.
pub fn parse_trade_date(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, TRADE_DATE_FORMATS[0]) {
        return Ok(dt);
    }
    match NaiveDate::parse_from_str(input, TRADE_DATE_FORMATS[1]) {
        Ok(date) => Ok(date.and_time(NaiveTime::MIN)),
        Err(_) => Err(ValidationError::InvalidInput(format!(
            "Invalid trade date '{}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS",
            input
        ))
        .into()),
    }
}

/// Parses a `YYYY-MM-DD` filter bound.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(input.trim(), TRADE_DATE_FORMATS[1])?)
}
