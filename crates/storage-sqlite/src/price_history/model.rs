//! Database models for price samples. Timestamps are stored as naive UTC.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::utils::{decimal_to_text, parse_decimal};
use moexfolio_core::price_history::{NewPriceSample, PriceSample};
use moexfolio_core::Result;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::price_samples)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceSampleDB {
    pub id: i64,
    pub ticker: String,
    pub company_name: Option<String>,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub volume: i64,
    pub logged_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::price_samples)]
pub struct NewPriceSampleDB {
    pub ticker: String,
    pub company_name: Option<String>,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub volume: i64,
    pub logged_at: NaiveDateTime,
}

impl From<NewPriceSample> for NewPriceSampleDB {
    fn from(sample: NewPriceSample) -> Self {
        Self {
            ticker: sample.ticker,
            company_name: sample.company_name,
            price: decimal_to_text(sample.price),
            change: decimal_to_text(sample.change),
            change_percent: decimal_to_text(sample.change_percent),
            volume: sample.volume,
            logged_at: sample.logged_at.naive_utc(),
        }
    }
}

impl TryFrom<PriceSampleDB> for PriceSample {
    type Error = moexfolio_core::Error;

    fn try_from(db: PriceSampleDB) -> Result<Self> {
        Ok(Self {
            price: parse_decimal(&db.price, "price_samples.price")?,
            change: parse_decimal(&db.change, "price_samples.change")?,
            change_percent: parse_decimal(&db.change_percent, "price_samples.change_percent")?,
            id: db.id,
            ticker: db.ticker,
            company_name: db.company_name,
            volume: db.volume,
            logged_at: db.logged_at.and_utc(),
        })
    }
}
