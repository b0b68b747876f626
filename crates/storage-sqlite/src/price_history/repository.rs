use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::model::{NewPriceSampleDB, PriceSampleDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::price_samples::dsl as samples_dsl;
use crate::utils::chunk_for_sqlite;
use moexfolio_core::price_history::{NewPriceSample, PriceHistoryRepositoryTrait, PriceSample};
use moexfolio_core::Result;

pub struct PriceHistoryRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceHistoryRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PriceHistoryRepositoryTrait for PriceHistoryRepository {
    fn get_samples(&self, ticker: &str) -> Result<Vec<PriceSample>> {
        let mut conn = get_connection(&self.pool)?;
        samples_dsl::price_samples
            .filter(samples_dsl::ticker.eq(ticker))
            .order((samples_dsl::logged_at.asc(), samples_dsl::id.asc()))
            .select(PriceSampleDB::as_select())
            .load(&mut conn)
            .into_core()?
            .into_iter()
            .map(PriceSample::try_from)
            .collect()
    }

    fn list_recent(&self, ticker: Option<&str>, limit: i64) -> Result<Vec<PriceSample>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = samples_dsl::price_samples.into_boxed();
        if let Some(ticker) = ticker {
            query = query.filter(samples_dsl::ticker.eq(ticker));
        }
        query
            .order((samples_dsl::logged_at.desc(), samples_dsl::id.desc()))
            .limit(limit.max(0))
            .select(PriceSampleDB::as_select())
            .load(&mut conn)
            .into_core()?
            .into_iter()
            .map(PriceSample::try_from)
            .collect()
    }

    async fn insert_samples(&self, samples: Vec<NewPriceSample>) -> Result<usize> {
        if samples.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewPriceSampleDB> = samples.into_iter().map(Into::into).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut inserted = 0;
                for chunk in chunk_for_sqlite(&rows) {
                    inserted += diesel::insert_into(samples_dsl::price_samples)
                        .values(chunk)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(inserted)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample(ticker: &str, day: u32) -> NewPriceSample {
        NewPriceSample {
            ticker: ticker.to_string(),
            company_name: None,
            price: dec!(61.25),
            change: dec!(-0.15),
            change_percent: dec!(-0.24),
            volume: 1200,
            logged_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        let pool = create_pool(&db_path).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let repo = PriceHistoryRepository::new(Arc::clone(&pool), spawn_writer((*pool).clone()));

        assert_eq!(repo.insert_samples(vec![]).await.unwrap(), 0);
        let inserted = repo
            .insert_samples(vec![
                sample("SU26238RMFS4", 2),
                sample("SU26238RMFS4", 1),
                sample("SBER", 3),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let bond = repo.get_samples("SU26238RMFS4").unwrap();
        assert_eq!(bond.len(), 2);
        assert!(bond[0].logged_at < bond[1].logged_at);
        assert_eq!(bond[0].price, dec!(61.25));
        assert_eq!(bond[0].change, dec!(-0.15));

        let recent = repo.list_recent(None, 2).unwrap();
        let tickers: Vec<&str> = recent.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["SBER", "SU26238RMFS4"]);
        assert_eq!(recent[1].logged_at, Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap());

        assert_eq!(repo.list_recent(Some("SBER"), 10).unwrap().len(), 1);
    }
}
