use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use common::models::{Bar, BarInsert};
use sqlx::SqlitePool;
use tracing::debug;

use crate::{db, error::StorageError, repositories::BarsRepository};

/// Read/write access to stored OHLCV bars.
#[async_trait]
pub trait BarStore: Send + Sync {
    /// Writes the bars of one symbol that are not stored yet, as one commit.
    async fn insert_missing(&self, bars: &[BarInsert]) -> Result<u64, StorageError>;

    /// Bars for `symbol` from midnight UTC `lookback_days` ago up to now,
    /// oldest first.
    async fn read(&self, symbol: &str, lookback_days: i64) -> Result<Vec<Bar>, StorageError>;
}

#[derive(Clone)]
pub struct MarketDataStore {
    pool: SqlitePool,
}

impl MarketDataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = db::connect(database_url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn count(&self, symbol: &str) -> Result<i64, StorageError> {
        BarsRepository::count(&self.pool, symbol).await
    }
}

/// Start of the read window: midnight UTC of `now`'s date, minus `lookback_days`.
pub fn window_start(now: DateTime<Utc>, lookback_days: i64) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc() - Duration::days(lookback_days.max(0))
}

#[async_trait]
impl BarStore for MarketDataStore {
    async fn insert_missing(&self, bars: &[BarInsert]) -> Result<u64, StorageError> {
        BarsRepository::insert_missing(&self.pool, bars).await
    }

    async fn read(&self, symbol: &str, lookback_days: i64) -> Result<Vec<Bar>, StorageError> {
        let now = Utc::now();
        let from = window_start(now, lookback_days);
        let bars = BarsRepository::fetch_range(&self.pool, symbol, from, now).await?;
        debug!("Read {} bars for {} since {}", bars.len(), symbol, from);
        Ok(bars)
    }
}
