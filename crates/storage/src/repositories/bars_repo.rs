use chrono::{DateTime, Utc};
use common::models::{Bar, BarInsert};
use sqlx::{FromRow, SqlitePool};

use crate::error::StorageError;

#[derive(FromRow)]
struct BarRow {
    id: i64,
    datetime: i64,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl TryFrom<BarRow> for Bar {
    type Error = StorageError;

    fn try_from(row: BarRow) -> Result<Self, Self::Error> {
        let datetime = DateTime::<Utc>::from_timestamp(row.datetime, 0).ok_or_else(|| {
            StorageError::CorruptRow(format!("id {} has timestamp {}", row.id, row.datetime))
        })?;

        Ok(Bar {
            id: row.id,
            symbol: row.symbol,
            datetime,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        })
    }
}

pub struct BarsRepository;

impl BarsRepository {
    /// Inserts the bars that are not stored yet, in one transaction.
    ///
    /// Returns the number of rows written. The existence check keeps the
    /// common path cheap; the unique index settles races between writers.
    pub async fn insert_missing(pool: &SqlitePool, bars: &[BarInsert]) -> Result<u64, StorageError> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for bar in bars {
            let ts = bar.datetime.timestamp();
            let existing = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM ohlcv_data WHERE symbol = ? AND datetime = ? LIMIT 1",
            )
            .bind(&bar.symbol)
            .bind(ts)
            .fetch_optional(&mut *tx)
            .await?;

            if existing.is_some() {
                continue;
            }

            let result = sqlx::query(
                r#"
                    INSERT INTO ohlcv_data (
                        datetime, symbol, open, high, low, close, volume
                    ) VALUES (?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(symbol, datetime) DO NOTHING
                "#,
            )
            .bind(ts)
            .bind(&bar.symbol)
            .bind(bar.open)
            .bind(bar.high)
            .bind(bar.low)
            .bind(bar.close)
            .bind(bar.volume)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Bars for `symbol` with `from <= datetime <= to`, oldest first.
    pub async fn fetch_range(
        pool: &SqlitePool,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, StorageError> {
        let rows = sqlx::query_as::<_, BarRow>(
            r#"
                SELECT id, datetime, symbol, open, high, low, close, volume
                FROM ohlcv_data
                WHERE symbol = ? AND datetime >= ? AND datetime <= ?
                ORDER BY datetime ASC
            "#,
        )
        .bind(symbol)
        .bind(from.timestamp())
        .bind(to.timestamp())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Bar::try_from).collect()
    }

    pub async fn count(pool: &SqlitePool, symbol: &str) -> Result<i64, StorageError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ohlcv_data WHERE symbol = ?")
                .bind(symbol)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::{Duration, TimeZone};

    fn bar(symbol: &str, day: u32, close: f64) -> BarInsert {
        BarInsert {
            symbol: symbol.to_string(),
            datetime: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1_000.0,
        }
    }

    #[tokio::test]
    async fn insert_skips_existing_bars() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let batch = vec![bar("TCS", 1, 100.0), bar("TCS", 2, 101.0)];

        assert_eq!(BarsRepository::insert_missing(&pool, &batch).await.unwrap(), 2);
        assert_eq!(BarsRepository::insert_missing(&pool, &batch).await.unwrap(), 0);

        let overlapping = vec![bar("TCS", 2, 101.0), bar("TCS", 3, 102.0)];
        assert_eq!(BarsRepository::insert_missing(&pool, &overlapping).await.unwrap(), 1);
        assert_eq!(BarsRepository::count(&pool, "TCS").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicates_inside_one_batch_are_written_once() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let batch = vec![bar("INFY", 5, 10.0), bar("INFY", 5, 10.0)];

        assert_eq!(BarsRepository::insert_missing(&pool, &batch).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fetch_range_filters_by_symbol_and_time() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let batch = vec![
            bar("TCS", 3, 102.0),
            bar("TCS", 1, 100.0),
            bar("TCS", 2, 101.0),
            bar("SBIN", 2, 600.0),
        ];
        BarsRepository::insert_missing(&pool, &batch).await.unwrap();

        let from = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let to = from + Duration::days(5);
        let bars = BarsRepository::fetch_range(&pool, "TCS", from, to).await.unwrap();

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![101.0, 102.0]);
        assert!(bars.iter().all(|b| b.symbol == "TCS"));
        assert_eq!(bars[0].datetime, from);
    }
}
