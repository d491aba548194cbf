//! Durable backing for the price store: snapshot/restore a series by
//! `(symbol, interval)`, via a file-per-series backend or a SQL table keyed
//! on `(timestamp, symbol, interval)`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::symbol::Symbol;
use kernel_core::types::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A durable backing a [`crate::store::PriceStore`] can snapshot to and
/// restore from. Implementors own their own I/O; the store never refers to a
/// specific backend.
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn snapshot(&self, symbol: &Symbol, interval: Interval, candles: &[Candle]) -> Result<()>;
    async fn restore(&self, symbol: &Symbol, interval: Interval) -> Result<Vec<Candle>>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CandleRow {
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

/// File-per-series backend: one CSV file per `(symbol, interval)`, named
/// `<SYMBOL>@<INTERVAL>.csv`.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, symbol: &Symbol, interval: Interval) -> PathBuf {
        self.root.join(format!("{}@{}.csv", symbol, interval))
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for FileBackend {
    async fn snapshot(&self, symbol: &Symbol, interval: Interval, candles: &[Candle]) -> Result<()> {
        let path = self.path_for(symbol, interval);
        let rows: Vec<CandleRow> = candles
            .iter()
            .map(|c| CandleRow {
                timestamp: c.timestamp,
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
                volume: c.volume,
            })
            .collect();
        let mut writer = csv::Writer::from_path(&path)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    async fn restore(&self, symbol: &Symbol, interval: Interval) -> Result<Vec<Candle>> {
        let path = self.path_for(symbol, interval);
        if !Path::new(&path).exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut out = Vec::new();
        for result in reader.deserialize::<CandleRow>() {
            let row = result?;
            out.push(Candle::new(row.timestamp, row.open, row.high, row.low, row.close, row.volume)?);
        }
        Ok(out)
    }
}

/// SQL backend: rows in a table keyed on `(timestamp, symbol, interval)`,
/// upserted on conflict, the same `ON CONFLICT ... DO UPDATE` shape the
/// teacher's Timescale storage layer uses for `market_ohlcv`.
pub struct SqlBackend {
    pool: sqlx::PgPool,
}

impl SqlBackend {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqlBackend {
    async fn snapshot(&self, symbol: &Symbol, interval: Interval, candles: &[Candle]) -> Result<()> {
        for candle in candles {
            sqlx::query(
                r#"
                INSERT INTO kernel_candles (symbol, interval, timestamp, open, high, low, close, volume)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (symbol, interval, timestamp) DO UPDATE
                SET open = EXCLUDED.open,
                    high = EXCLUDED.high,
                    low = EXCLUDED.low,
                    close = EXCLUDED.close,
                    volume = EXCLUDED.volume
                "#,
            )
            .bind(symbol.as_str())
            .bind(interval.as_str())
            .bind(candle.timestamp)
            .bind(candle.open)
            .bind(candle.high)
            .bind(candle.low)
            .bind(candle.close)
            .bind(candle.volume)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn restore(&self, symbol: &Symbol, interval: Interval) -> Result<Vec<Candle>> {
        let rows: Vec<CandleRow> = sqlx::query_as(
            r#"
            SELECT timestamp, open, high, low, close, volume
            FROM kernel_candles
            WHERE symbol = $1 AND interval = $2
            ORDER BY timestamp ASC
            "#,
        )
        .bind(symbol.as_str())
        .bind(interval.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Ok(Candle::new(r.timestamp, r.open, r.high, r.low, r.close, r.volume)?))
            .collect()
    }
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for CandleRow {
    fn from_row(row: &sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(CandleRow {
            timestamp: row.try_get("timestamp")?,
            open: row.try_get("open")?,
            high: row.try_get("high")?,
            low: row.try_get("low")?,
            close: row.try_get("close")?,
            volume: row.try_get("volume")?,
        })
    }
}
