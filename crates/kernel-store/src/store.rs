//! The in-memory, time-indexed OHLCV store: insert, query, and aggregate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kernel_core::candle::{Candle, PriceSeries};
use kernel_core::interval::{self, Interval};
use kernel_core::symbol::Symbol;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::persistence::PersistenceBackend;

/// Time-indexed OHLCV container, keyed by `(symbol, interval)`.
///
/// A single [`parking_lot::RwLock`] guards the whole map: writers (streamer
/// threads) take it exclusively for the duration of an insert, readers
/// (strategy invocations) take it shared, and no caller ever observes a
/// partially applied insert, matching the store's concurrency contract.
pub struct PriceStore {
    series: RwLock<HashMap<(Symbol, Interval), PriceSeries>>,
    cap: Option<usize>,
}

impl PriceStore {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
            cap,
        }
    }

    /// Inserts `candles` into the `(symbol, interval)` series, creating it if
    /// absent. Each candle must land on an interval boundary; a mismatched
    /// candle is rejected with [`Error::BadCandle`] and the rest of the batch
    /// is still applied (the call fails overall, but prior candles in the
    /// batch remain inserted, callers that need all-or-nothing validate
    /// before calling).
    pub fn store(&self, symbol: &Symbol, interval: Interval, candles: &[Candle]) -> Result<()> {
        let mut guard = self.series.write();
        let key = (symbol.clone(), interval);
        let series = guard.entry(key).or_insert_with(|| PriceSeries::new(self.cap));
        for candle in candles {
            if !interval.is_boundary(candle.timestamp) {
                return Err(Error::BadCandle {
                    symbol: symbol.to_string(),
                    interval: interval.to_string(),
                    reason: format!("{} is not aligned to {}", candle.timestamp, interval),
                });
            }
            series.insert(*candle);
        }
        debug!(symbol = %symbol, %interval, count = candles.len(), "stored candles");
        Ok(())
    }

    /// Loads the candles in `[start, end]` for `(symbol, interval)`.
    ///
    /// If `interval` is omitted, returns the finest stored interval that has
    /// data covering the requested range. If `interval` is given but not
    /// stored while a finer interval is, the finer series is resampled
    /// on the fly (not persisted) to answer the query.
    pub fn load(
        &self,
        symbol: &Symbol,
        interval: Option<Interval>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Ok(Vec::new());
            }
        }
        let guard = self.series.read();
        match interval {
            Some(target) => {
                if let Some(series) = guard.get(&(symbol.clone(), target)) {
                    return Ok(series.range(start, end));
                }
                // Not stored at `target`; resample from the finest finer
                // interval that is stored, without persisting the result.
                for finer in Interval::ALL.into_iter().filter(|i| *i < target) {
                    if let Some(series) = guard.get(&(symbol.clone(), finer)) {
                        let resampled = interval::resample(series.as_slice(), finer, target)?;
                        let start_ts = resampled.first().map(|c| c.timestamp);
                        debug!(symbol = %symbol, from = %finer, to = %target, ?start_ts, "resampled on demand");
                        return Ok(resampled
                            .into_iter()
                            .filter(|c| start.is_none_or(|s| c.timestamp >= s))
                            .filter(|c| end.is_none_or(|e| c.timestamp <= e))
                            .collect());
                    }
                }
                Ok(Vec::new())
            }
            None => {
                for candidate in Interval::ALL {
                    if let Some(series) = guard.get(&(symbol.clone(), candidate)) {
                        let rows = series.range(start, end);
                        if !rows.is_empty() {
                            return Ok(rows);
                        }
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    /// Explicit resample from `base` to `target`, merged into the target
    /// series (as a real, persisted [`store`](Self::store) call).
    pub fn aggregate(&self, symbol: &Symbol, base: Interval, target: Interval) -> Result<()> {
        let base_candles = {
            let guard = self.series.read();
            match guard.get(&(symbol.clone(), base)) {
                Some(series) => series.as_slice().to_vec(),
                None => {
                    warn!(symbol = %symbol, %base, "aggregate requested with no base series");
                    return Ok(());
                }
            }
        };
        let resampled = interval::resample(&base_candles, base, target)?;
        if resampled.is_empty() {
            return Ok(());
        }
        self.store(symbol, target, &resampled)
    }

    /// Drops the series for `(symbol, interval)` entirely.
    pub fn reset(&self, symbol: &Symbol, interval: Interval) {
        self.series.write().remove(&(symbol.clone(), interval));
    }

    /// The `(first, last)` timestamps held for `(symbol, interval)`.
    pub fn range(&self, symbol: &Symbol, interval: Interval) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.series.read().get(&(symbol.clone(), interval))?.span()
    }

    /// The most recent candle for `(symbol, interval)`, used by the
    /// multiplexer's carry-forward substitution.
    pub fn last(&self, symbol: &Symbol, interval: Interval) -> Option<Candle> {
        self.series
            .read()
            .get(&(symbol.clone(), interval))
            .and_then(|s| s.last())
            .copied()
    }

    /// Every `(symbol, interval)` key currently held, for callers that need
    /// to snapshot or inspect the whole store rather than one series.
    pub fn keys(&self) -> Vec<(Symbol, Interval)> {
        self.series.read().keys().cloned().collect()
    }

    /// Snapshots the `(symbol, interval)` series to `backend` in its
    /// entirety. A no-op if the series doesn't exist.
    pub async fn persist(&self, symbol: &Symbol, interval: Interval, backend: &dyn PersistenceBackend) -> Result<()> {
        let candles = {
            let guard = self.series.read();
            match guard.get(&(symbol.clone(), interval)) {
                Some(series) => series.as_slice().to_vec(),
                None => return Ok(()),
            }
        };
        backend.snapshot(symbol, interval, &candles).await?;
        Ok(())
    }

    /// Snapshots every series currently held to `backend`, one call per
    /// `(symbol, interval)`.
    pub async fn persist_all(&self, backend: &dyn PersistenceBackend) -> Result<()> {
        for (symbol, interval) in self.keys() {
            self.persist(&symbol, interval, backend).await?;
        }
        Ok(())
    }

    /// Restores the `(symbol, interval)` series from `backend`, replacing
    /// whatever (if anything) is currently held for that key.
    pub async fn restore(&self, symbol: &Symbol, interval: Interval, backend: &dyn PersistenceBackend) -> Result<()> {
        let candles = backend.restore(symbol, interval).await?;
        if candles.is_empty() {
            return Ok(());
        }
        info!(%symbol, %interval, count = candles.len(), "restored series from persistence backend");
        self.store(symbol, interval, &candles)
    }

    /// Restores every `(symbol, interval)` pair in `keys` from `backend`,
    /// used at startup to repopulate the store before a live or backtest
    /// run begins.
    pub async fn restore_all(
        &self,
        keys: &[(Symbol, Interval)],
        backend: &dyn PersistenceBackend,
    ) -> Result<()> {
        for (symbol, interval) in keys {
            self.restore(symbol, *interval, backend).await?;
        }
        Ok(())
    }
}
