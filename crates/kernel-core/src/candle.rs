//! OHLCV candles and the append-only, interval-aligned series that holds them.

use crate::error::{Error, Result};
use crate::types::Decimal;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One bar of trading activity: open, high, low, close, volume.
///
/// `timestamp` is always UTC and truncated to the minute; conversion to a
/// user-visible timezone happens only at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self> {
        let candle = Self {
            timestamp: timestamp
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(timestamp),
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Rejects NaN/infinite OHLC values and an inverted high/low range.
    ///
    /// This is the **BadCandle** check from the store contract: callers
    /// that insert a malformed candle get this error back instead of a
    /// silently corrupted series.
    pub fn validate(&self) -> Result<()> {
        if self.volume.is_sign_negative() {
            return Err(Error::Internal(format!(
                "bad candle at {}: negative volume {}",
                self.timestamp, self.volume
            )));
        }
        if self.high < self.low {
            return Err(Error::Internal(format!(
                "bad candle at {}: high {} < low {}",
                self.timestamp, self.high, self.low
            )));
        }
        Ok(())
    }

    /// Rewrites this candle's timestamp, used by the tick multiplexer's
    /// carry-forward substitution.
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }
}

/// A time-indexed, append-only sequence of candles for one (symbol, interval).
///
/// Invariants: strictly increasing timestamps; inserts at an existing
/// timestamp overwrite (last-write-wins); an optional cap evicts the oldest
/// candles once exceeded.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    candles: Vec<Candle>,
    cap: Option<usize>,
}

impl PriceSeries {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            candles: Vec::new(),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    /// Inserts a candle, overwriting any existing candle at the same
    /// timestamp, keeping the series sorted, and applying the cap.
    pub fn insert(&mut self, candle: Candle) {
        match self
            .candles
            .binary_search_by_key(&candle.timestamp, |c| c.timestamp)
        {
            Ok(idx) => self.candles[idx] = candle,
            Err(idx) => self.candles.insert(idx, candle),
        }
        if let Some(cap) = self.cap {
            while self.candles.len() > cap {
                self.candles.remove(0);
            }
        }
    }

    /// Returns the contiguous slice of candles within `[start, end]`
    /// (inclusive). An inverted range yields an empty slice.
    pub fn range(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Vec<Candle> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Vec::new();
            }
        }
        self.candles
            .iter()
            .filter(|c| start.is_none_or(|s| c.timestamp >= s))
            .filter(|c| end.is_none_or(|e| c.timestamp <= e))
            .copied()
            .collect()
    }

    /// The (first, last) timestamps in the series, if non-empty.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.candles.first(), self.candles.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap()
    }

    fn candle(minute: u32, close: Decimal) -> Candle {
        Candle::new(ts(minute), close, close, close, close, dec!(1)).unwrap()
    }

    #[test]
    fn test_insert_maintains_order() {
        let mut series = PriceSeries::new(None);
        series.insert(candle(2, dec!(2)));
        series.insert(candle(0, dec!(0)));
        series.insert(candle(1, dec!(1)));
        let closes: Vec<_> = series.as_slice().iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![dec!(0), dec!(1), dec!(2)]);
    }

    #[test]
    fn test_insert_overwrites_same_timestamp() {
        let mut series = PriceSeries::new(None);
        series.insert(candle(0, dec!(1)));
        series.insert(candle(0, dec!(2)));
        assert_eq!(series.len(), 1);
        assert_eq!(series.as_slice()[0].close, dec!(2));
    }

    #[test]
    fn test_idempotent_store() {
        let mut a = PriceSeries::new(None);
        a.insert(candle(0, dec!(5)));
        a.insert(candle(0, dec!(5)));
        let mut b = PriceSeries::new(None);
        b.insert(candle(0, dec!(5)));
        assert_eq!(a.len(), b.len());
        assert_eq!(a.as_slice()[0], b.as_slice()[0]);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut series = PriceSeries::new(Some(2));
        series.insert(candle(0, dec!(0)));
        series.insert(candle(1, dec!(1)));
        series.insert(candle(2, dec!(2)));
        assert_eq!(series.len(), 2);
        assert_eq!(series.as_slice()[0].close, dec!(1));
    }

    #[test]
    fn test_range_inverted_is_empty() {
        let mut series = PriceSeries::new(None);
        series.insert(candle(0, dec!(0)));
        assert!(series.range(Some(ts(5)), Some(ts(0))).is_empty());
    }

    #[test]
    fn test_bad_candle_negative_volume_rejected() {
        let err = Candle::new(ts(0), dec!(1), dec!(1), dec!(1), dec!(1), dec!(-1));
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_candle_inverted_high_low_rejected() {
        let err = Candle::new(ts(0), dec!(1), dec!(1), dec!(2), dec!(1), dec!(1));
        assert!(err.is_err());
    }
}
