//! Canonical time cadences, their boundary predicates, and OHLCV resampling.

use crate::candle::Candle;
use crate::error::{Error, Result};
use crate::types::Decimal;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The default end-of-session minute-of-day (UTC) used as the 1-day boundary.
///
/// The source this kernel is modeled on hard-codes a single UTC minute
/// rather than deriving one from a venue calendar; this keeps that
/// simplification instead of threading a calendar through every call site.
pub const DEFAULT_DAY_BOUNDARY_MINUTE_OF_DAY: u32 = 20 * 60; // 20:00 UTC

/// A closed, totally ordered enumeration of supported cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interval {
    Sec15,
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Day1,
}

impl Interval {
    pub const ALL: [Interval; 7] = [
        Interval::Sec15,
        Interval::Min1,
        Interval::Min5,
        Interval::Min15,
        Interval::Min30,
        Interval::Hour1,
        Interval::Day1,
    ];

    /// The wall-clock duration of one bar of this interval.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::Sec15 => Duration::seconds(15),
            Interval::Min1 => Duration::minutes(1),
            Interval::Min5 => Duration::minutes(5),
            Interval::Min15 => Duration::minutes(15),
            Interval::Min30 => Duration::minutes(30),
            Interval::Hour1 => Duration::hours(1),
            Interval::Day1 => Duration::days(1),
        }
    }

    /// True iff `ts` falls on a firing boundary of this interval.
    ///
    /// Contract: this must agree with [`resample`], a candle at timestamp
    /// `t` in the coarser interval exists iff `is_boundary(t, i_to)` holds.
    pub fn is_boundary(&self, ts: DateTime<Utc>) -> bool {
        self.is_boundary_with_day_end(ts, DEFAULT_DAY_BOUNDARY_MINUTE_OF_DAY)
    }

    /// [`is_boundary`] with an explicit day-end minute-of-day (UTC), for
    /// venues whose session close is not the kernel default.
    pub fn is_boundary_with_day_end(&self, ts: DateTime<Utc>, day_end_minute_of_day: u32) -> bool {
        match self {
            Interval::Sec15 => ts.second() % 15 == 0,
            Interval::Min1 => ts.second() == 0,
            Interval::Min5 => ts.second() == 0 && ts.minute() % 5 == 0,
            Interval::Min15 => ts.second() == 0 && ts.minute() % 15 == 0,
            Interval::Min30 => ts.second() == 0 && ts.minute() % 30 == 0,
            Interval::Hour1 => ts.second() == 0 && ts.minute() == 0,
            Interval::Day1 => {
                ts.second() == 0 && (ts.hour() * 60 + ts.minute()) == day_end_minute_of_day
            }
        }
    }

    /// Truncates `ts` down to the start of the bucket of this interval that
    /// contains it (used by [`resample`]).
    fn bucket_start(&self, ts: DateTime<Utc>, day_end_minute_of_day: u32) -> DateTime<Utc> {
        match self {
            Interval::Sec15 => {
                let rem = ts.second() % 15;
                ts - Duration::seconds(rem as i64)
            }
            Interval::Min1 => ts.with_second(0).unwrap(),
            Interval::Min5 => {
                let rem = ts.minute() % 5;
                ts.with_second(0).unwrap() - Duration::minutes(rem as i64)
            }
            Interval::Min15 => {
                let rem = ts.minute() % 15;
                ts.with_second(0).unwrap() - Duration::minutes(rem as i64)
            }
            Interval::Min30 => {
                let rem = ts.minute() % 30;
                ts.with_second(0).unwrap() - Duration::minutes(rem as i64)
            }
            Interval::Hour1 => ts.with_minute(0).unwrap().with_second(0).unwrap(),
            Interval::Day1 => {
                let minute_of_day = ts.hour() * 60 + ts.minute();
                let midnight = ts
                    .with_hour(0)
                    .unwrap()
                    .with_minute(0)
                    .unwrap()
                    .with_second(0)
                    .unwrap();
                if minute_of_day >= day_end_minute_of_day {
                    midnight + Duration::minutes(day_end_minute_of_day as i64)
                } else {
                    midnight + Duration::minutes(day_end_minute_of_day as i64) - Duration::days(1)
                }
            }
        }
    }

    /// The bucket boundary timestamp (the *end* of the bucket, matching
    /// [`is_boundary`]) that `ts` belongs to for this interval.
    fn bucket_end(&self, ts: DateTime<Utc>, day_end_minute_of_day: u32) -> DateTime<Utc> {
        self.bucket_start(ts, day_end_minute_of_day) + self.duration()
    }

    /// The canonical user-facing string for this interval.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Sec15 => "15SEC",
            Interval::Min1 => "1MIN",
            Interval::Min5 => "5MIN",
            Interval::Min15 => "15MIN",
            Interval::Min30 => "30MIN",
            Interval::Hour1 => "1HR",
            Interval::Day1 => "1DAY",
        }
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "15SEC" => Ok(Interval::Sec15),
            "1MIN" => Ok(Interval::Min1),
            "5MIN" => Ok(Interval::Min5),
            "15MIN" => Ok(Interval::Min15),
            "30MIN" => Ok(Interval::Min30),
            "1HR" => Ok(Interval::Hour1),
            "1DAY" => Ok(Interval::Day1),
            other => Err(Error::InvalidInterval(other.to_string())),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resamples `candles` (assumed to be at `from`) up into `to`-interval
/// candles: open=first, high=max, low=min, close=last, volume=sum per
/// bucket. A bucket is only emitted once it holds exactly the number of
/// `from`-candles its duration implies; a trailing, partially filled
/// bucket is dropped as incomplete.
pub fn resample(candles: &[Candle], from: Interval, to: Interval) -> Result<Vec<Candle>> {
    if to <= from {
        return Err(Error::Internal(format!(
            "resample target {:?} must be coarser than source {:?}",
            to, from
        )));
    }
    if candles.is_empty() {
        return Ok(Vec::new());
    }

    let expected_count = to.duration().num_milliseconds() / from.duration().num_milliseconds();
    let day_end = DEFAULT_DAY_BOUNDARY_MINUTE_OF_DAY;

    let mut out = Vec::new();
    let mut current_start = to.bucket_start(candles[0].timestamp, day_end);
    let mut group: Vec<&Candle> = Vec::new();

    for candle in candles {
        let bucket_start = to.bucket_start(candle.timestamp, day_end);
        if bucket_start != current_start {
            flush_bucket(&group, to.bucket_end(current_start, day_end), expected_count, &mut out);
            group.clear();
            current_start = bucket_start;
        }
        group.push(candle);
    }
    flush_bucket(&group, to.bucket_end(current_start, day_end), expected_count, &mut out);

    Ok(out)
}

fn flush_bucket(group: &[&Candle], ts: DateTime<Utc>, expected_count: i64, out: &mut Vec<Candle>) {
    if group.is_empty() || group.len() as i64 != expected_count {
        return;
    }
    let open = group[0].open;
    let close = group[group.len() - 1].close;
    let high = group.iter().map(|c| c.high).fold(group[0].high, |a, b| a.max(b));
    let low = group.iter().map(|c| c.low).fold(group[0].low, |a, b| a.min(b));
    let volume = group.iter().map(|c| c.volume).sum();
    if let Ok(candle) = Candle::new(ts, open, high, low, close, volume) {
        out.push(candle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_ordering() {
        assert!(Interval::Sec15 < Interval::Min1);
        assert!(Interval::Min1 < Interval::Day1);
    }

    #[test]
    fn test_is_boundary_min5() {
        assert!(Interval::Min5.is_boundary(ts(0, 5)));
        assert!(!Interval::Min5.is_boundary(ts(0, 6)));
    }

    #[test]
    fn test_is_boundary_min1_always_true_on_minute() {
        assert!(Interval::Min1.is_boundary(ts(3, 17)));
    }

    #[test]
    fn test_interval_string_round_trip() {
        for i in Interval::ALL {
            let s = i.as_str();
            let parsed: Interval = s.parse().unwrap();
            assert_eq!(i, parsed);
        }
    }

    #[test]
    fn test_invalid_interval_string() {
        assert!("2MIN".parse::<Interval>().is_err());
    }

    #[test]
    fn test_aggregation_one_hour_from_60_minutes() {
        // Scenario 4: 60 consecutive 1-minute candles, closes = minute index.
        let mut candles = Vec::new();
        for minute in 0..60u32 {
            let close = Decimal::from(minute);
            candles.push(
                Candle::new(ts(0, minute), close, close, close, close, dec!(1)).unwrap(),
            );
        }
        let hourly = resample(&candles, Interval::Min1, Interval::Hour1).unwrap();
        assert_eq!(hourly.len(), 1);
        let bar = hourly[0];
        assert_eq!(bar.open, dec!(0));
        assert_eq!(bar.high, dec!(59));
        assert_eq!(bar.low, dec!(0));
        assert_eq!(bar.close, dec!(59));
        assert_eq!(bar.volume, dec!(60));
        assert_eq!(bar.timestamp, ts(1, 0));
    }

    #[test]
    fn test_resample_drops_incomplete_bucket() {
        let candles = vec![Candle::new(ts(0, 0), dec!(1), dec!(1), dec!(1), dec!(1), dec!(1))
            .unwrap()];
        let hourly = resample(&candles, Interval::Min1, Interval::Hour1).unwrap();
        assert!(hourly.is_empty());
    }

    #[test]
    fn test_resample_rejects_non_coarser_target() {
        assert!(resample(&[], Interval::Min5, Interval::Min1).is_err());
    }
}
