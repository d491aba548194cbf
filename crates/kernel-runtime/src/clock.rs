//! The scheduler's time source: the live wall clock or a deterministic
//! replay clock that advances one step at a time.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// A source of "now" for the scheduler. Live mode uses [`WallClock`];
/// backtests use [`ReplayClock`], which is stepped explicitly instead of
/// tracking real time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the real system clock. Advancing between ticks is the caller's
/// job (waiting for the next wall-clock boundary).
#[derive(Debug, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A monotonically advancing clock driven entirely by [`advance`](Self::advance)
/// calls, with no dependency on real time or a tokio runtime.
pub struct ReplayClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
    end: DateTime<Utc>,
}

impl ReplayClock {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
            end,
        }
    }

    /// Moves the clock forward by one `step`. Returns `false` once the
    /// clock has passed `end` (the backtest is over).
    pub fn advance(&self) -> bool {
        let mut current = self.current.lock();
        if *current >= self.end {
            return false;
        }
        *current += self.step;
        true
    }

    pub fn is_finished(&self) -> bool {
        *self.current.lock() >= self.end
    }
}

impl Clock for ReplayClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_replay_clock_advances_by_step() {
        let clock = ReplayClock::new(ts(0, 0), ts(0, 10), Duration::minutes(1));
        assert_eq!(clock.now(), ts(0, 0));
        assert!(clock.advance());
        assert_eq!(clock.now(), ts(0, 1));
    }

    #[test]
    fn test_replay_clock_stops_at_end() {
        let clock = ReplayClock::new(ts(0, 0), ts(0, 1), Duration::minutes(1));
        assert!(clock.advance());
        assert!(!clock.advance());
        assert!(clock.is_finished());
    }

    #[test]
    fn test_wall_clock_reads_real_time() {
        let clock = WallClock;
        let before = Utc::now();
        let now = clock.now();
        assert!(now >= before);
    }
}
