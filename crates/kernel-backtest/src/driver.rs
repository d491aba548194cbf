//! Replays pre-loaded price history through a [`Scheduler`] on a
//! deterministic clock instead of real time.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_runtime::clock::ReplayClock;
use kernel_runtime::scheduler::Scheduler;
use kernel_store::PriceStore;
use tracing::info;

use crate::error::{Error, Result};

/// Drives a [`Scheduler`] through a fixed `[start, end]` window, one
/// `poll_interval` step at a time, reading candles from an already-loaded
/// [`PriceStore`] instead of a live streamer.
pub struct BacktestDriver {
    scheduler: Scheduler,
    store: std::sync::Arc<PriceStore>,
    clock: ReplayClock,
    poll_interval: Duration,
    watchlist: Vec<(kernel_core::symbol::Symbol, Interval)>,
}

impl BacktestDriver {
    /// Validates that every symbol the scheduler's bindings need has
    /// history covering `[start, end]`, pre-computes declared aggregations
    /// from the finest stored interval, and returns a driver ready to
    /// [`run`](Self::run).
    pub fn setup(
        scheduler: Scheduler,
        store: std::sync::Arc<PriceStore>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let watchlist = scheduler.watchlist_intervals();

        for (symbol, interval) in &watchlist {
            match store.range(symbol, *interval) {
                Some((have_start, have_end)) if have_start <= start && have_end >= end => {}
                Some((have_start, have_end)) => {
                    return Err(Error::InsufficientHistory {
                        symbol: symbol.to_string(),
                        interval: interval.to_string(),
                        have_start: have_start.to_rfc3339(),
                        have_end: have_end.to_rfc3339(),
                        need_start: start.to_rfc3339(),
                        need_end: end.to_rfc3339(),
                    });
                }
                None => {
                    return Err(Error::InsufficientHistory {
                        symbol: symbol.to_string(),
                        interval: interval.to_string(),
                        have_start: "none".to_string(),
                        have_end: "none".to_string(),
                        need_start: start.to_rfc3339(),
                        need_end: end.to_rfc3339(),
                    });
                }
            }
        }

        let finest_by_symbol: HashMap<_, _> = watchlist.iter().cloned().collect();
        let bindings: Vec<_> = scheduler.bindings().cloned().collect();
        for binding in &bindings {
            for agg in &binding.aggregations {
                for symbol in &binding.watchlist {
                    let base = finest_by_symbol.get(symbol).copied().unwrap_or(binding.interval);
                    store.aggregate(symbol, base, *agg)?;
                }
            }
        }

        info!(start = %start, end = %end, symbols = watchlist.len(), "backtest window resolved");

        Ok(Self {
            scheduler,
            store,
            clock: ReplayClock::new(start, end, poll_interval),
            poll_interval,
            watchlist,
        })
    }

    /// Like [`setup`](Self::setup), but first restores each watchlist
    /// series from `backend` (a file cache or durable backing) before
    /// validating the `[start, end]` window, per §4.9: backtest history
    /// may come "from a file cache or a streamer" rather than always
    /// being pre-loaded by the caller.
    pub async fn setup_with_backend(
        scheduler: Scheduler,
        store: std::sync::Arc<PriceStore>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        poll_interval: Duration,
        backend: &dyn kernel_store::PersistenceBackend,
    ) -> Result<Self> {
        let watchlist = scheduler.watchlist_intervals();
        store.restore_all(&watchlist, backend).await?;
        Self::setup(scheduler, store, start, end, poll_interval)
    }

    /// Runs the scheduler to completion: one tick per `poll_interval` step,
    /// until the clock reaches `end` or every strategy has crashed. This is
    /// a plain synchronous loop, `futures::executor::block_on` drives each
    /// tick's future to completion without requiring a tokio reactor, since
    /// the paper broker's async trait methods never actually await I/O.
    pub fn run(&mut self) -> Result<()> {
        futures::executor::block_on(self.scheduler.setup_all(self.clock.now()))?;

        loop {
            let now = self.clock.now();
            let mut snapshot: HashMap<kernel_core::symbol::Symbol, Candle> = HashMap::new();
            for (symbol, interval) in &self.watchlist {
                if let Ok(candles) = self.store.load(symbol, Some(*interval), Some(now), Some(now)) {
                    if let Some(candle) = candles.into_iter().find(|c| c.timestamp == now) {
                        snapshot.insert(symbol.clone(), candle);
                    }
                }
            }

            futures::executor::block_on(self.scheduler.tick(now, snapshot))?;

            if self.scheduler.is_empty() {
                info!("backtest stopped: no bound strategies remain");
                break;
            }
            if !self.clock.advance() {
                break;
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
