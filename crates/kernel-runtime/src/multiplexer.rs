//! Assembles a consistent, same-timestamp snapshot across every watched
//! symbol before handing it to the scheduler, tolerating a streamer that
//! delivers symbols one at a time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use kernel_broker::adapter::SnapshotCallback;
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::symbol::Symbol;
use kernel_store::PriceStore;
use parking_lot::Mutex;
use tracing::warn;

/// The default flush-timeout: how long the multiplexer waits for a
/// straggling symbol before carrying forward its last known candle.
pub const DEFAULT_FLUSH_TIMEOUT: StdDuration = StdDuration::from_secs(1);

struct TickState {
    tick_ts: Option<DateTime<Utc>>,
    needed: HashSet<Symbol>,
    snapshot: HashMap<Symbol, Candle>,
    generation: u64,
}

impl Default for TickState {
    fn default() -> Self {
        Self {
            tick_ts: None,
            needed: HashSet::new(),
            snapshot: HashMap::new(),
            generation: 0,
        }
    }
}

/// Collects per-symbol candle deliveries for one tick and flushes once every
/// symbol whose interval fires at that timestamp has reported in, or once
/// the flush timeout elapses (whichever comes first).
pub struct TickMultiplexer {
    watchlist: Vec<(Symbol, Interval)>,
    flush_timeout: StdDuration,
    store: Arc<PriceStore>,
    state: Mutex<TickState>,
    on_flush: SnapshotCallback,
}

impl TickMultiplexer {
    pub fn new(
        watchlist: Vec<(Symbol, Interval)>,
        flush_timeout: StdDuration,
        store: Arc<PriceStore>,
        on_flush: SnapshotCallback,
    ) -> Arc<Self> {
        Arc::new(Self {
            watchlist,
            flush_timeout,
            store,
            state: Mutex::new(TickState::default()),
            on_flush,
        })
    }

    /// Delivers one symbol's candle for the current tick. May trigger an
    /// immediate flush (quorum reached) or schedule a flush-timeout task.
    pub fn deliver(self: &Arc<Self>, symbol: Symbol, candle: Candle) {
        let mut flushed = None;
        let mut schedule_timeout = None;

        {
            let mut state = self.state.lock();
            if state.tick_ts.is_none() {
                let ts = candle.timestamp;
                state.tick_ts = Some(ts);
                state.needed = self
                    .watchlist
                    .iter()
                    .filter(|(_, interval)| interval.is_boundary(ts))
                    .map(|(s, _)| s.clone())
                    .collect();
                schedule_timeout = Some((ts, state.generation));
            }
            state.snapshot.insert(symbol.clone(), candle);
            state.needed.remove(&symbol);

            if state.needed.is_empty() {
                let ts = state.tick_ts.take().expect("tick_ts set above");
                let snapshot = std::mem::take(&mut state.snapshot);
                state.generation += 1;
                flushed = Some((ts, snapshot));
                schedule_timeout = None;
            }
        }

        if let Some((ts, snapshot)) = flushed {
            (self.on_flush)(ts, snapshot);
            return;
        }

        if let Some((ts, generation)) = schedule_timeout {
            let this = Arc::clone(self);
            let timeout = self.flush_timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                this.flush_on_timeout(ts, generation);
            });
        }
    }

    /// Fires when the flush-timeout task wakes. A no-op if the tick already
    /// flushed on quorum (tracked via `generation`).
    fn flush_on_timeout(self: &Arc<Self>, tick_ts: DateTime<Utc>, generation: u64) {
        let (snapshot, stale_symbols) = {
            let mut state = self.state.lock();
            if state.generation != generation || state.tick_ts != Some(tick_ts) {
                return;
            }
            let stale: Vec<Symbol> = state.needed.iter().cloned().collect();
            let snapshot = std::mem::take(&mut state.snapshot);
            state.tick_ts = None;
            state.needed.clear();
            state.generation += 1;
            (snapshot, stale)
        };

        let mut snapshot = snapshot;
        for symbol in &stale_symbols {
            let interval = self
                .watchlist
                .iter()
                .find(|(s, _)| s == symbol)
                .map(|(_, i)| *i)
                .unwrap_or(Interval::Min1);
            match self.store.last(symbol, interval) {
                Some(last) => {
                    warn!(%symbol, %interval, tick = %tick_ts, "carry-forward: no delivery by flush timeout");
                    snapshot.insert(symbol.clone(), last.with_timestamp(tick_ts));
                }
                None => {
                    warn!(%symbol, %interval, tick = %tick_ts, "carry-forward: no prior candle to substitute");
                }
            }
        }

        (self.on_flush)(tick_ts, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::Mutex as StdMutex;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn ts(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap()
    }

    fn candle(m: u32) -> Candle {
        let v = dec!(1);
        Candle::new(ts(m), v, v, v, v, dec!(1)).unwrap()
    }

    #[tokio::test]
    async fn test_flushes_on_full_quorum() {
        let store = Arc::new(PriceStore::new(None));
        let flushed: Arc<StdMutex<Vec<(DateTime<Utc>, usize)>>> = Arc::new(StdMutex::new(Vec::new()));
        let flushed_clone = Arc::clone(&flushed);
        let callback: SnapshotCallback = Arc::new(move |ts, snapshot| {
            flushed_clone.lock().unwrap().push((ts, snapshot.len()));
        });

        let watchlist = vec![(sym("AAPL"), Interval::Min1), (sym("MSFT"), Interval::Min1)];
        let mux = TickMultiplexer::new(watchlist, DEFAULT_FLUSH_TIMEOUT, store, callback);

        mux.deliver(sym("AAPL"), candle(0));
        assert!(flushed.lock().unwrap().is_empty());
        mux.deliver(sym("MSFT"), candle(0));

        let recorded = flushed.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].1, 2);
    }

    #[tokio::test]
    async fn test_carries_forward_on_timeout() {
        let store = Arc::new(PriceStore::new(None));
        store.store(&sym("MSFT"), Interval::Min1, &[candle(0)]).unwrap();

        let flushed: Arc<StdMutex<Vec<(DateTime<Utc>, usize)>>> = Arc::new(StdMutex::new(Vec::new()));
        let flushed_clone = Arc::clone(&flushed);
        let callback: SnapshotCallback = Arc::new(move |ts, snapshot| {
            flushed_clone.lock().unwrap().push((ts, snapshot.len()));
        });

        let watchlist = vec![(sym("AAPL"), Interval::Min1), (sym("MSFT"), Interval::Min1)];
        let mux = TickMultiplexer::new(
            watchlist,
            StdDuration::from_millis(20),
            store,
            callback,
        );

        mux.deliver(sym("AAPL"), candle(1));
        tokio::time::sleep(StdDuration::from_millis(60)).await;

        let recorded = flushed.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].1, 2);
    }
}
