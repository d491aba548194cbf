//! Drives strategy bindings through ticks: store writes, aggregation,
//! fill polling, then sequential strategy invocation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use kernel_broker::adapter::BrokerAdapter;
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::models::StrategyBinding;
use kernel_core::symbol::Symbol;
use kernel_store::PriceStore;
use kernel_strategy::context::RuntimeContext;
use kernel_strategy::strategy::{Strategy, StrategyConfig};
use tracing::{error, info};

use crate::error::Result;

/// Invoked once per tick, for every interval firing that tick, so a paper
/// broker (or any adapter with local fill simulation) can settle open
/// orders against the candle the scheduler just stored. Live adapters that
/// resolve fills on the exchange side can leave this unset.
pub type FillPoller = Arc<dyn Fn(Interval, DateTime<Utc>) + Send + Sync>;

struct BoundStrategy {
    strategy: Box<dyn Strategy>,
    binding: StrategyBinding,
}

/// The tick loop's strategy table, price store, and broker handle. One
/// `Scheduler` drives every strategy bound to it sequentially, on a single
/// logical thread regardless of whether it's fed by the live wall clock or
/// a backtest's replay clock.
pub struct Scheduler {
    store: Arc<PriceStore>,
    broker: Arc<dyn BrokerAdapter>,
    exchange_tz: Tz,
    bindings: Vec<BoundStrategy>,
    fill_poller: Option<FillPoller>,
}

impl Scheduler {
    pub fn new(store: Arc<PriceStore>, broker: Arc<dyn BrokerAdapter>, exchange_tz: Tz) -> Self {
        Self {
            store,
            broker,
            exchange_tz,
            bindings: Vec::new(),
            fill_poller: None,
        }
    }

    pub fn set_fill_poller(&mut self, poller: FillPoller) {
        self.fill_poller = Some(poller);
    }

    /// Declares a strategy's binding (from its `config()`) and adds it to
    /// the table. Returns the validated [`StrategyBinding`] error if the
    /// strategy's aggregations are malformed.
    pub fn bind(&mut self, strategy: Box<dyn Strategy>) -> Result<()> {
        let config = strategy.config();
        let binding = StrategyBinding::new(
            strategy.name().to_string(),
            config.interval,
            config.aggregations,
            config.watchlist,
        )
        .map_err(kernel_strategy::Error::from)?;
        info!(strategy = %binding.strategy_name, interval = %binding.interval, "strategy bound");
        self.bindings.push(BoundStrategy { strategy, binding });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Calls `setup()` on every bound strategy, in binding order.
    pub async fn setup_all(&mut self, now: DateTime<Utc>) -> Result<()> {
        let store = Arc::clone(&self.store);
        let broker = Arc::clone(&self.broker);
        let exchange_tz = self.exchange_tz;
        for bound in &mut self.bindings {
            let config = StrategyConfig {
                interval: bound.binding.interval,
                aggregations: bound.binding.aggregations.clone(),
                watchlist: bound.binding.watchlist.clone(),
            };
            let ctx = RuntimeContext::new(now, exchange_tz, config, Arc::clone(&store), Arc::clone(&broker));
            if let Err(err) = bound.strategy.setup(&ctx).await {
                error!(strategy = %bound.binding.strategy_name, %err, "strategy setup failed");
                return Err(kernel_strategy::Error::StrategyCrash {
                    name: bound.binding.strategy_name.clone(),
                    phase: "setup".to_string(),
                    reason: err.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Every `(symbol, finest interval)` pair this scheduler's bindings
    /// need data for, one row per symbol, even if several strategies
    /// watch it at different cadences (the finest wins). Used to pre-load
    /// and window history for a backtest, and to build the multiplexer's
    /// watchlist.
    pub fn watchlist_intervals(&self) -> Vec<(Symbol, Interval)> {
        let mut finest: HashMap<Symbol, Interval> = HashMap::new();
        for bound in &self.bindings {
            for symbol in &bound.binding.watchlist {
                finest
                    .entry(symbol.clone())
                    .and_modify(|existing| {
                        if bound.binding.interval < *existing {
                            *existing = bound.binding.interval;
                        }
                    })
                    .or_insert(bound.binding.interval);
            }
        }
        finest.into_iter().collect()
    }

    /// Every bound strategy's declared binding, for setup-time inspection
    /// (e.g. a backtest driver pre-computing aggregations).
    pub fn bindings(&self) -> impl Iterator<Item = &StrategyBinding> {
        self.bindings.iter().map(|b| &b.binding)
    }

    /// The finest interval any bound strategy needs for `symbol`: the
    /// minimum of every binding's firing interval that watches it.
    fn finest_interval_for(&self, symbol: &Symbol) -> Option<Interval> {
        self.bindings
            .iter()
            .filter(|b| b.binding.watchlist.contains(symbol))
            .map(|b| b.binding.interval)
            .min()
    }

    /// One full tick: store the delivered snapshot, run declared
    /// aggregations, poll for fills, then invoke every strategy whose
    /// interval fires at `now`. Crashing strategies are logged and unbound;
    /// `is_empty()` tells the caller whether to keep driving the loop.
    pub async fn tick(&mut self, now: DateTime<Utc>, snapshot: HashMap<Symbol, Candle>) -> Result<()> {
        for (symbol, candle) in &snapshot {
            let finest = self.finest_interval_for(symbol).unwrap_or(Interval::Min1);
            self.store.store(symbol, finest, std::slice::from_ref(candle))?;
        }

        let mut fired_intervals: HashSet<Interval> = HashSet::new();
        for bound in &self.bindings {
            for agg in &bound.binding.aggregations {
                if agg.is_boundary(now) {
                    for symbol in &bound.binding.watchlist {
                        let base = self.finest_interval_for(symbol).unwrap_or(bound.binding.interval);
                        self.store.aggregate(symbol, base, *agg)?;
                    }
                }
            }
            if bound.binding.interval.is_boundary(now) {
                fired_intervals.insert(bound.binding.interval);
            }
        }

        if let Some(poller) = &self.fill_poller {
            for interval in &fired_intervals {
                poller(*interval, now);
            }
        }

        let mut crashed = Vec::new();
        for (idx, bound) in self.bindings.iter_mut().enumerate() {
            if !bound.binding.interval.is_boundary(now) {
                continue;
            }
            let config = StrategyConfig {
                interval: bound.binding.interval,
                aggregations: bound.binding.aggregations.clone(),
                watchlist: bound.binding.watchlist.clone(),
            };
            let ctx = RuntimeContext::new(now, self.exchange_tz, config, Arc::clone(&self.store), Arc::clone(&self.broker));
            if let Err(err) = bound.strategy.main(&ctx).await {
                error!(strategy = %bound.binding.strategy_name, %err, "strategy crashed, unbinding");
                crashed.push(idx);
            }
        }

        for idx in crashed.into_iter().rev() {
            self.bindings.remove(idx);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStrategy {
        watchlist: BTreeSet<Symbol>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Strategy for CountingStrategy {
        fn name(&self) -> &str {
            "counting"
        }

        fn config(&self) -> StrategyConfig {
            StrategyConfig {
                interval: Interval::Min1,
                aggregations: BTreeSet::new(),
                watchlist: self.watchlist.clone(),
            }
        }

        async fn setup(&mut self, _ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
            Ok(())
        }

        async fn main(&mut self, _ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CrashingStrategy;

    #[async_trait]
    impl Strategy for CrashingStrategy {
        fn name(&self) -> &str {
            "crasher"
        }

        fn config(&self) -> StrategyConfig {
            StrategyConfig {
                interval: Interval::Min1,
                aggregations: BTreeSet::new(),
                watchlist: BTreeSet::new(),
            }
        }

        async fn setup(&mut self, _ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
            Ok(())
        }

        async fn main(&mut self, _ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
            Err(kernel_strategy::Error::StrategyCrash {
                name: "crasher".to_string(),
                phase: "main".to_string(),
                reason: "boom".to_string(),
            })
        }
    }

    fn make_scheduler() -> (Scheduler, Arc<PriceStore>) {
        let store = Arc::new(PriceStore::new(None));
        let config = kernel_broker::PaperBrokerConfig::default();
        let broker: Arc<dyn BrokerAdapter> = Arc::new(kernel_broker::PaperBroker::new(Arc::clone(&store), config));
        let scheduler = Scheduler::new(Arc::clone(&store), broker, chrono_tz::UTC);
        (scheduler, store)
    }

    fn ts(m: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, m, 0).unwrap()
    }

    fn candle(m: u32) -> Candle {
        use rust_decimal_macros::dec;
        let v = dec!(10);
        Candle::new(ts(m), v, v, v, v, dec!(1)).unwrap()
    }

    #[tokio::test]
    async fn test_tick_invokes_due_strategy() {
        let (mut scheduler, _store) = make_scheduler();
        let mut watchlist = BTreeSet::new();
        watchlist.insert(Symbol::new("AAPL").unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler
            .bind(Box::new(CountingStrategy {
                watchlist,
                calls: Arc::clone(&calls),
            }))
            .unwrap();

        let mut snapshot = HashMap::new();
        snapshot.insert(Symbol::new("AAPL").unwrap(), candle(0));
        scheduler.tick(ts(0), snapshot).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_empty());
    }

    #[tokio::test]
    async fn test_crashing_strategy_is_unbound() {
        let (mut scheduler, _store) = make_scheduler();
        scheduler.bind(Box::new(CrashingStrategy)).unwrap();

        scheduler.tick(ts(0), HashMap::new()).await.unwrap();

        assert!(scheduler.is_empty());
    }
}
