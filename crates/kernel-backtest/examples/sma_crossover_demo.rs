//! Runs a fast/slow SMA crossover strategy through a short synthetic
//! backtest and prints the resulting fills and account snapshot, the same
//! shape as the teacher's own runnable backtest examples (see
//! `examples/backtest_simple.rs` in the upstream OKX workspace this crate
//! is descended from).
//!
//! Run with: `cargo run -p kernel-backtest --example sma_crossover_demo`

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use kernel_backtest::BacktestDriver;
use kernel_broker::adapter::BrokerAdapter;
use kernel_broker::{PaperBroker, PaperBrokerConfig};
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::symbol::Symbol;
use kernel_core::types::Decimal;
use kernel_runtime::scheduler::Scheduler;
use kernel_store::PriceStore;
use kernel_strategy::context::RuntimeContext;
use kernel_strategy::indicators::sma;
use kernel_strategy::strategy::{Strategy, StrategyConfig};
use rust_decimal_macros::dec;

struct SmaCrossover {
    symbol: Symbol,
    fast_period: usize,
    slow_period: usize,
    was_above: Option<bool>,
}

impl SmaCrossover {
    fn new(symbol: Symbol, fast_period: usize, slow_period: usize) -> Self {
        Self {
            symbol,
            fast_period,
            slow_period,
            was_above: None,
        }
    }
}

#[async_trait]
impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn config(&self) -> StrategyConfig {
        let mut watchlist = BTreeSet::new();
        watchlist.insert(self.symbol.clone());
        StrategyConfig {
            interval: Interval::Min1,
            aggregations: BTreeSet::new(),
            watchlist,
        }
    }

    async fn setup(&mut self, _ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
        self.was_above = None;
        Ok(())
    }

    async fn main(&mut self, ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
        let closes = ctx.prices(&self.symbol, Interval::Min1, None, None);
        let fast = sma(&closes, self.fast_period);
        let slow = sma(&closes, self.slow_period);
        let (Some(&fast_now), Some(&slow_now)) = (fast.last(), slow.last()) else {
            return Ok(());
        };

        let is_above = fast_now > slow_now;
        if let Some(was_above) = self.was_above {
            if !was_above && is_above {
                ctx.buy(&self.symbol, None).await?;
            } else if was_above && !is_above {
                ctx.sell(&self.symbol, None).await?;
            }
        }
        self.was_above = Some(is_above);
        Ok(())
    }
}

/// One-minute sine-wave candles around a price of 100, standing in for a
/// real data source the way the teacher's example fabricates sample OHLCV.
fn synthetic_candles(minutes: i64) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..minutes)
        .map(|i| {
            let ts = start + Duration::minutes(i);
            let wave = ((i as f64) * 0.2).sin() * 5.0;
            let close = Decimal::from(100) + Decimal::try_from(wave).unwrap_or(Decimal::ZERO);
            Candle::new(ts, close, close + dec!(0.5), close - dec!(0.5), close, dec!(10)).unwrap()
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let symbol = Symbol::new("AAPL")?;
    let store = Arc::new(PriceStore::new(None));
    let candles = synthetic_candles(200);
    let start = candles.first().unwrap().timestamp;
    let end = candles.last().unwrap().timestamp;
    store.store(&symbol, Interval::Min1, &candles)?;

    let paper_broker = Arc::new(PaperBroker::new(Arc::clone(&store), PaperBrokerConfig::default()));
    let broker_adapter: Arc<dyn BrokerAdapter> = Arc::clone(&paper_broker);
    let mut scheduler = Scheduler::new(Arc::clone(&store), broker_adapter, chrono_tz::UTC);

    // Wiring the paper broker's fill simulation into the scheduler's
    // per-tick order-book poll is a composition-root concern: the
    // `BrokerAdapter` trait object the scheduler holds can't downcast back
    // to `PaperBroker`, so the closure has to close over the concrete type
    // before it gets erased.
    scheduler.set_fill_poller(Arc::new({
        let paper_broker = Arc::clone(&paper_broker);
        move |interval, now| {
            paper_broker.check_fills(interval, "sma_crossover", now);
        }
    }));
    scheduler.bind(Box::new(SmaCrossover::new(symbol, 5, 14)))?;

    let mut driver = BacktestDriver::setup(scheduler, store, start, end, Duration::minutes(1))?;
    driver.run()?;

    println!("=== SMA Crossover Backtest ===");
    for tx in paper_broker.transactions() {
        println!("{} {:?} {} @ {}", tx.timestamp, tx.side, tx.symbol, tx.price);
    }
    let account = paper_broker.account_snapshot();
    println!("Final equity: {}", account.equity);
    println!("Final cash:   {}", account.cash);

    Ok(())
}
