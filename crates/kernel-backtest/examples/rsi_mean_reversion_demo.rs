//! Runs the RSI mean-reversion strategy through a short synthetic backtest
//! and prints the resulting fills and account snapshot.
//!
//! Run with: `cargo run -p kernel-backtest --example rsi_mean_reversion_demo`

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
use kernel_strategy::indicators::rsi;
use kernel_strategy::strategy::{Strategy, StrategyConfig};
use rust_decimal_macros::dec;

const OVERSOLD: Decimal = dec!(30);
const OVERBOUGHT: Decimal = dec!(70);

struct RsiMeanReversion {
    symbol: Symbol,
    period: usize,
    holding: bool,
}

impl RsiMeanReversion {
    fn new(symbol: Symbol, period: usize) -> Self {
        Self {
            symbol,
            period,
            holding: false,
        }
    }
}

#[async_trait]
impl Strategy for RsiMeanReversion {
    fn name(&self) -> &str {
        "rsi_mean_reversion"
    }

    fn config(&self) -> StrategyConfig {
        let mut watchlist = BTreeSet::new();
        watchlist.insert(self.symbol.clone());
        StrategyConfig {
            interval: Interval::Min5,
            aggregations: BTreeSet::new(),
            watchlist,
        }
    }

    async fn setup(&mut self, _ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
        self.holding = false;
        Ok(())
    }

    async fn main(&mut self, ctx: &RuntimeContext) -> kernel_strategy::Result<()> {
        let closes = ctx.prices(&self.symbol, Interval::Min5, None, None);
        let Some(&current) = rsi(&closes, self.period).last() else {
            return Ok(());
        };

        if !self.holding && current < OVERSOLD {
            if ctx.buy(&self.symbol, None).await?.is_some() {
                self.holding = true;
            }
        } else if self.holding && current > OVERBOUGHT {
            if ctx.sell(&self.symbol, None).await?.is_some() {
                self.holding = false;
            }
        }
        Ok(())
    }
}

/// Five-minute candles that swing between oversold and overbought ranges,
/// standing in for a real data source.
fn synthetic_candles(bars: i64) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..bars)
        .map(|i| {
            let ts = start + Duration::minutes(i * 5);
            let wave = ((i as f64) * 0.3).sin() * 8.0;
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
    store.store(&symbol, Interval::Min5, &candles)?;

    let paper_broker = Arc::new(PaperBroker::new(Arc::clone(&store), PaperBrokerConfig::default()));
    let broker_adapter: Arc<dyn BrokerAdapter> = Arc::clone(&paper_broker);
    let mut scheduler = Scheduler::new(Arc::clone(&store), broker_adapter, chrono_tz::UTC);
    scheduler.set_fill_poller(Arc::new({
        let paper_broker = Arc::clone(&paper_broker);
        move |interval, now| {
            paper_broker.check_fills(interval, "rsi_mean_reversion", now);
        }
    }));
    scheduler.bind(Box::new(RsiMeanReversion::new(symbol, 14)))?;

    let mut driver = BacktestDriver::setup(scheduler, store, start, end, Duration::minutes(5))?;
    driver.run()?;

    println!("=== RSI Mean Reversion Backtest ===");
    for tx in paper_broker.transactions() {
        println!("{} {:?} {} @ {}", tx.timestamp, tx.side, tx.symbol, tx.price);
    }
    let account = paper_broker.account_snapshot();
    println!("Final equity: {}", account.equity);
    println!("Final cash:   {}", account.cash);

    Ok(())
}
