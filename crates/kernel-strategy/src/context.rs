//! The capabilities a running strategy sees: price/account queries, order
//! placement with automatic sizing and mark-up/mark-down, and option chain
//! helpers.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use kernel_broker::adapter::{BrokerAdapter, OrderRef};
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::models::{OrderSide, TimeInForce};
use kernel_core::symbol::Symbol;
use kernel_core::types::{Decimal, Price, Quantity};
use kernel_store::PriceStore;
use rust_decimal_macros::dec;
use tracing::error;

use crate::option_chain::{filter_chain, ChainFilter};
use crate::strategy::StrategyConfig;

/// The percentage a buy/sell limit is marked up/down from the current price:
/// likely, but not certain, to fill.
const MARK_PCT: Decimal = dec!(5);

/// Read-only snapshot of runtime capabilities passed to a strategy's
/// `main()`: current timestamp, exchange timezone, its own binding, and
/// references to the shared price store, broker, and account.
pub struct RuntimeContext {
    pub now: DateTime<Utc>,
    pub exchange_tz: Tz,
    pub config: StrategyConfig,
    store: Arc<PriceStore>,
    broker: Arc<dyn BrokerAdapter>,
}

impl RuntimeContext {
    pub fn new(
        now: DateTime<Utc>,
        exchange_tz: Tz,
        config: StrategyConfig,
        store: Arc<PriceStore>,
        broker: Arc<dyn BrokerAdapter>,
    ) -> Self {
        Self {
            now,
            exchange_tz,
            config,
            store,
            broker,
        }
    }

    // --- Time ---

    /// The current timestamp converted to the configured exchange timezone.
    pub fn now_local(&self) -> DateTime<Tz> {
        self.now.with_timezone(&self.exchange_tz)
    }

    // --- Price queries ---

    pub fn last_candle(&self, symbol: &Symbol, interval: Interval) -> Option<Candle> {
        self.store.last(symbol, interval)
    }

    pub fn candles(
        &self,
        symbol: &Symbol,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<Candle> {
        self.store.load(symbol, Some(interval), start, end).unwrap_or_default()
    }

    pub fn last_price(&self, symbol: &Symbol, interval: Interval) -> Option<Decimal> {
        self.last_candle(symbol, interval).map(|c| c.close)
    }

    pub fn prices(
        &self,
        symbol: &Symbol,
        interval: Interval,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<Decimal> {
        self.candles(symbol, interval, start, end).into_iter().map(|c| c.close).collect()
    }

    // --- Account queries ---

    pub async fn account(&self) -> kernel_broker::Result<kernel_broker::adapter::AccountSnapshot> {
        self.broker.fetch_account().await
    }

    pub async fn buying_power(&self) -> kernel_broker::Result<Decimal> {
        Ok(self.broker.fetch_account().await?.buying_power)
    }

    pub async fn equity(&self) -> kernel_broker::Result<Decimal> {
        Ok(self.broker.fetch_account().await?.equity)
    }

    pub async fn positions(&self) -> kernel_broker::Result<kernel_broker::adapter::PositionsSnapshot> {
        self.broker.fetch_positions().await
    }

    // --- Orders ---

    /// Buys `symbol`. If `quantity` is `None`, sizes to the maximum
    /// affordable at the marked-up limit price. Refuses (logs ERROR, returns
    /// `None`) if buying power can't cover an explicit quantity.
    pub async fn buy(&self, symbol: &Symbol, quantity: Option<Quantity>) -> kernel_broker::Result<Option<OrderRef>> {
        let Some(close) = self.last_price(symbol, self.config.interval) else {
            error!(%symbol, "buy refused: no price available");
            return Ok(None);
        };
        let current = Price::new(close)?;
        let limit = current.marked_up(MARK_PCT)?;
        let multiplier = if symbol.asset_class() == kernel_core::symbol::AssetClass::Option {
            dec!(100)
        } else {
            Decimal::ONE
        };
        let buying_power = self.buying_power().await?;

        let qty = match quantity {
            Some(q) => {
                let notional = limit.as_decimal() * q.as_decimal() * multiplier;
                if notional > buying_power {
                    error!(%symbol, needed = %notional, available = %buying_power, "buy refused: insufficient buying power");
                    return Ok(None);
                }
                q
            }
            None => {
                let max_affordable = (buying_power / (limit.as_decimal() * multiplier)).floor();
                if max_affordable <= Decimal::ZERO {
                    error!(%symbol, "buy refused: cannot afford even one unit");
                    return Ok(None);
                }
                Quantity::new(max_affordable)?
            }
        };

        let order_ref = self
            .broker
            .place_limit(OrderSide::Buy, symbol, qty, limit, TimeInForce::Day, false)
            .await?;
        Ok(Some(order_ref))
    }

    /// Sells `symbol`. If `quantity` is `None`, sizes to the full held
    /// position.
    pub async fn sell(&self, symbol: &Symbol, quantity: Option<Quantity>) -> kernel_broker::Result<Option<OrderRef>> {
        let Some(close) = self.last_price(symbol, self.config.interval) else {
            error!(%symbol, "sell refused: no price available");
            return Ok(None);
        };
        let current = Price::new(close)?;
        let limit = current.marked_down(MARK_PCT)?;

        let qty = match quantity {
            Some(q) => q,
            None => {
                let positions = self.positions().await?;
                let held = positions
                    .stock
                    .iter()
                    .chain(positions.crypto.iter())
                    .chain(positions.option.iter())
                    .find(|p| &p.symbol == symbol)
                    .map(|p| p.quantity);
                match held {
                    Some(q) if !q.is_zero() => q,
                    _ => {
                        error!(%symbol, "sell refused: no position held");
                        return Ok(None);
                    }
                }
            }
        };

        let order_ref = self
            .broker
            .place_limit(OrderSide::Sell, symbol, qty, limit, TimeInForce::Day, false)
            .await?;
        Ok(Some(order_ref))
    }

    // --- Option helpers ---

    pub async fn filter_chain(
        &self,
        symbol: &Symbol,
        expiration: NaiveDate,
        filter: &ChainFilter,
    ) -> kernel_broker::Result<Vec<kernel_broker::adapter::ChainEntry>> {
        let entries = self.broker.fetch_chain_data(symbol, expiration).await?;
        Ok(filter_chain(&entries, filter))
    }
}
