//! The uniform data-fetch + order-placement contract every venue, live or
//! paper, implements.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use kernel_core::candle::Candle;
use kernel_core::interval::Interval;
use kernel_core::models::{Order, OrderSide, TimeInForce};
use kernel_core::symbol::{OptionType, Symbol};
use kernel_core::types::{Decimal, Price, Quantity};
use uuid::Uuid;

use crate::error::Result;

/// `{equity, cash, buying_power, multiplier}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub equity: Decimal,
    pub cash: Decimal,
    pub buying_power: Decimal,
    pub multiplier: Decimal,
}

/// `{stock[], crypto[], option[]}`, positions grouped by asset class, as
/// returned by a broker's `fetch_positions`.
#[derive(Debug, Clone, Default)]
pub struct PositionsSnapshot {
    pub stock: Vec<kernel_core::models::Position>,
    pub crypto: Vec<kernel_core::models::Position>,
    pub option: Vec<kernel_core::models::Position>,
}

/// `{expirations[], multiplier}` for an options-chain root.
#[derive(Debug, Clone)]
pub struct ChainInfo {
    pub expirations: Vec<NaiveDate>,
    pub multiplier: Decimal,
}

/// One contract within a chain: `{strike, type, exp_date}`.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    pub occ_symbol: Symbol,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub exp_date: NaiveDate,
}

/// `{price, ask, bid}` for a single OCC contract.
#[derive(Debug, Clone, Copy)]
pub struct OptionMarketData {
    pub price: Decimal,
    pub ask: Decimal,
    pub bid: Decimal,
}

/// An opaque handle to a placed order, as returned by a live broker (its own
/// order id) or the paper broker (the order book's internally generated
/// [`Uuid`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderRef(pub Uuid);

/// The callback an adapter invokes with a per-tick snapshot once the tick
/// multiplexer has assembled it (or flushed on timeout). A single
/// function-pointer field, no inheritance hierarchy needed beyond this
/// trait.
pub type SnapshotCallback = Arc<dyn Fn(DateTime<Utc>, HashMap<Symbol, Candle>) + Send + Sync>;

/// The broker adapter contract: read-only data operations, trading
/// operations, and the configure/start/stop production lifecycle.
#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    fn name(&self) -> &str;

    // --- Data operations (read-only) ---

    fn supported_intervals(&self) -> HashSet<Interval>;

    async fn fetch_price_history(
        &self,
        symbol: &Symbol,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>>;

    async fn fetch_latest_snapshot(&self, watchlist: &[Symbol]) -> Result<HashMap<Symbol, Candle>>;

    async fn fetch_chain_info(&self, symbol: &Symbol) -> Result<ChainInfo>;

    async fn fetch_chain_data(&self, symbol: &Symbol, expiration: NaiveDate) -> Result<Vec<ChainEntry>>;

    async fn fetch_option_market_data(&self, occ_symbol: &Symbol) -> Result<OptionMarketData>;

    // --- Trading operations ---

    async fn fetch_account(&self) -> Result<AccountSnapshot>;

    async fn fetch_positions(&self) -> Result<PositionsSnapshot>;

    async fn place_limit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: Quantity,
        limit_price: Price,
        tif: TimeInForce,
        extended: bool,
    ) -> Result<OrderRef>;

    #[allow(clippy::too_many_arguments)]
    async fn place_option_limit(
        &self,
        side: OrderSide,
        symbol: &Symbol,
        quantity: Quantity,
        limit_price: Price,
        option_type: OptionType,
        expiration: NaiveDate,
        strike: Decimal,
        tif: TimeInForce,
    ) -> Result<OrderRef>;

    async fn fetch_order_status(&self, order_ref: OrderRef) -> Result<Order>;

    async fn cancel_order(&self, order_ref: OrderRef) -> Result<()>;

    async fn pending_orders(&self) -> Result<Vec<OrderRef>>;

    // --- Lifecycle ---

    /// Records which symbols/intervals this adapter must produce and the
    /// callback it will invoke with each completed snapshot. Called once
    /// before [`start`](Self::start).
    async fn configure(&mut self, watchlist: Vec<Symbol>, callback: SnapshotCallback) -> Result<()>;

    /// Begins data production: in pull mode, sleeps until the next boundary
    /// of the finest required interval then fetches and calls back; in push
    /// mode, subscribes to an external event stream.
    async fn start(&mut self) -> Result<()>;

    /// Halts production and releases connections.
    async fn stop(&mut self) -> Result<()>;
}
