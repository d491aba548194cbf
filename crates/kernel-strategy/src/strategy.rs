//! The `Strategy` trait: `config()` once, `setup()` once, `main()` on every
//! firing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use kernel_core::interval::Interval;
use kernel_core::symbol::Symbol;

use crate::context::RuntimeContext;
use crate::error::Result;

/// What a strategy declares before binding: its firing interval, which
/// coarser intervals it wants pre-aggregated, and which symbols it trades.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub interval: Interval,
    pub aggregations: BTreeSet<Interval>,
    pub watchlist: BTreeSet<Symbol>,
}

/// A user-written trading strategy. Callback ordering is guaranteed:
/// `config()` once, before `setup()`, which runs once before the first
/// `main()`. Implementations own their private state across invocations but
/// never the shared price store or order book.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// A stable, log-friendly identifier for this strategy instance.
    fn name(&self) -> &str;

    /// Declares the firing cadence, aggregation targets, and watchlist.
    /// Called exactly once, before [`setup`](Self::setup).
    fn config(&self) -> StrategyConfig;

    /// One-time initialization after bindings are finalized.
    async fn setup(&mut self, ctx: &RuntimeContext) -> Result<()>;

    /// Invoked every time the configured interval fires.
    async fn main(&mut self, ctx: &RuntimeContext) -> Result<()>;
}
