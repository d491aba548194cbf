//! Shared domain types for the trading runtime kernel: symbols, intervals,
//! candles, orders, positions, accounts, and strategy bindings.
//!
//! This crate performs no I/O. Every other kernel crate depends on it.

pub mod candle;
pub mod error;
pub mod interval;
pub mod models;
pub mod symbol;
pub mod types;

pub use error::{Error, Result};
pub use interval::Interval;
pub use symbol::{AssetClass, Symbol};
pub use types::{Decimal, Price, Quantity};
