//! The strategy runtime surface: the `Strategy` trait, the `RuntimeContext`
//! it receives, technical indicators, and option chain filtering.

pub mod context;
pub mod error;
pub mod indicators;
pub mod option_chain;
pub mod strategy;

pub use context::RuntimeContext;
pub use error::{Error, Result};
pub use option_chain::{filter_chain, ChainFilter};
pub use strategy::{Strategy, StrategyConfig};
