//! The OHLCV price store: in-memory series storage, on-demand and explicit
//! aggregation, and pluggable persistence backends.

pub mod error;
pub mod persistence;
pub mod store;

pub use error::{Error, Result};
pub use persistence::{FileBackend, PersistenceBackend, SqlBackend};
pub use store::PriceStore;
