//! The broker adapter contract, the order book and position ledger every
//! broker shares, and the in-process paper broker.

pub mod adapter;
pub mod commission;
pub mod error;
pub mod order_book;
pub mod paper;
pub mod position_ledger;
pub mod retry;

pub use adapter::{AccountSnapshot, BrokerAdapter, OrderRef, PositionsSnapshot, SnapshotCallback};
pub use commission::{Commission, CommissionRate};
pub use error::{BrokerErrorKind, Error, Result};
pub use order_book::OrderBook;
pub use paper::{PaperBroker, PaperBrokerConfig};
pub use retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
