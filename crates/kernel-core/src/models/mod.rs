//! Domain records built on the scalar types in [`crate::types`]: orders,
//! positions, accounts, transactions, and strategy bindings.

pub mod account;
pub mod order;
pub mod position;
pub mod strategy_binding;
pub mod transaction;

pub use account::Account;
pub use order::{Order, OrderSide, OrderStatus, TimeInForce};
pub use position::Position;
pub use strategy_binding::StrategyBinding;
pub use transaction::{Transaction, TransactionLog};
