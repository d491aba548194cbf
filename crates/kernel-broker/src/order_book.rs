//! In-memory record of every order placed in this process, indexed by id.

use std::collections::HashMap;

use kernel_core::models::{Order, OrderStatus};
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};

/// All orders placed in this process, indexed by `order_id`. Orders are
/// never removed, a full-run audit trail is the point.
#[derive(Default)]
pub struct OrderBook {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly placed order, returning its id.
    pub fn place(&self, order: Order) -> Uuid {
        let id = order.order_id;
        info!(order_id = %id, symbol = %order.symbol, side = ?order.side, qty = %order.quantity, "order placed");
        self.orders.write().insert(id, order);
        id
    }

    pub fn status(&self, order_id: Uuid) -> Result<OrderStatus> {
        self.orders
            .read()
            .get(&order_id)
            .map(|o| o.status)
            .ok_or(Error::OrderNotFound(order_id))
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        self.orders.read().get(&order_id).cloned()
    }

    /// All orders still in the `open` state.
    pub fn pending(&self) -> Vec<Order> {
        self.orders
            .read()
            .values()
            .filter(|o| o.is_open())
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<Order> {
        self.orders.read().values().cloned().collect()
    }

    /// Applies `f` to the stored order in place, used by the paper broker
    /// and by live status polling to record fills/cancellations.
    pub fn update(&self, order_id: Uuid, f: impl FnOnce(&mut Order)) -> Result<()> {
        let mut guard = self.orders.write();
        let order = guard.get_mut(&order_id).ok_or(Error::OrderNotFound(order_id))?;
        f(order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_core::models::{OrderSide, TimeInForce};
    use kernel_core::symbol::Symbol;
    use kernel_core::types::{Price, Quantity};
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::new(
            Symbol::new("AAPL").unwrap(),
            OrderSide::Buy,
            Quantity::new(dec!(1)).unwrap(),
            Price::new(dec!(100)).unwrap(),
            TimeInForce::Day,
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_place_then_status_is_open() {
        let book = OrderBook::new();
        let o = order();
        let id = book.place(o);
        assert_eq!(book.status(id).unwrap(), OrderStatus::Open);
    }

    #[test]
    fn test_pending_excludes_filled() {
        let book = OrderBook::new();
        let o = order();
        let id = book.place(o);
        book.update(id, |o| {
            o.fill(Price::new(dec!(100)).unwrap(), o.quantity, chrono::Utc::now())
                .unwrap();
        })
        .unwrap();
        assert!(book.pending().is_empty());
    }

    #[test]
    fn test_status_of_unknown_order_errors() {
        let book = OrderBook::new();
        assert!(book.status(Uuid::new_v4()).is_err());
    }
}
