//! Orders: the monotone open -> {filled, cancelled, rejected} lifecycle.

use crate::error::{Error, Result};
use crate::symbol::{AssetClass, Symbol};
use crate::types::{Decimal, Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

/// Time-in-force for a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Day,
    Gtc,
}

/// {order_id, symbol, side, asset class, quantity, limit price, time-in-force,
/// status, filled_quantity, filled_price, filled_time, placed_time}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub asset_class: AssetClass,
    pub quantity: Quantity,
    pub limit_price: Price,
    pub tif: TimeInForce,
    pub status: OrderStatus,
    pub filled_quantity: Quantity,
    pub filled_price: Option<Price>,
    pub filled_time: Option<DateTime<Utc>>,
    pub placed_time: DateTime<Utc>,
}

impl Order {
    pub fn new(
        symbol: Symbol,
        side: OrderSide,
        quantity: Quantity,
        limit_price: Price,
        tif: TimeInForce,
        placed_time: DateTime<Utc>,
    ) -> Self {
        let asset_class = symbol.asset_class();
        Self {
            // v7 is time-ordered, so ids placed later in the same process
            // sort after earlier ones, per the paper broker's monotonic-id
            // requirement; a live broker's own id still wins once assigned.
            order_id: Uuid::now_v7(),
            symbol,
            side,
            asset_class,
            quantity,
            limit_price,
            tif,
            status: OrderStatus::Open,
            filled_quantity: Quantity::ZERO,
            filled_price: None,
            filled_time: None,
            placed_time,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Applies a monotone status transition. `open` may only move to one of
    /// `filled`, `cancelled`, or `rejected`; any other transition, including
    /// a transition out of a terminal state, is rejected.
    pub fn transition(&mut self, status: OrderStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::InvalidOrderTransition(format!(
                "order {} is already terminal ({:?}); cannot move to {:?}",
                self.order_id, self.status, status
            )));
        }
        self.status = status;
        Ok(())
    }

    /// Marks the order filled at `price`/`time`, fully or partially,
    /// recording the filled quantity.
    pub fn fill(&mut self, price: Price, quantity: Quantity, time: DateTime<Utc>) -> Result<()> {
        self.transition(OrderStatus::Filled)?;
        self.filled_price = Some(price);
        self.filled_quantity = quantity;
        self.filled_time = Some(time);
        Ok(())
    }

    /// The contract multiplier applied when computing notional value
    /// (typically 100 for equity options, 1 otherwise).
    pub fn multiplier(&self) -> Decimal {
        match self.asset_class {
            AssetClass::Option => Decimal::from(100),
            _ => Decimal::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::new(
            Symbol::new("AAPL").unwrap(),
            OrderSide::Buy,
            Quantity::new(dec!(10)).unwrap(),
            Price::new(dec!(150)).unwrap(),
            TimeInForce::Day,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_order_is_open() {
        let o = order();
        assert!(o.is_open());
        assert_eq!(o.filled_quantity.as_decimal(), dec!(0));
    }

    #[test]
    fn test_fill_transitions_to_filled() {
        let mut o = order();
        o.fill(Price::new(dec!(149.5)).unwrap(), o.quantity, Utc::now())
            .unwrap();
        assert_eq!(o.status, OrderStatus::Filled);
        assert!(o.filled_time.is_some());
    }

    #[test]
    fn test_cannot_transition_from_terminal() {
        let mut o = order();
        o.transition(OrderStatus::Cancelled).unwrap();
        assert!(o.transition(OrderStatus::Filled).is_err());
    }

    #[test]
    fn test_option_multiplier() {
        let o = Order::new(
            Symbol::new("TWTR  211114C00050001").unwrap(),
            OrderSide::Buy,
            Quantity::new(dec!(1)).unwrap(),
            Price::new(dec!(1)).unwrap(),
            TimeInForce::Day,
            Utc::now(),
        );
        assert_eq!(o.multiplier(), dec!(100));
    }
}
