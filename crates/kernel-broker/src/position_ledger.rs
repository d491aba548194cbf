//! Reacts to fills: opens, grows, shrinks, or drops positions in an account.

use kernel_core::models::{Account, Order, OrderSide, Position};
use kernel_core::types::{Price, Quantity};
use tracing::info;

/// Applies a fill recorded on `order` to the position held in `account`.
///
/// On a buy fill with no existing position, opens one. On a buy fill with an
/// existing position, recomputes `avg_price` as the weighted mean. On
/// a sell fill, reduces quantity and drops the position once it decays to
/// flat, leaving `avg_price` untouched until then.
pub fn apply_fill(account: &mut Account, order: &Order, fill_price: Price, fill_quantity: Quantity) {
    match account.position_mut(&order.symbol) {
        Some(position) => {
            position.apply_fill(order.side, fill_quantity, fill_price);
            if position.is_flat() {
                info!(symbol = %order.symbol, "position closed to flat");
                account.remove_position(&order.symbol);
            }
        }
        None => match order.side {
            OrderSide::Buy => {
                account.upsert_position(Position::opening_fill(
                    order.symbol.clone(),
                    fill_quantity,
                    fill_price,
                ));
            }
            OrderSide::Sell => {
                // A sell with no existing position is a short; the kernel
                // doesn't model short positions, so this fill is a no-op
                // beyond the cash leg the caller already applied.
            }
        },
    }
    account.recompute_equity();
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_core::models::{OrderSide, TimeInForce};
    use kernel_core::symbol::Symbol;
    use rust_decimal_macros::dec;

    fn order(side: OrderSide, symbol: &str) -> Order {
        Order::new(
            Symbol::new(symbol).unwrap(),
            side,
            Quantity::new(dec!(1)).unwrap(),
            Price::new(dec!(100)).unwrap(),
            TimeInForce::Day,
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_buy_fill_opens_position() {
        let mut account = Account::new(dec!(10000), dec!(1));
        let o = order(OrderSide::Buy, "AAPL");
        apply_fill(&mut account, &o, Price::new(dec!(150)).unwrap(), Quantity::new(dec!(1)).unwrap());
        let pos = account.position(&o.symbol).unwrap();
        assert_eq!(pos.quantity.as_decimal(), dec!(1));
        assert_eq!(pos.avg_price.as_decimal(), dec!(150));
    }

    #[test]
    fn test_second_buy_fill_averages() {
        let mut account = Account::new(dec!(10000), dec!(1));
        let o = order(OrderSide::Buy, "AAPL");
        apply_fill(&mut account, &o, Price::new(dec!(100)).unwrap(), Quantity::new(dec!(10)).unwrap());
        apply_fill(&mut account, &o, Price::new(dec!(200)).unwrap(), Quantity::new(dec!(10)).unwrap());
        let pos = account.position(&o.symbol).unwrap();
        assert_eq!(pos.avg_price.as_decimal(), dec!(150));
        assert_eq!(pos.quantity.as_decimal(), dec!(20));
    }

    #[test]
    fn test_sell_fill_to_flat_drops_position() {
        let mut account = Account::new(dec!(10000), dec!(1));
        let buy = order(OrderSide::Buy, "AAPL");
        apply_fill(&mut account, &buy, Price::new(dec!(100)).unwrap(), Quantity::new(dec!(5)).unwrap());
        let sell = order(OrderSide::Sell, "AAPL");
        apply_fill(&mut account, &sell, Price::new(dec!(110)).unwrap(), Quantity::new(dec!(5)).unwrap());
        assert!(account.position(&sell.symbol).is_none());
    }
}
