//! Commission schedules: a flat fee, a percentage of notional, or an
//! asymmetric buy/sell pair of either.

use kernel_core::models::OrderSide;
use kernel_core::types::Decimal;
use rust_decimal_macros::dec;

/// A single-sided commission rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommissionRate {
    /// A flat currency amount charged per fill, regardless of notional.
    Flat(Decimal),
    /// A percentage of the fill's notional value (e.g. `dec!(0.1)` = 0.1%).
    Percentage(Decimal),
}

impl CommissionRate {
    fn charge(&self, notional: Decimal) -> Decimal {
        match self {
            CommissionRate::Flat(amount) => *amount,
            CommissionRate::Percentage(pct) => notional * pct / dec!(100),
        }
    }
}

/// Commission may be uniform across sides or an asymmetric `{buy, sell}`
/// pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commission {
    Uniform(CommissionRate),
    BuySell {
        buy: CommissionRate,
        sell: CommissionRate,
    },
}

impl Commission {
    pub fn none() -> Self {
        Commission::Uniform(CommissionRate::Flat(Decimal::ZERO))
    }

    /// The commission amount owed on a fill of `notional` on `side`.
    pub fn charge(&self, side: OrderSide, notional: Decimal) -> Decimal {
        match self {
            Commission::Uniform(rate) => rate.charge(notional),
            Commission::BuySell { buy, sell } => match side {
                OrderSide::Buy => buy.charge(notional),
                OrderSide::Sell => sell.charge(notional),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_commission() {
        let c = Commission::Uniform(CommissionRate::Flat(dec!(1)));
        assert_eq!(c.charge(OrderSide::Buy, dec!(1000)), dec!(1));
    }

    #[test]
    fn test_percentage_commission() {
        let c = Commission::Uniform(CommissionRate::Percentage(dec!(0.1)));
        assert_eq!(c.charge(OrderSide::Buy, dec!(1000)), dec!(1));
    }

    #[test]
    fn test_asymmetric_buy_sell_commission() {
        let c = Commission::BuySell {
            buy: CommissionRate::Flat(dec!(2)),
            sell: CommissionRate::Flat(dec!(1)),
        };
        assert_eq!(c.charge(OrderSide::Buy, dec!(1000)), dec!(2));
        assert_eq!(c.charge(OrderSide::Sell, dec!(1000)), dec!(1));
    }
}
