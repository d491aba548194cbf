//! Per-symbol holdings, mutated only by applying fills.

use crate::symbol::{AssetClass, Symbol};
use crate::types::{Decimal, Price, Quantity};
use rust_decimal_macros::dec;

use super::order::OrderSide;

/// Below this quantity a position is considered flat and dropped from the
/// ledger rather than carried forward at zero.
pub const QUANTITY_EPSILON: Decimal = dec!(0.00000001);

/// {symbol, quantity, avg_price, current_price}, tagged by asset class so the
/// contract multiplier is known without a second lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: Symbol,
    pub asset_class: AssetClass,
    pub quantity: Quantity,
    pub avg_price: Price,
    pub current_price: Price,
}

impl Position {
    /// Opens a position from a single fill.
    pub fn opening_fill(symbol: Symbol, quantity: Quantity, fill_price: Price) -> Self {
        let asset_class = symbol.asset_class();
        Self {
            symbol,
            asset_class,
            quantity,
            avg_price: fill_price,
            current_price: fill_price,
        }
    }

    /// The contract multiplier applied to notional value (100 for options,
    /// 1 otherwise).
    pub fn multiplier(&self) -> Decimal {
        match self.asset_class {
            AssetClass::Option => Decimal::from(100),
            _ => Decimal::ONE,
        }
    }

    /// Current notional value: `quantity * current_price * multiplier`.
    pub fn market_value(&self) -> Decimal {
        self.quantity.as_decimal() * self.current_price.as_decimal() * self.multiplier()
    }

    pub fn refresh_price(&mut self, price: Price) {
        self.current_price = price;
    }

    /// True once quantity has decayed to (within epsilon of) zero, meaning
    /// this position should be dropped from the ledger.
    pub fn is_flat(&self) -> bool {
        self.quantity.as_decimal() <= QUANTITY_EPSILON
    }

    /// Applies a fill to an existing position.
    ///
    /// A buy fill recomputes `avg_price` as the weighted mean of the old and
    /// new cost basis and increases quantity. A sell fill decreases quantity
    /// and leaves `avg_price` untouched, the caller drops the position once
    /// [`is_flat`](Self::is_flat) returns true.
    pub fn apply_fill(&mut self, side: OrderSide, fill_quantity: Quantity, fill_price: Price) {
        match side {
            OrderSide::Buy => {
                let old_qty = self.quantity.as_decimal();
                let old_avg = self.avg_price.as_decimal();
                let new_qty = old_qty + fill_quantity.as_decimal();
                let weighted = (old_avg * old_qty + fill_price.as_decimal() * fill_quantity.as_decimal())
                    / new_qty;
                self.avg_price = Price::new(weighted).unwrap_or(self.avg_price);
                self.quantity = Quantity::new(new_qty).unwrap_or(self.quantity);
            }
            OrderSide::Sell => {
                let remaining = self.quantity.as_decimal() - fill_quantity.as_decimal();
                self.quantity = Quantity::new(remaining.max(Decimal::ZERO)).unwrap_or(self.quantity);
            }
        }
        self.current_price = fill_price;
    }
}
