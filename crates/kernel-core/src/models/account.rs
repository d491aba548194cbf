//! Account snapshot: cash, buying power, and the live position set.

use std::collections::HashMap;

use crate::symbol::Symbol;
use crate::types::{Decimal, Price};

use super::position::Position;

/// {equity, cash, buying_power, multiplier, positions}.
///
/// `multiplier` is the account-level margin multiplier (distinct from a
/// single option position's contract multiplier); for an unmargined paper
/// account this is `1`.
#[derive(Debug, Clone)]
pub struct Account {
    pub equity: Decimal,
    pub cash: Decimal,
    pub buying_power: Decimal,
    pub multiplier: Decimal,
    positions: HashMap<Symbol, Position>,
}

impl Account {
    pub fn new(cash: Decimal, multiplier: Decimal) -> Self {
        Self {
            equity: cash,
            cash,
            buying_power: cash,
            multiplier,
            positions: HashMap::new(),
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn position_mut(&mut self, symbol: &Symbol) -> Option<&mut Position> {
        self.positions.get_mut(symbol)
    }

    /// Inserts or replaces a position outright (used when opening a new one).
    pub fn upsert_position(&mut self, position: Position) {
        self.positions.insert(position.symbol.clone(), position);
    }

    /// Drops a position once it has decayed to flat.
    pub fn remove_position(&mut self, symbol: &Symbol) {
        self.positions.remove(symbol);
    }

    /// Refreshes every held position's current price from the latest candle
    /// close for its symbol, then recomputes `equity` as
    /// `cash + Σ(position.quantity × current_price × multiplier)`.
    pub fn refresh_price(&mut self, symbol: &Symbol, price: Price) {
        if let Some(p) = self.positions.get_mut(symbol) {
            p.refresh_price(price);
        }
        self.recompute_equity();
    }

    pub fn recompute_equity(&mut self) {
        let positions_value: Decimal = self.positions.values().map(|p| p.market_value()).sum();
        self.equity = self.cash + positions_value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quantity;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_account_equity_equals_cash() {
        let acct = Account::new(dec!(10000), dec!(1));
        assert_eq!(acct.equity, dec!(10000));
        assert_eq!(acct.buying_power, dec!(10000));
    }

    #[test]
    fn test_equity_includes_position_value() {
        let mut acct = Account::new(dec!(10000), dec!(1));
        acct.upsert_position(Position::opening_fill(
            Symbol::new("AAPL").unwrap(),
            Quantity::new(dec!(10)).unwrap(),
            Price::new(dec!(100)).unwrap(),
        ));
        acct.cash = dec!(9000);
        acct.recompute_equity();
        assert_eq!(acct.equity, dec!(10000)); // 9000 cash + 10*100 position
    }

    #[test]
    fn test_remove_position() {
        let mut acct = Account::new(dec!(1000), dec!(1));
        let symbol = Symbol::new("AAPL").unwrap();
        acct.upsert_position(Position::opening_fill(
            symbol.clone(),
            Quantity::new(dec!(1)).unwrap(),
            Price::new(dec!(1)).unwrap(),
        ));
        acct.remove_position(&symbol);
        assert!(acct.position(&symbol).is_none());
    }
}
