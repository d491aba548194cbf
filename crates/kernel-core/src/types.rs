//! Scalar value types shared across the kernel: exact-decimal prices and quantities.

use crate::error::{Error, Result};
use rust_decimal::Decimal as RustDecimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type alias for decimal precision.
pub type Decimal = RustDecimal;

/// A strictly positive price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    /// Creates a new Price.
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_core::types::Price;
    /// use rust_decimal_macros::dec;
    ///
    /// let price = Price::new(dec!(42000.50)).unwrap();
    /// assert_eq!(price.as_decimal(), dec!(42000.50));
    /// ```
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(Error::InvalidPrice(format!(
                "price must be positive: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn from_f64(value: f64) -> Result<Self> {
        let decimal = Decimal::from_f64_retain(value)
            .ok_or_else(|| Error::DecimalError(format!("invalid f64: {}", value)))?;
        Self::new(decimal)
    }

    /// Marks the price up by the given percentage (e.g. 5.0 for the
    /// "buy at +5%" default limit used by the strategy host).
    pub fn marked_up(&self, pct: Decimal) -> Result<Self> {
        Self::new(self.0 * (Decimal::ONE + pct / dec!(100)))
    }

    /// Marks the price down by the given percentage.
    pub fn marked_down(&self, pct: Decimal) -> Result<Self> {
        Self::new(self.0 * (Decimal::ONE - pct / dec!(100)))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Creates a new Quantity.
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_core::types::Quantity;
    /// use rust_decimal_macros::dec;
    ///
    /// let qty = Quantity::new(dec!(1.5)).unwrap();
    /// assert_eq!(qty.as_decimal(), dec!(1.5));
    /// ```
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(Error::InvalidQuantity(format!(
                "quantity cannot be negative: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn from_f64(value: f64) -> Result<Self> {
        let decimal = Decimal::from_f64_retain(value)
            .ok_or_else(|| Error::DecimalError(format!("invalid f64: {}", value)))?;
        Self::new(decimal)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    pub const ZERO: Quantity = Quantity(Decimal::ZERO);
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_new_valid() {
        let price = Price::new(dec!(42000.50)).unwrap();
        assert_eq!(price.as_decimal(), dec!(42000.50));
    }

    #[test]
    fn test_price_new_invalid_zero() {
        assert!(Price::new(Decimal::ZERO).is_err());
    }

    #[test]
    fn test_price_new_invalid_negative() {
        assert!(Price::new(dec!(-100)).is_err());
    }

    #[test]
    fn test_price_mark_up() {
        let price = Price::new(dec!(20)).unwrap();
        let marked = price.marked_up(dec!(5.0)).unwrap();
        assert_eq!(marked.as_decimal(), dec!(21.00));
    }

    #[test]
    fn test_price_mark_down() {
        let price = Price::new(dec!(20)).unwrap();
        let marked = price.marked_down(dec!(5.0)).unwrap();
        assert_eq!(marked.as_decimal(), dec!(19.00));
    }

    #[test]
    fn test_quantity_new_valid() {
        let qty = Quantity::new(dec!(1.5)).unwrap();
        assert_eq!(qty.as_decimal(), dec!(1.5));
    }

    #[test]
    fn test_quantity_new_zero_valid() {
        let qty = Quantity::new(Decimal::ZERO).unwrap();
        assert!(qty.is_zero());
    }

    #[test]
    fn test_quantity_new_invalid_negative() {
        assert!(Quantity::new(dec!(-1.5)).is_err());
    }

    #[test]
    fn test_price_ordering() {
        let price1 = Price::new(dec!(100)).unwrap();
        let price2 = Price::new(dec!(200)).unwrap();
        assert!(price1 < price2);
    }
}
