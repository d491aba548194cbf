//! Error types for the core domain

use thiserror::Error;

/// Main error type for the core domain
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid OCC option symbol: {0}")]
    InvalidOccSymbol(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid interval string: {0}")]
    InvalidInterval(String),

    #[error("Invalid order side: {0}")]
    InvalidOrderSide(String),

    #[error("Invalid order status: {0}")]
    InvalidOrderStatus(String),

    #[error("Invalid order transition: {0}")]
    InvalidOrderTransition(String),

    #[error("Invalid strategy binding: {0}")]
    InvalidBinding(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Decimal conversion error: {0}")]
    DecimalError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidSymbol("test".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: test");
    }

    #[test]
    fn test_error_from_serde() {
        let json_err = serde_json::from_str::<i32>("not a number");
        let err: Error = json_err.unwrap_err().into();
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
