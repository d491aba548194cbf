//! Durable fill records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::symbol::Symbol;
use crate::types::{Price, Quantity};

use super::order::OrderSide;

/// A durable record of one fill: {timestamp, symbol, side, quantity, price,
/// algorithm_name}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub quantity: Quantity,
    pub price: Price,
    pub algorithm_name: String,
}

/// Append-only log of [`Transaction`]s with an optional retention window.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
    retention: Option<Duration>,
}

impl TransactionLog {
    pub fn new(retention: Option<Duration>) -> Self {
        Self {
            entries: Vec::new(),
            retention,
        }
    }

    /// Appends a transaction, then evicts entries older than the retention
    /// window relative to this transaction's timestamp.
    pub fn record(&mut self, transaction: Transaction) {
        let now = transaction.timestamp;
        self.entries.push(transaction);
        if let Some(window) = self.retention {
            let cutoff = now - window;
            self.entries.retain(|t| t.timestamp >= cutoff);
        }
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tx(minute: i64) -> Transaction {
        Transaction {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            symbol: Symbol::new("AAPL").unwrap(),
            side: OrderSide::Buy,
            quantity: Quantity::new(dec!(1)).unwrap(),
            price: Price::new(dec!(100)).unwrap(),
            algorithm_name: "test".to_string(),
        }
    }

    #[test]
    fn test_append_only_growth() {
        let mut log = TransactionLog::new(None);
        log.record(tx(0));
        log.record(tx(1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_retention_window_evicts_old_entries() {
        let mut log = TransactionLog::new(Some(Duration::minutes(5)));
        log.record(tx(0));
        log.record(tx(10));
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].timestamp, tx(10).timestamp);
    }
}
