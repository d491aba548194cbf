use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("core error: {0}")]
    Core(#[from] kernel_core::Error),

    /// A write was rejected: missing columns, NaN in OHLC, or a timestamp
    /// not aligned to the series' interval.
    #[error("bad candle for {symbol}@{interval}: {reason}")]
    BadCandle {
        symbol: String,
        interval: String,
        reason: String,
    },

    #[error("no series stored for {symbol}@{interval}")]
    NoSeries { symbol: String, interval: String },

    #[error("persistence I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
