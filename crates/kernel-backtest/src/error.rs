use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("runtime error: {0}")]
    Runtime(#[from] kernel_runtime::Error),

    #[error("store error: {0}")]
    Store(#[from] kernel_store::Error),

    /// Fatal at setup: the requested `[start, end]` window cannot
    /// be satisfied for `symbol`/`interval` across every bound strategy's
    /// declared aggregations.
    #[error("insufficient history for {symbol} at {interval}: have [{have_start}, {have_end}], need [{need_start}, {need_end}]")]
    InsufficientHistory {
        symbol: String,
        interval: String,
        have_start: String,
        have_end: String,
        need_start: String,
        need_end: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
