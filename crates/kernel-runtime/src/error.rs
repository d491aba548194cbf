use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] kernel_store::Error),

    #[error("broker error: {0}")]
    Broker(#[from] kernel_broker::Error),

    #[error("strategy error: {0}")]
    Strategy(#[from] kernel_strategy::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
