use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("core error: {0}")]
    Core(#[from] kernel_core::Error),

    #[error("store error: {0}")]
    Store(#[from] kernel_store::Error),

    #[error("broker error: {0}")]
    Broker(#[from] kernel_broker::Error),

    /// Caught by the scheduler: the offending strategy is unbound, the tick
    /// loop continues unless no bindings remain.
    #[error("strategy '{name}' crashed in {phase}: {reason}")]
    StrategyCrash {
        name: String,
        phase: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
