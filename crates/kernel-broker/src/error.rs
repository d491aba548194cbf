use thiserror::Error;

/// The retry/surface behavior for a broker failure differs by kind: `Auth`
/// and `Network` are retried with token refresh, `RateLimit` backs off with
/// jitter, `Rejected` and `Unsupported` surface to the caller immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerErrorKind {
    Auth,
    Network,
    RateLimit,
    Rejected,
    Unsupported,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("core error: {0}")]
    Core(#[from] kernel_core::Error),

    #[error("broker error ({kind:?}): {message}")]
    Broker {
        kind: BrokerErrorKind,
        message: String,
    },

    /// Rejected order: recorded, not raised further up the stack.
    #[error("insufficient funds: needed {needed}, have {available}")]
    InsufficientFunds {
        needed: kernel_core::Decimal,
        available: kernel_core::Decimal,
    },

    #[error("order {0} not found")]
    OrderNotFound(uuid::Uuid),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn broker(kind: BrokerErrorKind, message: impl Into<String>) -> Self {
        Error::Broker {
            kind,
            message: message.into(),
        }
    }
}
