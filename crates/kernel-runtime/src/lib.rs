//! Ties the price store, broker adapter, and bound strategies into a
//! running tick loop: the tick multiplexer, the scheduler, the clock
//! abstraction, and layered runtime configuration.

pub mod clock;
pub mod config;
pub mod error;
pub mod multiplexer;
pub mod scheduler;

pub use clock::{Clock, ReplayClock, WallClock};
pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use multiplexer::{TickMultiplexer, DEFAULT_FLUSH_TIMEOUT};
pub use scheduler::{FillPoller, Scheduler};
