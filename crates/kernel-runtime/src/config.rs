//! Layered runtime configuration: built-in defaults, an optional TOML file,
//! then `KERNEL_`-prefixed environment overrides.

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Which [`kernel_store::PersistenceBackend`] the runtime wires up for the
/// paper broker's account blob and the price store's candle history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceKind {
    File,
    Sql,
    None,
}

/// The kernel's own runtime configuration, never the adapter secrets, which
/// stay adapter-owned.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Seconds the tick multiplexer waits for a straggling symbol before
    /// carrying forward its last candle.
    #[serde(default = "default_multiplexer_timeout_secs")]
    pub multiplexer_timeout_secs: u64,

    /// How many times a broker adapter retries an Auth/Network error before
    /// surfacing it.
    #[serde(default = "default_broker_retry_count")]
    pub broker_retry_count: u32,

    #[serde(default = "default_persistence_backend")]
    pub persistence_backend: PersistenceKind,

    /// UTC minute-of-day the `Day1` interval boundary fires at.
    #[serde(default = "default_day_boundary_minute_of_day")]
    pub day_boundary_minute_of_day: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_multiplexer_timeout_secs() -> u64 {
    1
}

fn default_broker_retry_count() -> u32 {
    3
}

fn default_persistence_backend() -> PersistenceKind {
    PersistenceKind::None
}

fn default_day_boundary_minute_of_day() -> u32 {
    kernel_core::interval::DEFAULT_DAY_BOUNDARY_MINUTE_OF_DAY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            multiplexer_timeout_secs: default_multiplexer_timeout_secs(),
            broker_retry_count: default_broker_retry_count(),
            persistence_backend: default_persistence_backend(),
            day_boundary_minute_of_day: default_day_boundary_minute_of_day(),
            log_level: default_log_level(),
        }
    }
}

impl RuntimeConfig {
    pub fn multiplexer_timeout(&self) -> Duration {
        Duration::from_secs(self.multiplexer_timeout_secs)
    }

    /// Loads defaults, then `path` if it exists, then `KERNEL_`-prefixed
    /// environment overrides (e.g. `KERNEL_MULTIPLEXER_TIMEOUT_SECS=2`).
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let settled = builder
            .add_source(config::Environment::with_prefix("KERNEL").separator("__"))
            .build()?;
        Ok(settled.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec() {
        let config = RuntimeConfig::default();
        assert_eq!(config.multiplexer_timeout_secs, 1);
        assert_eq!(config.broker_retry_count, 3);
        assert_eq!(config.persistence_backend, PersistenceKind::None);
        assert_eq!(config.day_boundary_minute_of_day, 20 * 60);
    }

    #[test]
    fn test_load_with_no_file_falls_back_to_defaults() {
        let config = RuntimeConfig::load(Some("/nonexistent/path/kernel")).unwrap();
        assert_eq!(config.log_level, "info");
    }
}
