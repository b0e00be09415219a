// packages/engine/src/observability/mod.rs
//! Logging setup
//!
//! The engine itself only emits `tracing` events and `metrics` samples; the
//! host process decides where they go. [`init_tracing`] is a convenience for
//! hosts and tests that want the standard fmt subscriber.

use crate::utils::config::LoggingConfig;
use crate::utils::errors::{EngineError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `config.level`. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| EngineError::Configuration(format!("Invalid log filter: {}", e)))?;

    let installed = if config.json {
        fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    installed.map_err(|e| EngineError::Configuration(format!("Tracing already initialised: {}", e)))
}
