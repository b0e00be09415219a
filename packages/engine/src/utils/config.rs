// packages/engine/src/utils/config.rs
//! Layered engine configuration
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. Optional config file (format picked from the extension)
//! 3. Environment variables, e.g. `AGENT_ENGINE__EXECUTION__TIMEOUT_SECS=10`

use crate::utils::errors::{EngineError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "AGENT_ENGINE";

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub execution: ExecutionConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

/// Execution defaults applied when a session does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Admission capacity (default: 3)
    pub max_concurrent: usize,

    /// Hard deadline per execution in seconds (default: 25)
    pub timeout_secs: u64,

    /// History ring buffer capacity (default: 100)
    pub history_capacity: usize,

    /// Number of timing samples kept for stats (default: 1000)
    pub stats_sample_window: usize,

    /// Queue wait above which a "queued" thinking event is sent (default: 1000)
    pub queue_notice_threshold_ms: u64,

    /// Tracker heartbeat cadence while an agent runs (default: 5)
    pub heartbeat_interval_secs: u64,

    /// Upper bound for a single tracker call (default: 1000)
    pub tracker_timeout_ms: u64,

    /// Run ids that may never own an engine
    pub reserved_run_ids: Vec<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            timeout_secs: 25,
            history_capacity: 100,
            stats_sample_window: 1000,
            queue_notice_threshold_ms: 1000,
            heartbeat_interval_secs: 5,
            tracker_timeout_ms: 1000,
            reserved_run_ids: vec!["registry".to_string()],
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn queue_notice_threshold(&self) -> Duration {
        Duration::from_millis(self.queue_notice_threshold_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn tracker_timeout(&self) -> Duration {
        Duration::from_millis(self.tracker_timeout_ms)
    }
}

/// Notification delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Upper bound for a single notifier call (default: 2000)
    pub timeout_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Log subscriber settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load from defaults and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from defaults, an optional file, and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config: EngineConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("execution.reserved_run_ids"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let exec = &self.execution;

        if exec.max_concurrent == 0 {
            return Err(EngineError::Configuration(
                "execution.max_concurrent must be at least 1".into(),
            ));
        }
        if exec.timeout_secs == 0 {
            return Err(EngineError::Configuration(
                "execution.timeout_secs must be at least 1".into(),
            ));
        }
        if exec.history_capacity == 0 {
            return Err(EngineError::Configuration(
                "execution.history_capacity must be at least 1".into(),
            ));
        }
        if exec.stats_sample_window == 0 {
            return Err(EngineError::Configuration(
                "execution.stats_sample_window must be at least 1".into(),
            ));
        }
        if exec.heartbeat_interval_secs == 0 {
            return Err(EngineError::Configuration(
                "execution.heartbeat_interval_secs must be at least 1".into(),
            ));
        }
        if exec.tracker_timeout_ms == 0 {
            return Err(EngineError::Configuration(
                "execution.tracker_timeout_ms must be at least 1".into(),
            ));
        }
        if self.notifications.timeout_ms == 0 {
            return Err(EngineError::Configuration(
                "notifications.timeout_ms must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.execution.max_concurrent, 3);
        assert_eq!(config.execution.timeout(), Duration::from_secs(25));
        assert_eq!(config.execution.history_capacity, 100);
        assert_eq!(config.execution.queue_notice_threshold(), Duration::from_secs(1));
        assert_eq!(config.execution.reserved_run_ids, vec!["registry".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[execution]\nmax_concurrent = 7\ntimeout_secs = 40\n\n[logging]\njson = true"
        )
        .unwrap();

        let config = EngineConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.execution.max_concurrent, 7);
        assert_eq!(config.execution.timeout_secs, 40);
        assert_eq!(config.execution.history_capacity, 100);
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_rejects_zero_capacity() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[execution]\nmax_concurrent = 0").unwrap();

        let err = EngineConfig::load_from(Some(file.path())).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::default();
        config.execution.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.notifications.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.execution.tracker_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
