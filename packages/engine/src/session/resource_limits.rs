// packages/engine/src/session/resource_limits.rs
//! Per-session resource limits
//!
//! A session may override how many executions run at once and how long each
//! may take. Unset values fall back to the engine's [`ExecutionConfig`].

use crate::utils::config::ExecutionConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for per-session concurrency
pub const MAX_CONCURRENT_LIMIT: usize = 64;

/// Upper bound for per-session timeouts (one hour)
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Resource limits attached to a user session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Simultaneous executions admitted for this session
    /// Example: 1 = strictly sequential
    pub max_concurrent_executions: Option<usize>,

    /// Hard deadline per execution in seconds
    pub execution_timeout_secs: Option<u64>,
}

impl ResourceLimits {
    /// Strict limits (untrusted or free-tier sessions)
    pub fn strict() -> Self {
        Self {
            max_concurrent_executions: Some(1),
            execution_timeout_secs: Some(10),
        }
    }

    /// Relaxed limits (internal or development sessions)
    pub fn relaxed() -> Self {
        Self {
            max_concurrent_executions: Some(8),
            execution_timeout_secs: Some(120),
        }
    }

    /// Validate resource limits
    pub fn validate(&self) -> Result<(), String> {
        if let Some(concurrent) = self.max_concurrent_executions {
            if concurrent == 0 {
                return Err("Concurrent execution limit cannot be 0".to_string());
            }
            if concurrent > MAX_CONCURRENT_LIMIT {
                return Err(format!(
                    "Concurrent execution limit cannot exceed {}",
                    MAX_CONCURRENT_LIMIT
                ));
            }
        }

        if let Some(timeout) = self.execution_timeout_secs {
            if timeout == 0 {
                return Err("Execution timeout cannot be 0".to_string());
            }
            if timeout > MAX_TIMEOUT_SECS {
                return Err(format!(
                    "Execution timeout cannot exceed {}s",
                    MAX_TIMEOUT_SECS
                ));
            }
        }

        Ok(())
    }

    /// Combine with engine defaults; session values win
    pub fn resolve(&self, defaults: &ExecutionConfig) -> EffectiveLimits {
        EffectiveLimits {
            max_concurrent: self
                .max_concurrent_executions
                .unwrap_or(defaults.max_concurrent),
            timeout: self
                .execution_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| defaults.timeout()),
        }
    }
}

/// Limits actually enforced by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveLimits {
    pub max_concurrent: usize,
    pub timeout: Duration,
}
