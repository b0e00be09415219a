// packages/engine/src/session/context.rs
//! User session identity
//!
//! A [`UserSessionContext`] names the (user, thread, run) triple an engine
//! serves. It is immutable once built; the engine validates it at
//! construction and stamps its user id on every execution record.

use crate::session::resource_limits::ResourceLimits;
use crate::utils::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Identity of the session owning an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSessionContext {
    user_id: String,
    thread_id: String,
    run_id: String,
    #[serde(default)]
    limits: ResourceLimits,
}

impl UserSessionContext {
    pub fn new(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            limits: ResourceLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Check that this context may own an engine.
    ///
    /// User and run ids must be non-blank and the run id must not be one of
    /// `reserved_run_ids`.
    pub fn validate(&self, reserved_run_ids: &[String]) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(EngineError::Configuration(
                "Session context requires a non-empty user id".into(),
            ));
        }
        if self.run_id.trim().is_empty() {
            return Err(EngineError::Configuration(
                "Session context requires a non-empty run id".into(),
            ));
        }
        if reserved_run_ids.iter().any(|r| r == &self.run_id) {
            return Err(EngineError::Configuration(format!(
                "Run id '{}' is reserved and cannot own an engine",
                self.run_id
            )));
        }

        self.limits
            .validate()
            .map_err(|e| EngineError::Configuration(format!("Invalid session limits: {}", e)))
    }
}
