// packages/engine/src/utils/errors.rs
//! Error types for the execution engine
//!
//! Two families live here:
//!
//! - [`EngineError`]: caller and programmer errors. These surface from
//!   `execute`/`execute_pipeline` as `Err` immediately.
//! - [`AgentError`]: operational failures raised by agent factories and
//!   handles. These never escape `execute`; the engine converts them into
//!   failed [`ExecutionResult`](crate::runtime::ExecutionResult)s.

use crate::runtime::record::ExecutionState;
use thiserror::Error;

/// Errors surfaced directly to engine callers
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid or missing constructor dependency
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request targets a different user than the one owning the engine
    #[error("Isolation violation: engine belongs to user '{engine_user}', request targets '{request_user}'")]
    IsolationViolation {
        engine_user: String,
        request_user: String,
    },

    /// Operation attempted after `cleanup()`
    #[error("Engine is inactive: cleanup() has already run")]
    InactiveEngine,

    /// Malformed request
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Illegal state machine transition
    #[error("Invalid execution state transition: {from} -> {to}")]
    InvalidTransition {
        from: ExecutionState,
        to: ExecutionState,
    },

    /// Failed to load layered configuration
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl EngineError {
    /// Whether this error must abort an enclosing pipeline instead of being
    /// recorded as a failed step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::IsolationViolation { .. } | EngineError::InactiveEngine
        )
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures produced by agent factories and agent handles
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent '{0}' is not registered")]
    NotFound(String),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("{0}")]
    Failed(String),

    #[error("Agent task panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentError {
    /// Stable type tag embedded in fallback results
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::NotFound(_) => "agent_not_found",
            AgentError::Tool { .. } => "tool_failure",
            AgentError::Failed(_) => "agent_failure",
            AgentError::Panicked(_) => "panic",
            AgentError::Other(_) => "unhandled",
        }
    }
}
