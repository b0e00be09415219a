// packages/engine/src/utils/mod.rs
//! Common utilities: configuration and error types

pub mod config;
pub mod errors;

pub use config::{EngineConfig, ExecutionConfig, LoggingConfig, NotificationConfig};
pub use errors::{AgentError, EngineError, Result};
