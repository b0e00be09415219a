// packages/engine/src/lib.rs
//! Agent Session Engine Library
//!
//! This library provides the concurrency and lifecycle core for running AI
//! agents on behalf of many users at once, one isolated engine per session.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **runtime**: Execution engine, admission control, state machine, pipelines
//! - **events**: Notifier contract, ordered per-execution dispatch, tracker
//! - **recording**: Bounded history and execution statistics
//! - **session**: User session identity and per-session limits
//! - **observability**: Tracing subscriber setup
//! - **utils**: Configuration and error types
//!
//! # Example
//!
//! ```no_run
//! use agent_session_engine::{ExecutionEngine, ExecutionRequest, UserSessionContext};
//! # use agent_session_engine::{AgentFactory, EventNotifier};
//! # use std::sync::Arc;
//! # async fn demo(factory: Arc<dyn AgentFactory>, notifier: Arc<dyn EventNotifier>) -> agent_session_engine::Result<()> {
//! let context = UserSessionContext::new("user-1", "thread-1", "run-1");
//! let engine = ExecutionEngine::builder(context.clone())
//!     .agent_factory(factory)
//!     .event_notifier(notifier)
//!     .build()?;
//!
//! let request = ExecutionRequest::new("triage", &context, serde_json::json!({"q": "hi"}));
//! let result = engine.execute(request).await?;
//! println!("{}: {:?}", result.state, result.data);
//!
//! engine.cleanup().await;
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod events;
pub mod observability;
pub mod recording;
pub mod runtime;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use events::{EventNotifier, ExecutionTracker, NoopNotifier, ProgressReporter};
pub use recording::StatsSnapshot;
pub use runtime::{
    AgentFactory, AgentHandle, AgentOutcome, EngineBuilder, ExecutionEngine, ExecutionRecord,
    ExecutionRequest, ExecutionResult, ExecutionState, ExecutionSummary, PipelineStep,
};
pub use session::{ResourceLimits, UserSessionContext};
pub use utils::config::EngineConfig;
pub use utils::errors::{AgentError, EngineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
