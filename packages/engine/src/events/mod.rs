// packages/engine/src/events/mod.rs
//! Lifecycle notifications
//!
//! - **Notifier**: the host-implemented sink for UI-facing events
//! - **Dispatcher**: per-execution ordering, tool-call pairing, delivery bounds
//! - **Tracker**: optional liveness/observability collaborator
//!
//! # Event order per execution
//!
//! ```text
//! agent_started
//!     ├─ agent_thinking          (0..n, incl. "queued due to load")
//!     ├─ tool_executing ─┐
//!     │  tool_completed ◄┘       (always paired)
//! agent_completed                (exactly once, success or failure)
//! ```

pub mod dispatcher;
pub mod notifier;
pub mod tracker;

pub use dispatcher::{ExecutionEvents, ExecutionScope, NotificationDispatcher, ProgressReporter};
pub use notifier::{
    AgentCompleted, AgentStarted, AgentThinking, EventNotifier, NoopNotifier, ToolCompleted,
    ToolExecuting, ToolStatus,
};
pub use tracker::ExecutionTracker;
