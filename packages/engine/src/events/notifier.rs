// packages/engine/src/events/notifier.rs
//! Lifecycle notification contract
//!
//! The engine does not deliver notifications itself; it calls an
//! [`EventNotifier`] supplied by the host (websocket bridge, SSE stream,
//! test recorder). Every call returns an ack; `false` means the event was not
//! delivered and is logged, never retried.

use crate::runtime::record::ExecutionState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sent once an execution holds an admission slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStarted {
    pub execution_id: String,
    pub user_id: String,
    pub run_id: String,
    pub thread_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Free-form progress from the engine or the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentThinking {
    pub execution_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A tool call is about to run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecuting {
    pub execution_id: String,
    pub call_id: String,
    pub tool_name: String,
    pub parameters: Value,
    pub timestamp: DateTime<Utc>,
}

/// How a tool call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Succeeded,
    Failed,
    /// The execution finished before the tool returned
    Abandoned,
}

/// Closes a [`ToolExecuting`] with the same `call_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCompleted {
    pub execution_id: String,
    pub call_id: String,
    pub tool_name: String,
    pub status: ToolStatus,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The single terminal notification of an execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCompleted {
    pub execution_id: String,
    pub success: bool,
    pub state: ExecutionState,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub result: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Sink for execution lifecycle notifications
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn agent_started(&self, agent_name: &str, payload: &AgentStarted) -> bool;

    async fn agent_thinking(&self, agent_name: &str, payload: &AgentThinking) -> bool;

    async fn tool_executing(&self, agent_name: &str, payload: &ToolExecuting) -> bool;

    async fn tool_completed(&self, agent_name: &str, payload: &ToolCompleted) -> bool;

    async fn agent_completed(&self, agent_name: &str, payload: &AgentCompleted) -> bool;

    /// Release delivery resources; called once from engine cleanup
    async fn shutdown(&self) {}
}

/// Notifier that acknowledges and discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn agent_started(&self, _agent_name: &str, _payload: &AgentStarted) -> bool {
        true
    }

    async fn agent_thinking(&self, _agent_name: &str, _payload: &AgentThinking) -> bool {
        true
    }

    async fn tool_executing(&self, _agent_name: &str, _payload: &ToolExecuting) -> bool {
        true
    }

    async fn tool_completed(&self, _agent_name: &str, _payload: &ToolCompleted) -> bool {
        true
    }

    async fn agent_completed(&self, _agent_name: &str, _payload: &AgentCompleted) -> bool {
        true
    }
}
