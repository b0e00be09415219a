// packages/engine/src/runtime/types.rs
//! Request and result types exchanged with engine callers

use crate::runtime::record::ExecutionState;
use crate::session::UserSessionContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Metadata key marking results built by the fallback synthesizer
pub const FALLBACK_RESULT_KEY: &str = "fallback_result";

/// Metadata key letting a pipeline continue past a failed step
pub const CONTINUE_ON_ERROR_KEY: &str = "continue_on_error";

/// A request to run one agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub agent_name: String,
    pub user_id: String,
    pub run_id: String,
    pub thread_id: Option<String>,
    pub input: Value,
    /// Overrides the engine's default deadline
    #[serde(default)]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ExecutionRequest {
    /// Build a request scoped to `context`
    pub fn new(agent_name: impl Into<String>, context: &UserSessionContext, input: Value) -> Self {
        Self {
            agent_name: agent_name.into(),
            user_id: context.user_id().to_string(),
            run_id: context.run_id().to_string(),
            thread_id: Some(context.thread_id().to_string()),
            input,
            timeout: None,
            metadata: Map::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Terminal outcome of one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub execution_id: String,
    pub agent_name: String,
    pub state: ExecutionState,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub queue_wait_ms: u64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ExecutionResult {
    /// Failed result for an execution that never got an id (pipeline steps
    /// rejected before dispatch)
    pub fn rejected(agent_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            execution_id: String::new(),
            agent_name: agent_name.into(),
            state: ExecutionState::Failed,
            data: None,
            error: Some(error.into()),
            duration_ms: 0,
            queue_wait_ms: 0,
            metadata: Map::new(),
        }
    }

    /// Whether the fallback synthesizer produced this result
    pub fn is_fallback(&self) -> bool {
        self.metadata
            .get(FALLBACK_RESULT_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One step of a sequential pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    pub agent_name: String,
    /// Replaces the base request input when set
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PipelineStep {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            input: None,
            metadata: Map::new(),
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Keep running later steps if this one fails
    pub fn continue_on_error(mut self) -> Self {
        self.metadata
            .insert(CONTINUE_ON_ERROR_KEY.to_string(), Value::Bool(true));
        self
    }

    pub fn continues_on_error(&self) -> bool {
        self.metadata
            .get(CONTINUE_ON_ERROR_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
