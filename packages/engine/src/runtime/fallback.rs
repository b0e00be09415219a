// packages/engine/src/runtime/fallback.rs
//! Fallback results
//!
//! Turns timeouts, dispatch errors and cancellations into well-formed failed
//! [`ExecutionResult`]s so callers of `execute` never see a raw agent error.
//! Every synthesized result carries `metadata.fallback_result = true` and the
//! owning user.

use crate::runtime::record::{ExecutionRecord, ExecutionState};
use crate::runtime::types::{ExecutionResult, FALLBACK_RESULT_KEY};
use crate::session::UserSessionContext;
use crate::utils::errors::AgentError;
use serde_json::{json, Map, Value};

/// Builds failed results scoped to one session
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    user_id: String,
    run_id: String,
}

impl FallbackSynthesizer {
    pub fn new(context: &UserSessionContext) -> Self {
        Self {
            user_id: context.user_id().to_string(),
            run_id: context.run_id().to_string(),
        }
    }

    /// Deadline expired before the agent answered
    pub fn timed_out(&self, record: &ExecutionRecord) -> ExecutionResult {
        let secs = record.timeout.as_secs_f64();
        let message = format!(
            "Agent '{}' did not finish within {:.1}s and was stopped. Please try again or simplify the request.",
            record.agent_name, secs
        );

        let mut metadata = self.base_metadata("timeout");
        metadata.insert("timeout_secs".into(), json!(secs));
        self.build(record, ExecutionState::Timeout, message, metadata)
    }

    /// Agent factory or handle failed
    pub fn from_error(&self, record: &ExecutionRecord, error: &AgentError) -> ExecutionResult {
        let message = match error {
            AgentError::NotFound(name) => format!("Agent '{}' is not available.", name),
            other => format!(
                "Agent '{}' failed unexpectedly: {}",
                record.agent_name, other
            ),
        };

        let mut metadata = self.base_metadata(error.kind());
        metadata.insert("original_error".into(), Value::String(error.to_string()));
        self.build(record, ExecutionState::Failed, message, metadata)
    }

    /// Engine was cleaned up while the execution was in flight
    pub fn cancelled(&self, record: &ExecutionRecord) -> ExecutionResult {
        let message = format!(
            "Execution of agent '{}' was cancelled because the session ended.",
            record.agent_name
        );
        self.build(
            record,
            ExecutionState::Cancelled,
            message,
            self.base_metadata("cancelled"),
        )
    }

    fn base_metadata(&self, error_type: &str) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert(FALLBACK_RESULT_KEY.into(), Value::Bool(true));
        metadata.insert("error_type".into(), Value::String(error_type.to_string()));
        metadata.insert("user_id".into(), Value::String(self.user_id.clone()));
        metadata.insert("run_id".into(), Value::String(self.run_id.clone()));
        metadata
    }

    fn build(
        &self,
        record: &ExecutionRecord,
        state: ExecutionState,
        message: String,
        metadata: Map<String, Value>,
    ) -> ExecutionResult {
        ExecutionResult {
            success: false,
            execution_id: record.execution_id.clone(),
            agent_name: record.agent_name.clone(),
            state,
            data: None,
            error: Some(message),
            duration_ms: record.execution_time().as_millis() as u64,
            queue_wait_ms: record.queue_wait().as_millis() as u64,
            metadata,
        }
    }
}
