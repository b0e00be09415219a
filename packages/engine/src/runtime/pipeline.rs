// packages/engine/src/runtime/pipeline.rs
//! Sequential multi-agent pipelines
//!
//! Each step is an ordinary [`ExecutionEngine::execute`] call, so admission,
//! notifications, timeouts and history apply per step. A failed step stops
//! the pipeline unless it carries `continue_on_error`.

use crate::runtime::engine::ExecutionEngine;
use crate::runtime::types::{ExecutionRequest, ExecutionResult, PipelineStep};
use crate::utils::errors::{EngineError, Result};
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Metadata key carrying a step's zero-based position
pub const PIPELINE_STEP_KEY: &str = "pipeline_step";

impl ExecutionEngine {
    /// Run `steps` in order, deriving each request from `base_request`.
    ///
    /// Returns one result per step that ran. Isolation violations and calls
    /// on an inactive engine are returned as `Err`; any other per-step error
    /// becomes a failed result in place.
    #[instrument(
        name = "pipeline",
        skip_all,
        fields(steps = steps.len(), user_id = %self.context().user_id())
    )]
    pub async fn execute_pipeline(
        &self,
        steps: &[PipelineStep],
        base_request: &ExecutionRequest,
    ) -> Result<Vec<ExecutionResult>> {
        if !self.is_active() {
            return Err(EngineError::InactiveEngine);
        }
        self.check_isolation(base_request)?;

        let mut results = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let request = step_request(base_request, step, index);

            let result = match self.execute(request).await {
                Ok(result) => result,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!("Pipeline step {} ('{}') rejected: {}", index, step.agent_name, err);
                    ExecutionResult::rejected(&step.agent_name, err.to_string())
                }
            };

            let failed = !result.success;
            results.push(result);

            if failed && !step.continues_on_error() {
                info!(
                    "Pipeline stopped after step {} ('{}') failed",
                    index, step.agent_name
                );
                break;
            }
        }

        Ok(results)
    }
}

fn step_request(base: &ExecutionRequest, step: &PipelineStep, index: usize) -> ExecutionRequest {
    let mut request = base.clone();
    request.agent_name = step.agent_name.clone();
    if let Some(input) = &step.input {
        request.input = input.clone();
    }
    for (key, value) in &step.metadata {
        request.metadata.insert(key.clone(), value.clone());
    }
    request
        .metadata
        .insert(PIPELINE_STEP_KEY.to_string(), Value::from(index));
    request
}
