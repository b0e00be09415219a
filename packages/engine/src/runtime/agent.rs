// packages/engine/src/runtime/agent.rs
//! Agent collaborator contracts
//!
//! The engine never caches agents: each execution asks the injected
//! [`AgentFactory`] for a fresh [`AgentHandle`], runs it once and drops it.
//! The factory reference is per engine, which keeps agent state from
//! bleeding across users or across calls within one session.

use crate::events::dispatcher::ProgressReporter;
use crate::session::UserSessionContext;
use crate::utils::errors::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an agent reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl AgentOutcome {
    pub fn succeeded(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Agent-reported failure (not an exception)
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A single-use agent instance
#[async_trait]
pub trait AgentHandle: Send + Sync {
    async fn run(
        &self,
        input: Value,
        context: &UserSessionContext,
        progress: &ProgressReporter,
    ) -> Result<AgentOutcome, AgentError>;
}

/// Manufactures agent instances by name
#[async_trait]
pub trait AgentFactory: Send + Sync {
    /// Fails with [`AgentError::NotFound`] for unknown names
    async fn create_instance(
        &self,
        agent_name: &str,
        context: &UserSessionContext,
    ) -> Result<Box<dyn AgentHandle>, AgentError>;
}
