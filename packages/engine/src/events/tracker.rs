// packages/engine/src/events/tracker.rs
//! Optional execution tracker
//!
//! External liveness monitors implement [`ExecutionTracker`] to follow
//! executions. The engine heartbeats before dispatch, periodically while the
//! agent runs, and after dispatch, so a monitor can tell a slow agent from a
//! stuck one.

use crate::runtime::record::ExecutionState;
use crate::session::UserSessionContext;
use async_trait::async_trait;

#[async_trait]
pub trait ExecutionTracker: Send + Sync {
    /// Register a new execution and return the id the engine should use
    async fn create_execution(
        &self,
        agent_name: &str,
        context: &UserSessionContext,
        timeout_secs: u64,
    ) -> String;

    async fn update_state(&self, execution_id: &str, state: ExecutionState, error: Option<&str>);

    async fn heartbeat(&self, execution_id: &str);
}
