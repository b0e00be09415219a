// packages/engine/src/runtime/record.rs
//! Execution records and their state machine
//!
//! ```text
//! CREATED ──► RUNNING ──► COMPLETED | FAILED | TIMEOUT | CANCELLED
//!    │                                                  ▲
//!    └──────────────────────────────────────────────────┘ (cancelled while queued)
//! ```
//!
//! Terminal states are set exactly once. `CREATED` is entered at
//! registration, before admission, so queue wait is measured from record
//! creation to slot grant.

use crate::session::UserSessionContext;
use crate::utils::errors::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{Duration, Instant};

/// Longest result summary stored on a record
const SUMMARY_MAX_CHARS: usize = 200;

/// Lifecycle state of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Created,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed
                | ExecutionState::Failed
                | ExecutionState::Timeout
                | ExecutionState::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: ExecutionState) -> bool {
        match (self, next) {
            (ExecutionState::Created, ExecutionState::Running) => true,
            (ExecutionState::Created, ExecutionState::Cancelled) => true,
            (ExecutionState::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionState::Created => "created",
            ExecutionState::Running => "running",
            ExecutionState::Completed => "completed",
            ExecutionState::Failed => "failed",
            ExecutionState::Timeout => "timeout",
            ExecutionState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-flight bookkeeping for one execution
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub agent_name: String,
    pub user_id: String,
    pub run_id: String,
    pub state: ExecutionState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub timeout: Duration,
    pub error: Option<String>,
    pub result_summary: Option<String>,
    pub metadata: Map<String, Value>,

    created_instant: Instant,
    started_instant: Option<Instant>,
    completed_instant: Option<Instant>,
}

impl ExecutionRecord {
    /// Create a record in `CREATED` owned by the session's user
    pub fn new(
        execution_id: impl Into<String>,
        agent_name: impl Into<String>,
        context: &UserSessionContext,
        timeout: Duration,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            agent_name: agent_name.into(),
            user_id: context.user_id().to_string(),
            run_id: context.run_id().to_string(),
            state: ExecutionState::Created,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            timeout,
            error: None,
            result_summary: None,
            metadata,
            created_instant: Instant::now(),
            started_instant: None,
            completed_instant: None,
        }
    }

    fn transition(&mut self, next: ExecutionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Admission granted
    pub fn mark_running(&mut self) -> Result<()> {
        self.transition(ExecutionState::Running)?;
        self.started_at = Some(Utc::now());
        self.started_instant = Some(Instant::now());
        Ok(())
    }

    /// Set the terminal state
    pub fn finish(
        &mut self,
        state: ExecutionState,
        error: Option<String>,
        result: Option<&Value>,
    ) -> Result<()> {
        if !state.is_terminal() {
            return Err(EngineError::InvalidTransition {
                from: self.state,
                to: state,
            });
        }
        self.transition(state)?;
        self.completed_at = Some(Utc::now());
        self.completed_instant = Some(Instant::now());
        self.error = error;
        self.result_summary = result.map(summarize);
        Ok(())
    }

    /// Time between registration and admission (or now, if still queued)
    pub fn queue_wait(&self) -> Duration {
        match self.started_instant {
            Some(started) => started.duration_since(self.created_instant),
            None => self
                .completed_instant
                .unwrap_or_else(Instant::now)
                .duration_since(self.created_instant),
        }
    }

    /// Time spent running (zero if never admitted)
    pub fn execution_time(&self) -> Duration {
        match self.started_instant {
            Some(started) => self
                .completed_instant
                .unwrap_or_else(Instant::now)
                .duration_since(started),
            None => Duration::ZERO,
        }
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            execution_id: self.execution_id.clone(),
            agent_name: self.agent_name.clone(),
            state: self.state,
            created_at: self.created_at,
            completed_at: self.completed_at,
            queue_wait_ms: self.queue_wait().as_millis() as u64,
            duration_ms: self.execution_time().as_millis() as u64,
            error: self.error.clone(),
            result_summary: self.result_summary.clone(),
        }
    }
}

/// History entry kept after an execution leaves the active map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub execution_id: String,
    pub agent_name: String,
    pub state: ExecutionState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub queue_wait_ms: u64,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub result_summary: Option<String>,
}

fn summarize(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        text
    } else {
        let mut cut: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        cut.push('…');
        cut
    }
}
