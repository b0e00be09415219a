// packages/engine/src/events/dispatcher.rs
//! Notification dispatch glue
//!
//! Wraps the host's [`EventNotifier`] and enforces the per-execution event
//! contract:
//!
//! ```text
//! started ──► thinking* / (tool_executing ─► tool_completed)* ──► completed
//! ```
//!
//! Emission for one execution is serialised through an async emission lock,
//! so progress reported by a still-running agent task can never overtake the
//! terminal `completed` event. Tool calls left open when the execution ends
//! are closed as [`ToolStatus::Abandoned`] before `completed` goes out.
//! Delivery failures are logged and otherwise ignored.

use crate::events::notifier::{
    AgentCompleted, AgentStarted, AgentThinking, EventNotifier, NoopNotifier, ToolCompleted,
    ToolExecuting, ToolStatus,
};
use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Identity stamped on every event of one execution
#[derive(Debug, Clone)]
pub struct ExecutionScope {
    pub execution_id: String,
    pub agent_name: String,
    pub user_id: String,
    pub run_id: String,
    pub thread_id: Option<String>,
}

/// Engine-side handle on the host notifier
pub struct NotificationDispatcher {
    notifier: Arc<dyn EventNotifier>,
    timeout: Duration,
}

impl NotificationDispatcher {
    /// `timeout` bounds every single notifier call
    pub fn new(notifier: Arc<dyn EventNotifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Open the event channel for one execution
    pub fn open(&self, scope: ExecutionScope) -> ExecutionEvents {
        ExecutionEvents {
            inner: Arc::new(ChannelInner {
                notifier: Arc::clone(&self.notifier),
                timeout: self.timeout,
                scope,
                state: Mutex::new(EmissionState {
                    phase: Phase::Pending,
                    open_tools: Vec::new(),
                }),
                next_call: AtomicU64::new(1),
            }),
        }
    }

    /// Release notifier resources
    pub async fn shutdown(&self) {
        self.notifier.shutdown().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Started,
    Finished,
}

struct EmissionState {
    phase: Phase,
    /// (call_id, tool_name) of tool calls awaiting their completion event
    open_tools: Vec<(String, String)>,
}

struct ChannelInner {
    notifier: Arc<dyn EventNotifier>,
    timeout: Duration,
    scope: ExecutionScope,
    state: Mutex<EmissionState>,
    next_call: AtomicU64,
}

/// Ordered event channel for a single execution
#[derive(Clone)]
pub struct ExecutionEvents {
    inner: Arc<ChannelInner>,
}

impl fmt::Debug for ExecutionEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEvents")
            .field("scope", &self.inner.scope)
            .finish()
    }
}

impl ExecutionEvents {
    pub fn scope(&self) -> &ExecutionScope {
        &self.inner.scope
    }

    /// Handle given to the agent for progress and tool reporting
    pub fn reporter(&self) -> ProgressReporter {
        ProgressReporter {
            events: self.clone(),
        }
    }

    /// Emit `started`. Only the first call emits.
    pub async fn started(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.phase != Phase::Pending {
            return false;
        }
        state.phase = Phase::Started;
        self.emit_started().await
    }

    /// Emit a `thinking` event between `started` and `completed`
    pub async fn thinking(&self, message: impl Into<String>) -> bool {
        let state = self.inner.state.lock().await;
        if state.phase != Phase::Started {
            debug!(
                execution_id = %self.inner.scope.execution_id,
                "Dropping thinking event outside the running phase"
            );
            return false;
        }

        let payload = AgentThinking {
            execution_id: self.inner.scope.execution_id.clone(),
            message: message.into(),
            timestamp: Utc::now(),
        };
        self.deliver(
            "agent_thinking",
            self.inner
                .notifier
                .agent_thinking(&self.inner.scope.agent_name, &payload),
        )
        .await
    }

    /// Run `call` bracketed by a `tool_executing`/`tool_completed` pair
    pub async fn run_tool<T, E, F>(&self, tool_name: &str, parameters: Value, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let call_id = self.open_tool(tool_name, parameters).await;
        let result = call.await;

        if let Some(call_id) = call_id {
            let (status, error) = match &result {
                Ok(_) => (ToolStatus::Succeeded, None),
                Err(e) => (ToolStatus::Failed, Some(e.to_string())),
            };
            self.close_tool(&call_id, status, error).await;
        }

        result
    }

    /// Emit the terminal `completed` event.
    ///
    /// Emits `started` first if the execution never got that far and closes
    /// any open tool calls as abandoned. Returns `false` without emitting if
    /// the execution already completed.
    pub async fn completed(&self, payload: AgentCompleted) -> bool {
        let mut state = self.inner.state.lock().await;
        match state.phase {
            Phase::Finished => return false,
            Phase::Pending => {
                self.emit_started().await;
            }
            Phase::Started => {}
        }

        for (call_id, tool_name) in std::mem::take(&mut state.open_tools) {
            debug!(
                execution_id = %self.inner.scope.execution_id,
                tool = %tool_name,
                "Closing abandoned tool call"
            );
            self.emit_tool_completed(call_id, tool_name, ToolStatus::Abandoned, None)
                .await;
        }

        state.phase = Phase::Finished;
        self.deliver(
            "agent_completed",
            self.inner
                .notifier
                .agent_completed(&self.inner.scope.agent_name, &payload),
        )
        .await
    }

    pub async fn is_finished(&self) -> bool {
        self.inner.state.lock().await.phase == Phase::Finished
    }

    async fn open_tool(&self, tool_name: &str, parameters: Value) -> Option<String> {
        let mut state = self.inner.state.lock().await;
        if state.phase != Phase::Started {
            return None;
        }

        let call_id = format!(
            "{}:{}",
            self.inner.scope.execution_id,
            self.inner.next_call.fetch_add(1, Ordering::Relaxed)
        );
        state
            .open_tools
            .push((call_id.clone(), tool_name.to_string()));

        let payload = ToolExecuting {
            execution_id: self.inner.scope.execution_id.clone(),
            call_id: call_id.clone(),
            tool_name: tool_name.to_string(),
            parameters,
            timestamp: Utc::now(),
        };
        self.deliver(
            "tool_executing",
            self.inner
                .notifier
                .tool_executing(&self.inner.scope.agent_name, &payload),
        )
        .await;

        Some(call_id)
    }

    async fn close_tool(&self, call_id: &str, status: ToolStatus, error: Option<String>) {
        let mut state = self.inner.state.lock().await;
        // Already closed as abandoned by `completed`
        let Some(pos) = state.open_tools.iter().position(|(id, _)| id == call_id) else {
            return;
        };
        let (call_id, tool_name) = state.open_tools.remove(pos);
        self.emit_tool_completed(call_id, tool_name, status, error)
            .await;
    }

    async fn emit_started(&self) -> bool {
        let scope = &self.inner.scope;
        let payload = AgentStarted {
            execution_id: scope.execution_id.clone(),
            user_id: scope.user_id.clone(),
            run_id: scope.run_id.clone(),
            thread_id: scope.thread_id.clone(),
            timestamp: Utc::now(),
        };
        self.deliver(
            "agent_started",
            self.inner.notifier.agent_started(&scope.agent_name, &payload),
        )
        .await
    }

    async fn emit_tool_completed(
        &self,
        call_id: String,
        tool_name: String,
        status: ToolStatus,
        error: Option<String>,
    ) -> bool {
        let payload = ToolCompleted {
            execution_id: self.inner.scope.execution_id.clone(),
            call_id,
            tool_name,
            status,
            error,
            timestamp: Utc::now(),
        };
        self.deliver(
            "tool_completed",
            self.inner
                .notifier
                .tool_completed(&self.inner.scope.agent_name, &payload),
        )
        .await
    }

    async fn deliver<F>(&self, kind: &'static str, delivery: F) -> bool
    where
        F: Future<Output = bool>,
    {
        match tokio::time::timeout(self.inner.timeout, delivery).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    execution_id = %self.inner.scope.execution_id,
                    agent = %self.inner.scope.agent_name,
                    "Notifier rejected {} event",
                    kind
                );
                false
            }
            Err(_) => {
                warn!(
                    execution_id = %self.inner.scope.execution_id,
                    agent = %self.inner.scope.agent_name,
                    "Notifier timed out delivering {} event after {:?}",
                    kind,
                    self.inner.timeout
                );
                false
            }
        }
    }
}

/// Progress handle passed to agents
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    events: ExecutionEvents,
}

impl ProgressReporter {
    /// Reporter that discards everything, for exercising agents outside an engine
    pub fn detached(execution_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        let dispatcher =
            NotificationDispatcher::new(Arc::new(NoopNotifier), Duration::from_secs(1));
        dispatcher
            .open(ExecutionScope {
                execution_id: execution_id.into(),
                agent_name: agent_name.into(),
                user_id: String::new(),
                run_id: String::new(),
                thread_id: None,
            })
            .reporter()
    }

    pub fn execution_id(&self) -> &str {
        &self.events.scope().execution_id
    }

    pub fn agent_name(&self) -> &str {
        &self.events.scope().agent_name
    }

    pub async fn thinking(&self, message: impl Into<String>) -> bool {
        self.events.thinking(message).await
    }

    pub async fn run_tool<T, E, F>(&self, tool_name: &str, parameters: Value, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.events.run_tool(tool_name, parameters, call).await
    }
}
