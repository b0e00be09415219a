// packages/engine/tests/common/mod.rs
//! Shared doubles for engine integration tests
#![allow(dead_code)]

use agent_session_engine::events::{
    AgentCompleted, AgentStarted, AgentThinking, EventNotifier, ExecutionTracker, ProgressReporter,
    ToolCompleted, ToolExecuting,
};
use agent_session_engine::observability::init_tracing;
use agent_session_engine::utils::LoggingConfig;
use agent_session_engine::{
    AgentError, AgentFactory, AgentHandle, AgentOutcome, ExecutionEngine, ExecutionState,
    ResourceLimits, UserSessionContext,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub fn init_logging() {
    // Several tests share one process; only the first install wins
    let _ = init_tracing(&LoggingConfig {
        level: "debug".to_string(),
        json: false,
    });
}

pub fn context(user: &str) -> UserSessionContext {
    UserSessionContext::new(user, format!("thread-{}", user), format!("run-{}", user))
}

pub fn engine(
    context: UserSessionContext,
    factory: Arc<ScriptedFactory>,
    notifier: Arc<RecordingNotifier>,
) -> ExecutionEngine {
    ExecutionEngine::builder(context)
        .agent_factory(factory)
        .event_notifier(notifier)
        .build()
        .expect("engine should build")
}

pub fn limited(user: &str, max_concurrent: usize, timeout_secs: u64) -> UserSessionContext {
    context(user).with_limits(ResourceLimits {
        max_concurrent_executions: Some(max_concurrent),
        execution_timeout_secs: Some(timeout_secs),
    })
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub seq: usize,
    pub execution_id: String,
    pub agent_name: String,
    pub kind: &'static str,
    pub detail: String,
    pub at: Instant,
}

/// Records every notification in arrival order
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Recorded>>,
    completed: Mutex<Vec<AgentCompleted>>,
    reject: bool,
    completion_delay: Option<Duration>,
    shut_down: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records events but acknowledges none of them
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject: true,
            ..Self::default()
        })
    }

    /// Takes `delay` to acknowledge each `completed` event
    pub fn slow_completion(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            completion_delay: Some(delay),
            ..Self::default()
        })
    }

    fn push(&self, execution_id: &str, agent_name: &str, kind: &'static str, detail: String) -> bool {
        let mut events = self.events.lock();
        let seq = events.len();
        events.push(Recorded {
            seq,
            execution_id: execution_id.to_string(),
            agent_name: agent_name.to_string(),
            kind,
            detail,
            at: Instant::now(),
        });
        !self.reject
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    pub fn for_execution(&self, execution_id: &str) -> Vec<Recorded> {
        self.events()
            .into_iter()
            .filter(|e| e.execution_id == execution_id)
            .collect()
    }

    pub fn kinds(&self, execution_id: &str) -> Vec<&'static str> {
        self.for_execution(execution_id)
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    pub fn find(&self, execution_id: &str, kind: &str) -> Option<Recorded> {
        self.for_execution(execution_id)
            .into_iter()
            .find(|e| e.kind == kind)
    }

    pub fn completions(&self) -> Vec<AgentCompleted> {
        self.completed.lock().clone()
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shut_down.lock()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn agent_started(&self, agent_name: &str, payload: &AgentStarted) -> bool {
        self.push(&payload.execution_id, agent_name, "started", payload.user_id.clone())
    }

    async fn agent_thinking(&self, agent_name: &str, payload: &AgentThinking) -> bool {
        self.push(&payload.execution_id, agent_name, "thinking", payload.message.clone())
    }

    async fn tool_executing(&self, agent_name: &str, payload: &ToolExecuting) -> bool {
        self.push(&payload.execution_id, agent_name, "tool_executing", payload.call_id.clone())
    }

    async fn tool_completed(&self, agent_name: &str, payload: &ToolCompleted) -> bool {
        self.push(
            &payload.execution_id,
            agent_name,
            "tool_completed",
            format!("{}:{:?}", payload.call_id, payload.status),
        )
    }

    async fn agent_completed(&self, agent_name: &str, payload: &AgentCompleted) -> bool {
        if let Some(delay) = self.completion_delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.lock().push(payload.clone());
        self.push(
            &payload.execution_id,
            agent_name,
            "completed",
            payload.state.to_string(),
        )
    }

    async fn shutdown(&self) {
        *self.shut_down.lock() = true;
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Agent behaviour chosen by name:
///
/// - `echo` returns its input
/// - `sleep:<ms>` sleeps, then succeeds
/// - `report_failure` returns an agent-reported failure
/// - `error` returns `AgentError::Failed`
/// - `panic` panics
/// - `tool:<ms>` reports thinking, runs a `search` tool for `<ms>`, then succeeds
/// - anything else is unknown
#[derive(Default)]
pub struct ScriptedFactory {
    created: AtomicUsize,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    seen_users: Mutex<Vec<String>>,
}

impl ScriptedFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn seen_users(&self) -> Vec<String> {
        self.seen_users.lock().clone()
    }
}

#[async_trait]
impl AgentFactory for ScriptedFactory {
    async fn create_instance(
        &self,
        agent_name: &str,
        context: &UserSessionContext,
    ) -> Result<Box<dyn AgentHandle>, AgentError> {
        let (kind, arg) = match agent_name.split_once(':') {
            Some((kind, arg)) => (kind, arg.parse::<u64>().unwrap_or(0)),
            None => (agent_name, 0),
        };
        let script = match kind {
            "echo" => Script::Echo,
            "sleep" => Script::Sleep(Duration::from_millis(arg)),
            "report_failure" => Script::ReportFailure,
            "error" => Script::Error,
            "panic" => Script::Panic,
            "tool" => Script::Tool(Duration::from_millis(arg)),
            _ => return Err(AgentError::NotFound(agent_name.to_string())),
        };

        self.created.fetch_add(1, Ordering::SeqCst);
        self.seen_users.lock().push(context.user_id().to_string());
        Ok(Box::new(ScriptedAgent {
            script,
            running: Arc::clone(&self.running),
            peak: Arc::clone(&self.peak),
        }))
    }
}

enum Script {
    Echo,
    Sleep(Duration),
    ReportFailure,
    Error,
    Panic,
    Tool(Duration),
}

struct ScriptedAgent {
    script: Script,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Decrements the running count even when the task is aborted or panics
struct Running(Arc<AtomicUsize>);

impl Drop for Running {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AgentHandle for ScriptedAgent {
    async fn run(
        &self,
        input: Value,
        _context: &UserSessionContext,
        progress: &ProgressReporter,
    ) -> Result<AgentOutcome, AgentError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _running = Running(Arc::clone(&self.running));

        match &self.script {
            Script::Echo => Ok(AgentOutcome::succeeded(input)),
            Script::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(AgentOutcome::succeeded(
                    json!({"slept_ms": duration.as_millis() as u64}),
                ))
            }
            Script::ReportFailure => Ok(AgentOutcome::failed("quota exceeded")),
            Script::Error => Err(AgentError::Failed("model backend unreachable".into())),
            Script::Panic => panic!("agent exploded"),
            Script::Tool(duration) => {
                progress.thinking("planning search").await;
                let hits = progress
                    .run_tool("search", json!({"q": input}), async {
                        tokio::time::sleep(*duration).await;
                        Ok::<_, AgentError>(3)
                    })
                    .await?;
                Ok(AgentOutcome::succeeded(json!({"hits": hits})))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingTracker {
    next_id: AtomicUsize,
    states: Mutex<Vec<(String, ExecutionState)>>,
    heartbeats: Mutex<HashMap<String, usize>>,
    create_delay: Option<Duration>,
    heartbeat_delay: Option<Duration>,
}

impl RecordingTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registration takes `delay` before returning an id
    pub fn slow_registration(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            create_delay: Some(delay),
            ..Self::default()
        })
    }

    /// Each heartbeat takes `delay` to return
    pub fn slow_heartbeats(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            heartbeat_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn states(&self, execution_id: &str) -> Vec<ExecutionState> {
        self.states
            .lock()
            .iter()
            .filter(|(id, _)| id == execution_id)
            .map(|(_, state)| *state)
            .collect()
    }

    pub fn heartbeats(&self, execution_id: &str) -> usize {
        self.heartbeats
            .lock()
            .get(execution_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ExecutionTracker for RecordingTracker {
    async fn create_execution(
        &self,
        _agent_name: &str,
        context: &UserSessionContext,
        _timeout_secs: u64,
    ) -> String {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("trk-{}-{}", context.user_id(), n)
    }

    async fn update_state(&self, execution_id: &str, state: ExecutionState, _error: Option<&str>) {
        self.states.lock().push((execution_id.to_string(), state));
    }

    async fn heartbeat(&self, execution_id: &str) {
        if let Some(delay) = self.heartbeat_delay {
            tokio::time::sleep(delay).await;
        }
        *self
            .heartbeats
            .lock()
            .entry(execution_id.to_string())
            .or_insert(0) += 1;
    }
}
