// packages/engine/src/runtime/engine.rs
//! Per-session execution engine
//!
//! One [`ExecutionEngine`] serves exactly one user session. It owns the
//! admission gate, the active-execution map and the history/stats ledger,
//! and holds references to the injected agent factory and notifier. Nothing
//! here is process-global, so two sessions never share mutable state.
//!
//! # Execution flow
//!
//! ```text
//! execute(request)
//!   ├─ isolation check            (IsolationViolation, before any allocation)
//!   ├─ register record            CREATED, enters `active`
//!   ├─ admission.acquire()        waits while the session is at capacity
//!   ├─ RUNNING → started [→ thinking "queued"]
//!   ├─ dispatch                   factory.create_instance + handle.run
//!   │    └─ raced against the deadline; the loser is aborted
//!   ├─ terminal state → completed notification
//!   ├─ ledger.record(), leave `active`
//!   └─ release admission slot
//! ```

use crate::events::dispatcher::{ExecutionEvents, ExecutionScope, NotificationDispatcher};
use crate::events::notifier::{AgentCompleted, EventNotifier};
use crate::events::tracker::ExecutionTracker;
use crate::recording::ledger::ExecutionLedger;
use crate::recording::stats::StatsSnapshot;
use crate::runtime::admission::AdmissionController;
use crate::runtime::agent::{AgentFactory, AgentOutcome};
use crate::runtime::fallback::FallbackSynthesizer;
use crate::runtime::record::{ExecutionRecord, ExecutionState, ExecutionSummary};
use crate::runtime::types::{ExecutionRequest, ExecutionResult};
use crate::session::{EffectiveLimits, UserSessionContext};
use crate::utils::config::EngineConfig;
use crate::utils::errors::{AgentError, EngineError, Result};
use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::Map;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};
use ulid::Ulid;

/// An in-flight execution as seen by the engine
#[derive(Clone)]
struct ActiveExecution {
    record: Arc<Mutex<ExecutionRecord>>,
    events: ExecutionEvents,
}

/// How the agent dispatch ended
enum Dispatched {
    Finished(AgentOutcome),
    Errored(AgentError),
    TimedOut,
}

/// Builder for [`ExecutionEngine`]; the only construction path
pub struct EngineBuilder {
    context: UserSessionContext,
    factory: Option<Arc<dyn AgentFactory>>,
    notifier: Option<Arc<dyn EventNotifier>>,
    tracker: Option<Arc<dyn ExecutionTracker>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn agent_factory(mut self, factory: Arc<dyn AgentFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn event_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn tracker(mut self, tracker: Arc<dyn ExecutionTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate every dependency and build an active engine.
    ///
    /// Fails with [`EngineError::Configuration`] without creating any state
    /// if the context, limits, config, factory or notifier is missing or
    /// invalid.
    pub fn build(self) -> Result<ExecutionEngine> {
        self.config.validate()?;
        self.context
            .validate(&self.config.execution.reserved_run_ids)?;

        let factory = self.factory.ok_or_else(|| {
            EngineError::Configuration("An agent factory is required".into())
        })?;
        let notifier = self.notifier.ok_or_else(|| {
            EngineError::Configuration("An event notifier is required".into())
        })?;

        let limits = self.context.limits().resolve(&self.config.execution);
        let admission = AdmissionController::new(limits.max_concurrent)?;
        let ledger = ExecutionLedger::new(
            self.config.execution.history_capacity,
            self.config.execution.stats_sample_window,
        );
        let dispatcher = NotificationDispatcher::new(notifier, self.config.notifications.timeout());
        let fallback = FallbackSynthesizer::new(&self.context);

        info!(
            user_id = %self.context.user_id(),
            run_id = %self.context.run_id(),
            "Execution engine ready: capacity {}, timeout {:?}",
            limits.max_concurrent,
            limits.timeout
        );

        Ok(ExecutionEngine {
            context: Arc::new(self.context),
            config: self.config,
            limits,
            factory,
            dispatcher,
            tracker: self.tracker,
            admission,
            active: DashMap::new(),
            ledger,
            fallback,
            is_active: AtomicBool::new(true),
        })
    }
}

/// Concurrency and lifecycle core for one user session
pub struct ExecutionEngine {
    context: Arc<UserSessionContext>,
    config: EngineConfig,
    limits: EffectiveLimits,
    factory: Arc<dyn AgentFactory>,
    dispatcher: NotificationDispatcher,
    tracker: Option<Arc<dyn ExecutionTracker>>,
    admission: AdmissionController,
    active: DashMap<String, ActiveExecution>,
    ledger: ExecutionLedger,
    fallback: FallbackSynthesizer,
    is_active: AtomicBool,
}

impl ExecutionEngine {
    pub fn builder(context: UserSessionContext) -> EngineBuilder {
        EngineBuilder {
            context,
            factory: None,
            notifier: None,
            tracker: None,
            config: EngineConfig::default(),
        }
    }

    /// Run one agent to a terminal result.
    ///
    /// Timeouts and agent failures come back as `Ok` with `success == false`.
    /// `Err` is reserved for isolation violations, invalid arguments and
    /// calls on a cleaned-up engine.
    #[instrument(
        name = "execute",
        skip_all,
        fields(agent = %request.agent_name, user_id = %self.context.user_id())
    )]
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult> {
        self.ensure_active()?;
        self.validate_request(&request)?;

        let timeout = request.timeout.unwrap_or(self.limits.timeout);
        let execution_id = self.assign_execution_id(&request.agent_name, timeout).await;
        // cleanup() may have run while the tracker was registering
        self.ensure_active()?;

        let record = Arc::new(Mutex::new(ExecutionRecord::new(
            &execution_id,
            &request.agent_name,
            &self.context,
            timeout,
            request.metadata.clone(),
        )));
        let events = self.dispatcher.open(ExecutionScope {
            execution_id: execution_id.clone(),
            agent_name: request.agent_name.clone(),
            user_id: self.context.user_id().to_string(),
            run_id: self.context.run_id().to_string(),
            thread_id: request.thread_id.clone(),
        });
        self.active.insert(
            execution_id.clone(),
            ActiveExecution {
                record: Arc::clone(&record),
                events: events.clone(),
            },
        );
        let mut slot = ActiveSlot {
            engine: self,
            execution_id: execution_id.clone(),
            record: Arc::clone(&record),
            events: events.clone(),
            armed: true,
        };
        let _in_flight = self.ledger.enter();

        debug!(execution_id = %execution_id, "Waiting for admission");
        let permit = self.admission.acquire().await?;
        debug!(execution_id = %execution_id, "Admitted after {:?}", permit.waited());

        let queue_wait = {
            let mut record = record.lock();
            if record.mark_running().is_err() {
                // Cancelled by cleanup() between grant and here
                return Err(EngineError::InactiveEngine);
            }
            record.queue_wait()
        };

        events.started().await;
        if queue_wait > self.config.execution.queue_notice_threshold() {
            events
                .thinking(format!(
                    "Request was queued due to high load and started after {:.1}s",
                    queue_wait.as_secs_f64()
                ))
                .await;
        }
        self.track_state(&execution_id, ExecutionState::Running, None)
            .await;

        let dispatched = self
            .dispatch(&execution_id, &request, &events, timeout)
            .await;
        let result = self.conclude(&execution_id, &record, &events, dispatched).await;

        slot.armed = false;
        drop(permit);
        Ok(result)
    }

    /// Create the agent and run it against the deadline
    async fn dispatch(
        &self,
        execution_id: &str,
        request: &ExecutionRequest,
        events: &ExecutionEvents,
        timeout: Duration,
    ) -> Dispatched {
        self.heartbeat(execution_id);

        let factory = Arc::clone(&self.factory);
        let context = Arc::clone(&self.context);
        let reporter = events.reporter();
        let agent_name = request.agent_name.clone();
        let input = request.input.clone();

        let mut task = AbortOnDrop(tokio::spawn(async move {
            let agent = factory.create_instance(&agent_name, &context).await?;
            agent.run(input, &context, &reporter).await
        }));

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let period = self.config.execution.heartbeat_interval();
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let dispatched = loop {
            tokio::select! {
                joined = &mut task.0 => {
                    break match joined {
                        Ok(Ok(outcome)) => Dispatched::Finished(outcome),
                        Ok(Err(err)) => Dispatched::Errored(err),
                        Err(err) => Dispatched::Errored(join_failure(err)),
                    };
                }
                _ = &mut deadline => {
                    warn!(
                        execution_id = %execution_id,
                        "Agent '{}' exceeded {:?}, abandoning dispatch",
                        request.agent_name,
                        timeout
                    );
                    break Dispatched::TimedOut;
                }
                _ = heartbeat.tick(), if self.tracker.is_some() => {
                    self.heartbeat(execution_id);
                }
            }
        };

        // Best-effort stop; the engine does not wait for the task to unwind
        drop(task);
        self.heartbeat(execution_id);
        dispatched
    }

    /// Set the terminal state, notify, record and leave the active map
    async fn conclude(
        &self,
        execution_id: &str,
        record: &Arc<Mutex<ExecutionRecord>>,
        events: &ExecutionEvents,
        dispatched: Dispatched,
    ) -> ExecutionResult {
        let (result, finished) = {
            let mut record = record.lock();
            if record.state.is_terminal() {
                // cleanup() already cancelled and announced this execution
                (self.fallback.cancelled(&record), None)
            } else {
                let result = self.finish_record(&mut record, dispatched);
                (result, Some(record.clone()))
            }
        };

        if let Some(record) = finished {
            log_outcome(&result);
            self.ledger.record(&record);

            let notice = AgentCompleted {
                execution_id: execution_id.to_string(),
                success: result.success,
                state: result.state,
                duration_ms: result.duration_ms,
                error: result.error.clone(),
                result: result.data.clone(),
                timestamp: Utc::now(),
            };
            // Delivered on its own task so a dropped caller cannot cut it short
            let events = events.clone();
            if let Err(e) = tokio::spawn(async move { events.completed(notice).await }).await {
                warn!(execution_id = %execution_id, "Completion notice task failed: {}", e);
            }

            self.track_state(execution_id, record.state, record.error.as_deref())
                .await;
        }

        self.active.remove(execution_id);
        result
    }

    fn finish_record(&self, record: &mut ExecutionRecord, dispatched: Dispatched) -> ExecutionResult {
        let finished = match &dispatched {
            Dispatched::Finished(outcome) if outcome.success => {
                record.finish(ExecutionState::Completed, None, outcome.data.as_ref())
            }
            Dispatched::Finished(outcome) => record.finish(
                ExecutionState::Failed,
                Some(outcome_error(outcome)),
                outcome.data.as_ref(),
            ),
            Dispatched::Errored(err) => {
                record.finish(ExecutionState::Failed, Some(err.to_string()), None)
            }
            Dispatched::TimedOut => record.finish(
                ExecutionState::Timeout,
                Some(format!("Timed out after {:?}", record.timeout)),
                None,
            ),
        };
        if let Err(e) = finished {
            warn!(execution_id = %record.execution_id, "Failed to finish record: {}", e);
        }

        match dispatched {
            Dispatched::Finished(outcome) => ExecutionResult {
                success: outcome.success,
                execution_id: record.execution_id.clone(),
                agent_name: record.agent_name.clone(),
                state: record.state,
                error: if outcome.success {
                    None
                } else {
                    Some(outcome_error(&outcome))
                },
                data: outcome.data,
                duration_ms: record.execution_time().as_millis() as u64,
                queue_wait_ms: record.queue_wait().as_millis() as u64,
                metadata: Map::new(),
            },
            Dispatched::Errored(err) => self.fallback.from_error(record, &err),
            Dispatched::TimedOut => self.fallback.timed_out(record),
        }
    }

    /// Tracker id if one is configured and answers in time, else a ULID
    async fn assign_execution_id(&self, agent_name: &str, timeout: Duration) -> String {
        if let Some(tracker) = &self.tracker {
            let registered = bounded_tracker_call(
                self.config.execution.tracker_timeout(),
                "create_execution",
                agent_name,
                tracker.create_execution(agent_name, &self.context, timeout.as_secs()),
            )
            .await;
            if let Some(execution_id) = registered {
                return execution_id;
            }
        }
        Ulid::new().to_string()
    }

    async fn track_state(&self, execution_id: &str, state: ExecutionState, error: Option<&str>) {
        if let Some(tracker) = &self.tracker {
            bounded_tracker_call(
                self.config.execution.tracker_timeout(),
                "update_state",
                execution_id,
                tracker.update_state(execution_id, state, error),
            )
            .await;
        }
    }

    /// Fire-and-forget; a slow tracker never delays the deadline race
    fn heartbeat(&self, execution_id: &str) {
        let Some(tracker) = self.tracker.clone() else {
            return;
        };
        let bound = self.config.execution.tracker_timeout();
        let execution_id = execution_id.to_string();
        tokio::spawn(async move {
            bounded_tracker_call(bound, "heartbeat", &execution_id, tracker.heartbeat(&execution_id))
                .await;
        });
    }

    /// Cancel everything in flight and tear the engine down.
    ///
    /// Idempotent. In-flight executions are marked CANCELLED and announced
    /// with a `completed` notification; running agent tasks are not
    /// interrupted, their results are simply discarded. Afterwards every
    /// mutating call fails with [`EngineError::InactiveEngine`].
    pub async fn cleanup(&self) {
        if !self.is_active.swap(false, Ordering::SeqCst) {
            debug!("Engine for user {} already cleaned up", self.context.user_id());
            return;
        }

        info!(
            user_id = %self.context.user_id(),
            "Cleaning up execution engine with {} executions in flight",
            self.active.len()
        );
        self.admission.close();

        let in_flight: Vec<ActiveExecution> =
            self.active.iter().map(|entry| entry.value().clone()).collect();

        let mut notices = Vec::with_capacity(in_flight.len());
        for execution in in_flight {
            let payload = {
                let mut record = execution.record.lock();
                if record.state.is_terminal() {
                    continue;
                }
                if let Err(e) = record.finish(
                    ExecutionState::Cancelled,
                    Some("Engine cleaned up".to_string()),
                    None,
                ) {
                    warn!(execution_id = %record.execution_id, "Failed to cancel record: {}", e);
                    continue;
                }
                cancelled_notice(&record)
            };

            notices.push(async move {
                let execution_id = payload.execution_id.clone();
                execution.events.completed(payload).await;
                self.track_state(&execution_id, ExecutionState::Cancelled, None)
                    .await;
            });
        }
        join_all(notices).await;

        self.dispatcher.shutdown().await;
        self.active.clear();
        self.ledger.close();

        info!(user_id = %self.context.user_id(), "Execution engine inactive");
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::InactiveEngine)
        }
    }

    /// Session check shared with pipelines
    pub(crate) fn check_isolation(&self, request: &ExecutionRequest) -> Result<()> {
        if request.user_id != self.context.user_id() {
            warn!(
                engine_user = %self.context.user_id(),
                request_user = %request.user_id,
                "Rejected cross-user execution request"
            );
            return Err(EngineError::IsolationViolation {
                engine_user: self.context.user_id().to_string(),
                request_user: request.user_id.clone(),
            });
        }
        Ok(())
    }

    fn validate_request(&self, request: &ExecutionRequest) -> Result<()> {
        self.check_isolation(request)?;

        if request.agent_name.trim().is_empty() {
            return Err(EngineError::InvalidArgument(
                "Agent name must not be empty".into(),
            ));
        }
        if request.timeout.is_some_and(|t| t.is_zero()) {
            return Err(EngineError::InvalidArgument(
                "Timeout must be greater than zero".into(),
            ));
        }
        if request.run_id != self.context.run_id() {
            warn!(
                engine_run = %self.context.run_id(),
                request_run = %request.run_id,
                "Run id mismatch for user {}, continuing",
                self.context.user_id()
            );
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> &UserSessionContext {
        &self.context
    }

    /// Admission capacity
    pub fn capacity(&self) -> usize {
        self.admission.capacity()
    }

    /// Default deadline applied to requests without their own
    pub fn default_timeout(&self) -> Duration {
        self.limits.timeout
    }

    /// Executions registered and not yet finished (queued or running)
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Snapshot of in-flight records
    pub fn active_executions(&self) -> Vec<ExecutionRecord> {
        self.active
            .iter()
            .map(|entry| entry.value().record.lock().clone())
            .collect()
    }

    /// Finished executions, oldest first
    pub fn history(&self) -> Vec<ExecutionSummary> {
        self.ledger.history()
    }

    /// Read-only statistics with derived means and peaks
    pub fn stats(&self) -> StatsSnapshot {
        self.ledger.snapshot(self.active.len())
    }
}

/// Removes the active entry if `execute` exits early (error or dropped
/// future) and records the execution as cancelled.
struct ActiveSlot<'a> {
    engine: &'a ExecutionEngine,
    execution_id: String,
    record: Arc<Mutex<ExecutionRecord>>,
    events: ExecutionEvents,
    armed: bool,
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.engine.active.remove(&self.execution_id);

        let notice = {
            let mut record = self.record.lock();
            if record.state.is_terminal() {
                return;
            }
            if record
                .finish(
                    ExecutionState::Cancelled,
                    Some("Caller abandoned the execution".to_string()),
                    None,
                )
                .is_err()
            {
                return;
            }
            self.engine.ledger.record(&record);
            cancelled_notice(&record)
        };

        debug!(execution_id = %self.execution_id, "Execution abandoned by caller");
        // A cleaned-up engine has shut its notifier down
        if !self.engine.is_active() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let events = self.events.clone();
            handle.spawn(async move {
                events.completed(notice).await;
            });
        }
    }
}

/// Aborts the dispatch task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn bounded_tracker_call<T>(
    bound: Duration,
    call: &'static str,
    target: &str,
    pending: impl Future<Output = T>,
) -> Option<T> {
    match tokio::time::timeout(bound, pending).await {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Tracker {} for {} timed out after {:?}", call, target, bound);
            None
        }
    }
}

fn cancelled_notice(record: &ExecutionRecord) -> AgentCompleted {
    AgentCompleted {
        execution_id: record.execution_id.clone(),
        success: false,
        state: ExecutionState::Cancelled,
        duration_ms: record.execution_time().as_millis() as u64,
        error: record.error.clone(),
        result: None,
        timestamp: Utc::now(),
    }
}

fn outcome_error(outcome: &AgentOutcome) -> String {
    outcome
        .error
        .clone()
        .unwrap_or_else(|| "Agent reported failure without details".to_string())
}

fn join_failure(err: JoinError) -> AgentError {
    if err.is_panic() {
        let panic = err.into_panic();
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        AgentError::Panicked(message)
    } else {
        AgentError::Failed("Agent task was cancelled".to_string())
    }
}

fn log_outcome(result: &ExecutionResult) {
    match result.state {
        ExecutionState::Completed => info!(
            execution_id = %result.execution_id,
            "Agent '{}' completed in {}ms",
            result.agent_name,
            result.duration_ms
        ),
        ExecutionState::Timeout => warn!(
            execution_id = %result.execution_id,
            "Agent '{}' timed out after {}ms",
            result.agent_name,
            result.duration_ms
        ),
        _ => warn!(
            execution_id = %result.execution_id,
            "Agent '{}' failed: {}",
            result.agent_name,
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::dispatcher::ProgressReporter;
    use crate::events::notifier::NoopNotifier;
    use crate::runtime::agent::AgentHandle;
    use crate::session::ResourceLimits;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Echo;

    #[async_trait]
    impl AgentHandle for Echo {
        async fn run(
            &self,
            input: Value,
            _context: &UserSessionContext,
            _progress: &ProgressReporter,
        ) -> std::result::Result<AgentOutcome, AgentError> {
            Ok(AgentOutcome::succeeded(input))
        }
    }

    struct EchoFactory;

    #[async_trait]
    impl AgentFactory for EchoFactory {
        async fn create_instance(
            &self,
            agent_name: &str,
            _context: &UserSessionContext,
        ) -> std::result::Result<Box<dyn AgentHandle>, AgentError> {
            match agent_name {
                "echo" => Ok(Box::new(Echo)),
                other => Err(AgentError::NotFound(other.to_string())),
            }
        }
    }

    fn context() -> UserSessionContext {
        UserSessionContext::new("user-1", "thread-1", "run-1")
    }

    fn engine() -> ExecutionEngine {
        ExecutionEngine::builder(context())
            .agent_factory(Arc::new(EchoFactory))
            .event_notifier(Arc::new(NoopNotifier))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let missing_factory = ExecutionEngine::builder(context())
            .event_notifier(Arc::new(NoopNotifier))
            .build();
        assert!(matches!(missing_factory, Err(EngineError::Configuration(_))));

        let missing_notifier = ExecutionEngine::builder(context())
            .agent_factory(Arc::new(EchoFactory))
            .build();
        assert!(matches!(missing_notifier, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_builder_rejects_reserved_run() {
        let result = ExecutionEngine::builder(UserSessionContext::new("user-1", "t", "registry"))
            .agent_factory(Arc::new(EchoFactory))
            .event_notifier(Arc::new(NoopNotifier))
            .build();
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_session_limits_applied() {
        let engine = ExecutionEngine::builder(context().with_limits(ResourceLimits::strict()))
            .agent_factory(Arc::new(EchoFactory))
            .event_notifier(Arc::new(NoopNotifier))
            .build()
            .unwrap();
        assert_eq!(engine.capacity(), 1);
        assert_eq!(engine.default_timeout(), Duration::from_secs(10));
        assert!(engine.is_active());
    }

    #[tokio::test]
    async fn test_execute_round_trip() {
        let engine = engine();
        let request = ExecutionRequest::new("echo", &context(), json!({"q": 1}));
        let result = engine.execute(request).await.unwrap();

        assert!(result.success);
        assert_eq!(result.state, ExecutionState::Completed);
        assert_eq!(result.data, Some(json!({"q": 1})));
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.stats().completed_executions, 1);
    }

    #[tokio::test]
    async fn test_rejects_empty_agent_and_zero_timeout() {
        let engine = engine();
        let empty = ExecutionRequest::new("  ", &context(), Value::Null);
        assert!(matches!(
            engine.execute(empty).await,
            Err(EngineError::InvalidArgument(_))
        ));

        let zero = ExecutionRequest::new("echo", &context(), Value::Null).with_timeout(Duration::ZERO);
        assert!(matches!(
            engine.execute(zero).await,
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let engine = engine();
        engine.cleanup().await;
        engine.cleanup().await;

        assert!(!engine.is_active());
        let request = ExecutionRequest::new("echo", &context(), Value::Null);
        assert!(matches!(
            engine.execute(request).await,
            Err(EngineError::InactiveEngine)
        ));
    }

    #[tokio::test]
    async fn test_panic_payload_extracted() {
        let handle = tokio::spawn(async { panic!("boom") });
        let err = join_failure(handle.await.unwrap_err());
        assert!(matches!(err, AgentError::Panicked(ref msg) if msg == "boom"));
    }
}
