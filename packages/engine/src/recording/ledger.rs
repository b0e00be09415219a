// packages/engine/src/recording/ledger.rs
//! History and stats ledger
//!
//! The only way to mutate an engine's history and counters. Everything sits
//! behind one short-lived lock that is never held across an `.await`.
//! Writes also feed the `metrics` facade; without an installed recorder those
//! calls are no-ops.

use crate::recording::history::HistoryBuffer;
use crate::recording::stats::{ExecutionStats, StatsSnapshot};
use crate::runtime::record::{ExecutionRecord, ExecutionSummary};
use metrics::{counter, gauge, histogram};
use parking_lot::Mutex;
use tracing::trace;

struct LedgerInner {
    history: HistoryBuffer<ExecutionSummary>,
    stats: ExecutionStats,
    closed: bool,
}

/// Per-engine history ring buffer plus aggregate counters
pub struct ExecutionLedger {
    inner: Mutex<LedgerInner>,
}

impl ExecutionLedger {
    pub fn new(history_capacity: usize, sample_window: usize) -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                history: HistoryBuffer::new(history_capacity),
                stats: ExecutionStats::new(sample_window),
                closed: false,
            }),
        }
    }

    /// Count an execution as in flight until the guard drops.
    ///
    /// A closed ledger hands out an inert guard that never counted.
    pub fn enter(&self) -> ConcurrencyGuard<'_> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return ConcurrencyGuard {
                ledger: self,
                counted: false,
            };
        }
        let concurrent = inner.stats.enter();
        drop(inner);
        gauge!("agent_engine_concurrent_executions").set(concurrent as f64);
        ConcurrencyGuard {
            ledger: self,
            counted: true,
        }
    }

    fn exit(&self) {
        let mut inner = self.inner.lock();
        // close() already reset the counter this guard contributed to
        if inner.closed {
            return;
        }
        let concurrent = inner.stats.exit();
        drop(inner);
        gauge!("agent_engine_concurrent_executions").set(concurrent as f64);
    }

    /// Append a terminal record's summary and update counters.
    ///
    /// Returns `false` once the ledger is closed.
    pub fn record(&self, record: &ExecutionRecord) -> bool {
        let summary = record.summary();
        let queue_wait = record.queue_wait();
        let execution_time = record.execution_time();

        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return false;
            }
            inner.stats.record(record.state, queue_wait, execution_time);
            if let Some(evicted) = inner.history.push(summary) {
                trace!("Evicted execution {} from history", evicted.execution_id);
            }
        }

        counter!("agent_engine_executions_total", "state" => record.state.as_str()).increment(1);
        histogram!("agent_engine_queue_wait_seconds").record(queue_wait.as_secs_f64());
        histogram!("agent_engine_execution_seconds").record(execution_time.as_secs_f64());
        true
    }

    /// History, oldest first
    pub fn history(&self) -> Vec<ExecutionSummary> {
        self.inner.lock().history.to_vec()
    }

    pub fn concurrent_executions(&self) -> usize {
        self.inner.lock().stats.concurrent_executions()
    }

    /// Derived statistics; `active` is the caller's in-flight count
    pub fn snapshot(&self, active: usize) -> StatsSnapshot {
        let inner = self.inner.lock();
        let mut snapshot = inner.stats.snapshot();
        snapshot.active_executions = active;
        snapshot.history_len = inner.history.len();
        snapshot
    }

    /// Drop all history and counters and refuse further writes
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.history.clear();
        inner.stats = ExecutionStats::new(1);
    }
}

/// Decrements the concurrency counter exactly once, on drop
pub struct ConcurrencyGuard<'a> {
    ledger: &'a ExecutionLedger,
    counted: bool,
}

impl Drop for ConcurrencyGuard<'_> {
    fn drop(&mut self) {
        if self.counted {
            self.ledger.exit();
        }
    }
}
