// packages/engine/src/recording/stats.rs
//! Aggregate execution counters
//!
//! Writes only bump counters and append timing samples; means and peaks are
//! derived when a snapshot is taken.

use crate::runtime::record::ExecutionState;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Mutable counters owned by one engine
#[derive(Debug, Clone)]
pub struct ExecutionStats {
    total_executions: u64,
    completed_executions: u64,
    failed_executions: u64,
    timeout_executions: u64,
    cancelled_executions: u64,
    concurrent_executions: usize,
    peak_concurrent: usize,
    queue_wait_times: VecDeque<Duration>,
    execution_times: VecDeque<Duration>,
    sample_window: usize,
}

impl ExecutionStats {
    /// Keep at most `sample_window` timing samples per series
    pub fn new(sample_window: usize) -> Self {
        Self {
            total_executions: 0,
            completed_executions: 0,
            failed_executions: 0,
            timeout_executions: 0,
            cancelled_executions: 0,
            concurrent_executions: 0,
            peak_concurrent: 0,
            queue_wait_times: VecDeque::new(),
            execution_times: VecDeque::new(),
            sample_window: sample_window.max(1),
        }
    }

    /// An execution entered the engine; returns the new concurrency
    pub fn enter(&mut self) -> usize {
        self.concurrent_executions += 1;
        self.peak_concurrent = self.peak_concurrent.max(self.concurrent_executions);
        self.concurrent_executions
    }

    /// An execution left the engine; returns the new concurrency
    pub fn exit(&mut self) -> usize {
        self.concurrent_executions = self.concurrent_executions.saturating_sub(1);
        self.concurrent_executions
    }

    /// Count a terminal outcome.
    ///
    /// Timeouts count as failures too. Executions cancelled before admission
    /// contribute no execution time sample.
    pub fn record(&mut self, state: ExecutionState, queue_wait: Duration, execution_time: Duration) {
        self.total_executions += 1;
        match state {
            ExecutionState::Completed => self.completed_executions += 1,
            ExecutionState::Failed => self.failed_executions += 1,
            ExecutionState::Timeout => {
                self.timeout_executions += 1;
                self.failed_executions += 1;
            }
            ExecutionState::Cancelled => self.cancelled_executions += 1,
            ExecutionState::Created | ExecutionState::Running => {}
        }

        push_sample(&mut self.queue_wait_times, queue_wait, self.sample_window);
        if state != ExecutionState::Cancelled || !execution_time.is_zero() {
            push_sample(&mut self.execution_times, execution_time, self.sample_window);
        }
    }

    pub fn concurrent_executions(&self) -> usize {
        self.concurrent_executions
    }

    pub fn total_executions(&self) -> u64 {
        self.total_executions
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let (avg_queue_wait_ms, max_queue_wait_ms) = mean_and_peak(&self.queue_wait_times);
        let (avg_execution_ms, max_execution_ms) = mean_and_peak(&self.execution_times);

        StatsSnapshot {
            total_executions: self.total_executions,
            completed_executions: self.completed_executions,
            failed_executions: self.failed_executions,
            timeout_executions: self.timeout_executions,
            cancelled_executions: self.cancelled_executions,
            concurrent_executions: self.concurrent_executions,
            peak_concurrent: self.peak_concurrent,
            success_rate: if self.total_executions == 0 {
                0.0
            } else {
                self.completed_executions as f64 / self.total_executions as f64
            },
            avg_queue_wait_ms,
            max_queue_wait_ms,
            avg_execution_ms,
            max_execution_ms,
            active_executions: 0,
            history_len: 0,
        }
    }
}

/// Read-only copy of engine statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_executions: u64,
    pub completed_executions: u64,
    pub failed_executions: u64,
    pub timeout_executions: u64,
    pub cancelled_executions: u64,
    pub concurrent_executions: usize,
    pub peak_concurrent: usize,
    pub success_rate: f64,
    pub avg_queue_wait_ms: f64,
    pub max_queue_wait_ms: u64,
    pub avg_execution_ms: f64,
    pub max_execution_ms: u64,
    pub active_executions: usize,
    pub history_len: usize,
}

fn push_sample(samples: &mut VecDeque<Duration>, sample: Duration, window: usize) {
    if samples.len() == window {
        samples.pop_front();
    }
    samples.push_back(sample);
}

fn mean_and_peak(samples: &VecDeque<Duration>) -> (f64, u64) {
    if samples.is_empty() {
        return (0.0, 0);
    }
    let total: Duration = samples.iter().sum();
    let peak = samples.iter().max().copied().unwrap_or_default();
    (
        total.as_secs_f64() * 1000.0 / samples.len() as f64,
        peak.as_millis() as u64,
    )
}
