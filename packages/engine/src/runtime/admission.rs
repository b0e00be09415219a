// packages/engine/src/runtime/admission.rs
//! Per-engine admission control
//!
//! A counting gate of fixed capacity. Callers past capacity wait (backpressure)
//! until a slot frees up; slots are released when the permit is dropped, so
//! every acquired slot is returned exactly once on every exit path.
//!
//! ```text
//! AdmissionController (capacity C)
//! ├─ Running: [exec-1, exec-2, ...]  (≤ C permits out)
//! └─ Waiters: [exec-4, exec-5, ...]  (FIFO, tokio Semaphore fairness)
//! ```

use crate::utils::errors::{EngineError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

/// Counting gate bounding simultaneous executions
#[derive(Debug)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A granted admission slot; dropping it releases the slot
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    waited: Duration,
}

impl AdmissionPermit {
    /// Time spent waiting for this slot
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

impl AdmissionController {
    /// Create a gate with `capacity` slots
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::Configuration(
                "Admission capacity must be at least 1".into(),
            ));
        }

        debug!("Admission controller initialized with {} slots", capacity);

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Wait for a free slot.
    ///
    /// Fails with [`EngineError::InactiveEngine`] once the gate is closed,
    /// including for callers already waiting.
    pub async fn acquire(&self) -> Result<AdmissionPermit> {
        let start = Instant::now();

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::InactiveEngine)?;

        let waited = start.elapsed();
        trace!("Admission slot granted after {:?}", waited);

        Ok(AdmissionPermit {
            _permit: permit,
            waited,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Reject all current and future waiters
    pub fn close(&self) {
        self.semaphore.close();
    }
}
