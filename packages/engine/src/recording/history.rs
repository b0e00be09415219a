// packages/engine/src/recording/history.rs
//! Bounded FIFO history
//!
//! Fixed-capacity ring buffer: pushing past capacity evicts the oldest
//! entry. Memory stays bounded no matter how long a session lives.

use std::collections::VecDeque;

/// Ring buffer with oldest-first eviction
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    /// `capacity` must be non-zero; a zero capacity is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted one if the buffer was full
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> HistoryBuffer<T> {
    /// Copy of the contents, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}
