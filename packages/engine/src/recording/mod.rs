// packages/engine/src/recording/mod.rs
//! Execution history and statistics
//!
//! - **History**: fixed-capacity ring buffer of finished executions
//! - **Stats**: counters and bounded timing samples, derived on read
//! - **Ledger**: the single mutation path for both, plus `metrics` output
//!
//! # Architecture
//!
//! ```text
//! execute() ── enter() ──► concurrency +1
//!     │
//!     └─ terminal ── record() ──► stats counters
//!                        │           └─ timing samples (bounded window)
//!                        └──────► history ring (oldest evicted)
//! cleanup() ── close() ──► everything cleared, further writes ignored
//! ```

pub mod history;
pub mod ledger;
pub mod stats;

pub use history::HistoryBuffer;
pub use ledger::{ConcurrencyGuard, ExecutionLedger};
pub use stats::{ExecutionStats, StatsSnapshot};
