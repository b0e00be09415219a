// packages/engine/src/runtime/mod.rs
//! Agent execution runtime
//!
//! This module provides the per-session execution core:
//!
//! - **Engine**: `ExecutionEngine`, the aggregate root for one user session
//! - **Admission**: bounded concurrency with FIFO waiting
//! - **Record**: the execution state machine
//! - **Fallback**: failed results for timeouts, errors and cancellation
//! - **Pipeline**: sequential multi-agent runs
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── ExecutionEngine (user A) ───────────────────────┐
//! │                                                                         │
//! │  execute() ──► Admission (N slots) ──► AgentFactory ──► AgentHandle     │
//! │                    │ FIFO wait              │               │           │
//! │                    ▼                        ▼               ▼           │
//! │               active map            deadline race     ProgressReporter  │
//! │                    │                        │               │           │
//! │                    └────────► Ledger ◄──────┘       EventNotifier       │
//! │                         (history + stats)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//!         (user B gets a separate engine; nothing above is shared)
//! ```

pub mod admission;
pub mod agent;
pub mod engine;
pub mod fallback;
pub mod pipeline;
pub mod record;
pub mod types;

// Re-export commonly used types
pub use admission::{AdmissionController, AdmissionPermit};
pub use agent::{AgentFactory, AgentHandle, AgentOutcome};
pub use engine::{EngineBuilder, ExecutionEngine};
pub use fallback::FallbackSynthesizer;
pub use pipeline::PIPELINE_STEP_KEY;
pub use record::{ExecutionRecord, ExecutionState, ExecutionSummary};
pub use types::{ExecutionRequest, ExecutionResult, PipelineStep, CONTINUE_ON_ERROR_KEY, FALLBACK_RESULT_KEY};
