// packages/engine/src/session/mod.rs
//! Session identity and per-session limits

pub mod context;
pub mod resource_limits;

pub use context::UserSessionContext;
pub use resource_limits::{EffectiveLimits, ResourceLimits};
