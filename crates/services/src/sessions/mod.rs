mod engine;
mod plan;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use engine::{EngineConfig, SessionEngine};
pub use plan::{SessionBuilder, SessionPlan};
