#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod error;
pub mod quiz_service;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::{AppServices, ServiceOptions};
pub use error::SessionError;
pub use quiz_service::{ApiError, ApiErrorKind, ErrorBody, QuizService};
pub use sessions::{EngineConfig, SessionEngine};
