//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SessionStateError;
use storage::StorageError;

/// Errors emitted by the session engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid bank name: {name}")]
    InvalidBank { name: String },
    #[error("session not found")]
    SessionNotFound,
    #[error("session has no current question")]
    NoCurrentQuestion,
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BankNotFound { name } => Self::InvalidBank { name },
            StorageError::SessionNotFound => Self::SessionNotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<SessionStateError> for SessionError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::NoCurrentQuestion => Self::NoCurrentQuestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_session_state_maps_to_no_current_question() {
        let err = SessionError::from(SessionStateError::NoCurrentQuestion);
        assert!(matches!(err, SessionError::NoCurrentQuestion));
    }

    #[test]
    fn storage_lookups_map_to_domain_errors() {
        let bank = SessionError::from(StorageError::BankNotFound { name: "geo".into() });
        assert!(matches!(bank, SessionError::InvalidBank { ref name } if name == "geo"));

        let missing = SessionError::from(StorageError::SessionNotFound);
        assert!(matches!(missing, SessionError::SessionNotFound));

        let poisoned = SessionError::from(StorageError::Poisoned("sessions".into()));
        assert!(matches!(poisoned, SessionError::Storage(StorageError::Poisoned(_))));
    }
}
