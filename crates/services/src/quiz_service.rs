use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use quiz_core::model::{QuizMode, SessionId};

use crate::api::{
    AnswerRequest, AnswerResponse, BanksResponse, EndResponse, QuestionResponse, StartRequest,
    StartResponse,
};
use crate::error::SessionError;
use crate::sessions::SessionEngine;

/// Client-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    BadRequest,
    InvalidMode,
    InvalidBank,
    SessionNotFound,
    NoCurrentQuestion,
    Internal,
}

impl ApiErrorKind {
    /// HTTP-style status code for this kind.
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            ApiErrorKind::BadRequest | ApiErrorKind::InvalidMode => 400,
            ApiErrorKind::InvalidBank | ApiErrorKind::SessionNotFound => 404,
            ApiErrorKind::NoCurrentQuestion => 409,
            ApiErrorKind::Internal => 500,
        }
    }
}

/// A failure translated for clients: a kind plus a message free of internals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A request the boundary could not decode.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::BadRequest, message)
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    fn session_not_found() -> Self {
        Self::new(ApiErrorKind::SessionNotFound, "Session not found")
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidBank { name } => {
                Self::new(ApiErrorKind::InvalidBank, format!("Bank '{name}' not found"))
            }
            SessionError::SessionNotFound => Self::session_not_found(),
            SessionError::NoCurrentQuestion => Self::new(
                ApiErrorKind::NoCurrentQuestion,
                "Quiz already finished; no question to answer",
            ),
            other => {
                tracing::error!(error = %other, "internal quiz error");
                Self::new(ApiErrorKind::Internal, "Internal error")
            }
        }
    }
}

/// Serialized error payload: `{"error": "...", "kind": "session_not_found", "status": 404}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ApiErrorKind,
    pub status: u16,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.message.clone(),
            kind: err.kind,
            status: err.status(),
        }
    }
}

/// Request boundary over the session engine.
///
/// Validates inputs the engine does not model (mode strings, raw session ids),
/// shapes responses, and maps engine errors to [`ApiError`].
#[derive(Clone)]
pub struct QuizService {
    engine: Arc<SessionEngine>,
}

impl QuizService {
    #[must_use]
    pub fn new(engine: Arc<SessionEngine>) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn list_banks(&self) -> BanksResponse {
        BanksResponse {
            banks: self.engine.banks().list_bank_names(),
        }
    }

    /// Validate the request and start a session.
    ///
    /// Idle sessions are swept first when a TTL is configured.
    ///
    /// # Errors
    ///
    /// `InvalidMode` for a mode other than "test"/"study", `InvalidBank` for an
    /// unknown bank. Mode is checked first.
    pub fn start(&self, request: StartRequest) -> Result<StartResponse, ApiError> {
        let mode: QuizMode = request.mode.parse().map_err(|_| {
            ApiError::new(ApiErrorKind::InvalidMode, "Mode must be 'test' or 'study'")
        })?;
        if !self.engine.banks().contains(&request.bank) {
            return Err(SessionError::InvalidBank { name: request.bank }.into());
        }

        self.engine.evict_idle()?;
        let session_id = self.engine.start_session(
            &request.bank,
            request.count,
            request.start,
            request.end,
            mode,
        )?;
        Ok(StartResponse { session_id })
    }

    /// Current question, or the finished marker.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for malformed or unknown ids.
    pub fn question(&self, session_id: &str) -> Result<QuestionResponse, ApiError> {
        let id = parse_session_id(session_id)?;
        Ok(self
            .engine
            .get_question(id)?
            .map_or_else(QuestionResponse::finished, QuestionResponse::Question))
    }

    /// Grade an answer; study sessions also receive the correct text.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for malformed or unknown ids, `NoCurrentQuestion` once
    /// every question has been answered.
    pub fn answer(
        &self,
        session_id: &str,
        request: AnswerRequest,
    ) -> Result<AnswerResponse, ApiError> {
        let id = parse_session_id(session_id)?;
        Ok(self.engine.submit_answer(id, &request.answer)?)
    }

    /// End the session and report the final score.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for malformed, unknown, or already-ended ids.
    pub fn end(&self, session_id: &str) -> Result<EndResponse, ApiError> {
        let id = parse_session_id(session_id)?;
        Ok(self.engine.end_session(id)?.into())
    }
}

impl fmt::Debug for QuizService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizService")
            .field("engine", &self.engine)
            .finish()
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse().map_err(|_| ApiError::session_not_found())
}
