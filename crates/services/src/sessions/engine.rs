use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::model::{
    FinalResult, GradeResult, QuestionView, QuizMode, Session, SessionId,
};
use storage::{BankStore, SessionHandle, SessionStore, StorageError};

use super::plan::SessionBuilder;
use super::view::question_view;
use crate::Clock;
use crate::error::SessionError;

/// Tuning knobs for the session engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Sessions idle for longer than this are dropped by [`SessionEngine::evict_idle`].
    /// `None` keeps sessions until they are ended.
    pub idle_ttl: Option<Duration>,
}

/// Owns the session lifecycle: creation, question retrieval, grading, and teardown.
///
/// Banks are read-only. Sessions live in the injected [`SessionStore`], which
/// serializes work per session; calls on different sessions do not block each
/// other beyond the shared random source.
pub struct SessionEngine {
    banks: Arc<BankStore>,
    sessions: Arc<dyn SessionStore>,
    rng: Mutex<StdRng>,
    clock: Clock,
    config: EngineConfig,
}

impl SessionEngine {
    /// Create an engine seeded from the operating system.
    #[must_use]
    pub fn new(banks: Arc<BankStore>, sessions: Arc<dyn SessionStore>, clock: Clock) -> Self {
        Self {
            banks,
            sessions,
            rng: Mutex::new(StdRng::from_os_rng()),
            clock,
            config: EngineConfig::default(),
        }
    }

    /// Replace the random source with a deterministic one.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn banks(&self) -> &BankStore {
        &self.banks
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Start a session over `bank[start..end]` with up to `count` questions.
    ///
    /// Out-of-range windows and oversized counts are clamped rather than rejected;
    /// a non-positive count yields a session that is finished from the start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidBank` if the bank is not loaded.
    pub fn start_session(
        &self,
        bank: &str,
        count: i64,
        start: i64,
        end: Option<i64>,
        mode: QuizMode,
    ) -> Result<SessionId, SessionError> {
        let source = self.banks.get_bank(bank)?;
        let plan = SessionBuilder::new(source, count)
            .with_window(start, end)
            .build(&mut *self.rng());

        let total = plan.total();
        let pool_size = plan.pool_size;
        let clamped = plan.was_clamped();
        let started_at = self.clock.now();
        let bank_name = source.name().to_string();
        let questions = plan.questions;

        let id = self.sessions.insert_vacant(
            &mut || SessionId::from_random_bytes(self.rng().random()),
            Box::new(move |id| Session::new(id, bank_name, questions, mode, started_at)),
        )?;

        tracing::info!(
            session_id = %id,
            bank,
            requested = count,
            pool_size,
            total,
            clamped,
            mode = %mode,
            "quiz session started"
        );
        Ok(id)
    }

    /// Current question with freshly shuffled option texts, or `None` once finished.
    ///
    /// Only the activity timestamp is refreshed; cursor and score are untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for unknown ids.
    pub fn get_question(&self, id: SessionId) -> Result<Option<QuestionView>, SessionError> {
        let handle = self.sessions.get(id)?;
        let mut session = lock_session(&handle)?;
        session.touch(self.clock.now());

        let Some(question) = session.current_question() else {
            return Ok(None);
        };
        Ok(Some(question_view(
            question,
            session.index(),
            session.total(),
            &mut *self.rng(),
        )))
    }

    /// Grade `answer_text` against the current question and advance the cursor.
    ///
    /// Matching is exact on the correct option's text. Study-mode sessions get
    /// the correct text back in [`GradeResult::correct_answer`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for unknown ids and
    /// `SessionError::NoCurrentQuestion` when the session is already finished;
    /// neither changes any state.
    pub fn submit_answer(&self, id: SessionId, answer_text: &str) -> Result<GradeResult, SessionError> {
        let handle = self.sessions.get(id)?;
        let mut session = lock_session(&handle)?;
        let result = session.grade(answer_text, self.clock.now())?;

        tracing::debug!(
            session_id = %id,
            answered = session.index(),
            total = session.total(),
            correct = result.correct,
            "answer graded"
        );
        Ok(result)
    }

    /// Correct option text of the question graded most recently.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for unknown ids.
    pub fn last_answered_text(&self, id: SessionId) -> Result<Option<String>, SessionError> {
        let handle = self.sessions.get(id)?;
        let session = lock_session(&handle)?;
        Ok(session
            .last_answered()
            .map(|q| q.correct_text().to_string()))
    }

    /// Mode the session was started with.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for unknown ids.
    pub fn session_mode(&self, id: SessionId) -> Result<QuizMode, SessionError> {
        let handle = self.sessions.get(id)?;
        let session = lock_session(&handle)?;
        Ok(session.mode())
    }

    /// Remove the session and report its final score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for unknown or already-ended ids.
    pub fn end_session(&self, id: SessionId) -> Result<FinalResult, SessionError> {
        let handle = self.sessions.remove(id)?;
        let session = lock_session(&handle)?;
        let result = session.final_result();

        tracing::info!(
            session_id = %id,
            bank = session.bank(),
            elapsed_secs = (self.clock.now() - session.started_at()).num_seconds(),
            final_score = result.final_score,
            total = result.total,
            "quiz session ended"
        );
        Ok(result)
    }

    /// Drop sessions idle for longer than the configured TTL.
    ///
    /// Returns the number of sessions removed; always 0 without a TTL.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store is unusable.
    pub fn evict_idle(&self) -> Result<usize, SessionError> {
        let Some(ttl) = self.config.idle_ttl else {
            return Ok(0);
        };
        let now = self.clock.now();
        let removed = self
            .sessions
            .remove_where(&|session: &Session| session.is_idle(now, ttl))?;

        if !removed.is_empty() {
            tracing::info!(evicted = removed.len(), ttl_secs = ttl.num_seconds(), "evicted idle sessions");
        }
        Ok(removed.len())
    }

    /// Number of sessions currently held.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store is unusable.
    pub fn live_sessions(&self) -> Result<usize, SessionError> {
        Ok(self.sessions.len()?)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        // A panic mid-draw cannot leave the generator in an invalid state.
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_session(handle: &SessionHandle) -> Result<MutexGuard<'_, Session>, SessionError> {
    handle
        .lock()
        .map_err(|e| SessionError::Storage(StorageError::Poisoned(e.to_string())))
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("banks", &self.banks.len())
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
