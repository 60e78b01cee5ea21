use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuizMode, SessionId, question::Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStateError {
    #[error("session has no current question")]
    NoCurrentQuestion,
}

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// What a client sees for the current question: option texts only, no keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
    /// 1-based position within the session.
    pub index: usize,
    pub total: usize,
}

/// Outcome of grading one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    pub correct: bool,
    pub score: usize,
    pub finished: bool,
    /// Present only for study-mode sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// Score snapshot taken when a session is ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub final_score: usize,
    pub total: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A single user's pass over a fixed selection of questions.
///
/// The cursor only moves forward, by one per graded answer, and the score grows
/// by at most one per answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    bank: String,
    questions: Vec<Question>,
    index: usize,
    score: usize,
    mode: QuizMode,
    started_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(
        id: SessionId,
        bank: impl Into<String>,
        questions: Vec<Question>,
        mode: QuizMode,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bank: bank.into(),
            questions,
            index: 0,
            score: 0,
            mode,
            started_at,
            last_active_at: started_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn bank(&self) -> &str {
        &self.bank
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.index >= self.total()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    /// The question graded by the most recent submission, if any.
    #[must_use]
    pub fn last_answered(&self) -> Option<&Question> {
        self.index
            .checked_sub(1)
            .and_then(|i| self.questions.get(i))
    }

    /// Record activity without changing quiz state.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_active_at {
            self.last_active_at = at;
        }
    }

    /// True when the session has seen no activity for longer than `ttl`.
    #[must_use]
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_active_at > ttl
    }

    /// Grade `answer_text` against the current question and advance.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NoCurrentQuestion` when the session is
    /// finished. State is left untouched in that case.
    pub fn grade(
        &mut self,
        answer_text: &str,
        at: DateTime<Utc>,
    ) -> Result<GradeResult, SessionStateError> {
        let question = self
            .current_question()
            .ok_or(SessionStateError::NoCurrentQuestion)?;
        let correct = question.is_correct(answer_text);
        let correct_answer = self
            .mode
            .reveals_answer()
            .then(|| question.correct_text().to_string());

        if correct {
            self.score += 1;
        }
        self.index += 1;
        self.touch(at);

        Ok(GradeResult {
            correct,
            score: self.score,
            finished: self.is_finished(),
            correct_answer,
        })
    }

    #[must_use]
    pub fn final_result(&self) -> FinalResult {
        FinalResult {
            final_score: self.score,
            total: self.total(),
        }
    }
}
