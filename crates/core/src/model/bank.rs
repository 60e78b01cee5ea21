use std::ops::Range;

use thiserror::Error;

use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("bank name cannot be empty")]
    EmptyName,
}

/// A named, ordered, immutable sequence of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    name: String,
    questions: Vec<Question>,
}

impl Bank {
    /// Creates a bank. An empty question list is allowed.
    ///
    /// # Errors
    ///
    /// Returns `BankError::EmptyName` if `name` is blank.
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Result<Self, BankError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BankError::EmptyName);
        }
        Ok(Self { name, questions })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Candidate pool for a session: the questions in `[start, end)` after clamping.
    ///
    /// See [`clamp_range`] for the clamping rules.
    #[must_use]
    pub fn pool(&self, start: i64, end: Option<i64>) -> &[Question] {
        &self.questions[clamp_range(self.questions.len(), start, end)]
    }
}

/// Clamp a requested `[start, end)` window to a sequence of length `len`.
///
/// - `start` is raised to 0 and capped at `len`.
/// - `end` defaults to `len`, is capped at `len`, and negative values count as 0.
/// - When `start >= end` the range is empty (anchored at `start`).
#[must_use]
pub fn clamp_range(len: usize, start: i64, end: Option<i64>) -> Range<usize> {
    let to_index = |value: i64| usize::try_from(value.max(0)).unwrap_or(usize::MAX).min(len);
    let start = to_index(start);
    let end = end.map_or(len, to_index);
    if start >= end {
        start..start
    } else {
        start..end
    }
}
