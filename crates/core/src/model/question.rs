use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question must have at least one option")]
    NoOptions,

    #[error("option keys cannot be empty")]
    EmptyOptionKey,

    #[error("answer key {answer:?} is not one of the options")]
    UnknownAnswerKey { answer: String },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Raw persisted shape of a question, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub answer: String,
}

/// A single multiple-choice question.
///
/// `options` maps short keys ("A", "B", ...) to option text; `answer` is always
/// one of those keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    options: BTreeMap<String, String>,
    answer: String,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if there are no options, an option key is empty,
    /// or `answer` is not an option key.
    pub fn new(
        text: impl Into<String>,
        options: BTreeMap<String, String>,
        answer: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let answer = answer.into();
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if options.keys().any(String::is_empty) {
            return Err(QuestionError::EmptyOptionKey);
        }
        if !options.contains_key(&answer) {
            return Err(QuestionError::UnknownAnswerKey { answer });
        }

        Ok(Self {
            text: text.into(),
            options,
            answer,
        })
    }

    /// Convenience constructor from `(key, text)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`Question::new`].
    pub fn from_pairs<K, V>(
        text: impl Into<String>,
        options: impl IntoIterator<Item = (K, V)>,
        answer: impl Into<String>,
    ) -> Result<Self, QuestionError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(text, options, answer)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn answer_key(&self) -> &str {
        &self.answer
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_text(&self) -> &str {
        // Construction guarantees the key exists.
        self.options
            .get(&self.answer)
            .map_or("", String::as_str)
    }

    /// Option texts without their keys, in key order.
    #[must_use]
    pub fn option_texts(&self) -> Vec<String> {
        self.options.values().cloned().collect()
    }

    /// Exact, case-sensitive comparison against the correct option text.
    #[must_use]
    pub fn is_correct(&self, answer_text: &str) -> bool {
        answer_text == self.correct_text()
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Self::new(record.question, record.options, record.answer)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
