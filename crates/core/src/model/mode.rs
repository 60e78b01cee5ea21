use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a session reports grading results.
///
/// `Study` reveals the correct option text after every answer; `Test` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Test,
    Study,
}

impl QuizMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Test => "test",
            QuizMode::Study => "study",
        }
    }

    #[must_use]
    pub fn reveals_answer(self) -> bool {
        matches!(self, QuizMode::Study)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("mode must be 'test' or 'study', got {raw:?}")]
pub struct ParseModeError {
    pub raw: String,
}

impl FromStr for QuizMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(QuizMode::Test),
            "study" => Ok(QuizMode::Study),
            other => Err(ParseModeError {
                raw: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_only() {
        assert_eq!("test".parse::<QuizMode>().unwrap(), QuizMode::Test);
        assert_eq!("study".parse::<QuizMode>().unwrap(), QuizMode::Study);
        assert!("Study".parse::<QuizMode>().is_err());
        assert!("exam".parse::<QuizMode>().is_err());
    }

    #[test]
    fn only_study_reveals() {
        assert!(QuizMode::Study.reveals_answer());
        assert!(!QuizMode::Test.reveals_answer());
        assert_eq!(QuizMode::default(), QuizMode::Test);
    }
}
