//! Request and response shapes of the quiz boundary.
//!
//! Field names match the JSON the boundary speaks; see `QuizService`.

use serde::{Deserialize, Serialize};

use quiz_core::model::{FinalResult, GradeResult, QuestionView, SessionId};

/// Message appended to every end-of-quiz response.
pub const END_MESSAGE: &str = "Quiz ended. You may restart or choose another bank.";

fn default_mode() -> String {
    "test".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanksResponse {
    pub banks: Vec<String>,
}

/// Parameters for starting a quiz. `mode` stays a raw string so the boundary can
/// reject unknown values itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub bank: String,
    pub count: i64,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: Option<i64>,
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl StartRequest {
    #[must_use]
    pub fn new(bank: impl Into<String>, count: i64) -> Self {
        Self {
            bank: bank.into(),
            count,
            start: 0,
            end: None,
            mode: default_mode(),
        }
    }

    #[must_use]
    pub fn with_window(mut self, start: i64, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: SessionId,
}

/// Either the current question or the finished marker `{"finished": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QuestionResponse {
    Question(QuestionView),
    Finished { finished: bool },
}

impl QuestionResponse {
    #[must_use]
    pub fn finished() -> Self {
        Self::Finished { finished: true }
    }

    #[must_use]
    pub fn into_view(self) -> Option<QuestionView> {
        match self {
            Self::Question(view) => Some(view),
            Self::Finished { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

/// Grading outcome; `correct_answer` is only present for study sessions.
pub type AnswerResponse = GradeResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndResponse {
    pub final_score: usize,
    pub total: usize,
    pub message: String,
}

impl From<FinalResult> for EndResponse {
    fn from(result: FinalResult) -> Self {
        Self {
            final_score: result.final_score,
            total: result.total,
            message: END_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_request_defaults() {
        let req: StartRequest = serde_json::from_value(json!({"bank": "geo", "count": 3})).unwrap();
        assert_eq!(req, StartRequest::new("geo", 3));
        assert_eq!(req.mode, "test");
        assert_eq!(req.start, 0);
        assert_eq!(req.end, None);
    }

    #[test]
    fn finished_question_serializes_as_marker() {
        let value = serde_json::to_value(QuestionResponse::finished()).unwrap();
        assert_eq!(value, json!({"finished": true}));
    }

    #[test]
    fn question_serializes_flat() {
        let view = QuestionView {
            question: "Q".into(),
            options: vec!["a".into(), "b".into()],
            index: 1,
            total: 2,
        };
        let value = serde_json::to_value(QuestionResponse::Question(view)).unwrap();
        assert_eq!(
            value,
            json!({"question": "Q", "options": ["a", "b"], "index": 1, "total": 2})
        );
    }

    #[test]
    fn answer_omits_correct_answer_outside_study() {
        let res = AnswerResponse {
            correct: true,
            score: 1,
            finished: false,
            correct_answer: None,
        };
        assert_eq!(
            serde_json::to_value(res).unwrap(),
            json!({"correct": true, "score": 1, "finished": false})
        );
    }

    #[test]
    fn end_response_carries_message() {
        let res = EndResponse::from(FinalResult {
            final_score: 2,
            total: 3,
        });
        assert_eq!(res.message, END_MESSAGE);
    }
}
