//! Line-delimited JSON front end.
//!
//! Each stdin line is one request object tagged by `op`; each response is one
//! JSON line on stdout:
//!
//! ```text
//! {"op":"banks"}
//! {"op":"start","bank":"geo","count":3,"mode":"study"}
//! {"op":"question","session_id":"..."}
//! {"op":"answer","session_id":"...","answer":"Paris"}
//! {"op":"end","session_id":"..."}
//! ```

use std::io::{self, BufRead, Write};

use serde::Deserialize;
use serde_json::Value;

use services::api::{AnswerRequest, StartRequest};
use services::{ApiError, ErrorBody, QuizService};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Banks,
    Start(StartRequest),
    Question { session_id: String },
    Answer { session_id: String, answer: String },
    End { session_id: String },
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn dispatch(quiz: &QuizService, request: Request) -> Result<Value, ApiError> {
    Ok(match request {
        Request::Banks => to_json(&quiz.list_banks()),
        Request::Start(start) => to_json(&quiz.start(start)?),
        Request::Question { session_id } => to_json(&quiz.question(&session_id)?),
        Request::Answer { session_id, answer } => {
            to_json(&quiz.answer(&session_id, AnswerRequest { answer })?)
        }
        Request::End { session_id } => to_json(&quiz.end(&session_id)?),
    })
}

/// Handle one request line and return the response line.
pub fn handle_line(quiz: &QuizService, line: &str) -> Value {
    let outcome = serde_json::from_str::<Request>(line)
        .map_err(|err| {
            tracing::debug!(error = %err, "rejected malformed request");
            ApiError::bad_request("Malformed request")
        })
        .and_then(|request| dispatch(quiz, request));

    match outcome {
        Ok(value) => value,
        Err(err) => to_json(&ErrorBody::from(&err)),
    }
}

/// Serve requests until `input` closes. Blank lines are ignored.
pub fn run_serve<R: BufRead, W: Write>(quiz: &QuizService, input: R, mut out: W) -> io::Result<()> {
    tracing::info!("serving json requests on stdin");
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(quiz, &line);
        writeln!(out, "{response}")?;
        out.flush()?;
    }
    tracing::info!("input closed, shutting down");
    Ok(())
}
