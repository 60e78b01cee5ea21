//! Interactive terminal quiz.

use std::io::{self, BufRead, Write};

use services::QuizService;
use services::api::{AnswerRequest, EndResponse, StartRequest};

#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error(transparent)]
    Api(#[from] services::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What the player typed at an answer prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(String),
    Quit,
}

/// A 1-based option number picks that option; anything else is taken literally.
fn resolve_input(line: &str, options: &[String]) -> Input {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim() == ":q" {
        return Input::Quit;
    }
    let picked = trimmed
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i));
    match picked {
        Some(text) => Input::Answer(text.clone()),
        None => Input::Answer(trimmed.to_string()),
    }
}

/// Run one quiz over `input`/`out`, ending the session when the questions run
/// out, the player types `:q`, or input closes.
pub fn run_play<R: BufRead, W: Write>(
    quiz: &QuizService,
    request: StartRequest,
    mut input: R,
    mut out: W,
) -> Result<EndResponse, PlayError> {
    let session_id = quiz.start(request)?.session_id.to_string();

    loop {
        let Some(view) = quiz.question(&session_id)?.into_view() else {
            break;
        };

        writeln!(out, "\n[{}/{}] {}", view.index, view.total, view.question)?;
        for (i, option) in view.options.iter().enumerate() {
            writeln!(out, "  {}. {option}", i + 1)?;
        }
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let answer = match resolve_input(&line, &view.options) {
            Input::Quit => break,
            Input::Answer(answer) => answer,
        };

        let graded = quiz.answer(&session_id, AnswerRequest { answer })?;
        if graded.correct {
            writeln!(out, "Correct! Score: {}", graded.score)?;
        } else {
            writeln!(out, "Wrong. Score: {}", graded.score)?;
        }
        if let Some(correct) = &graded.correct_answer {
            writeln!(out, "Answer: {correct}")?;
        }
        if graded.finished {
            break;
        }
    }

    let result = quiz.end(&session_id)?;
    writeln!(out, "\nFinal score: {}/{}", result.final_score, result.total)?;
    writeln!(out, "{}", result.message)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Bank, Question};
    use quiz_core::time::fixed_now;
    use services::{AppServices, Clock, ServiceOptions};
    use storage::BankStore;

    fn quiz() -> std::sync::Arc<QuizService> {
        let bank = Bank::new(
            "solo",
            vec![Question::from_pairs("Sky colour?", [("A", "Blue"), ("B", "Green")], "A").unwrap()],
        )
        .unwrap();
        AppServices::in_memory(
            BankStore::new([bank]),
            ServiceOptions {
                clock: Clock::fixed(fixed_now()),
                seed: Some(8),
                idle_ttl: None,
            },
        )
        .quiz()
    }

    fn options() -> Vec<String> {
        vec!["Green".to_string(), "Blue".to_string()]
    }

    #[test]
    fn numbers_pick_options() {
        assert_eq!(resolve_input("2\n", &options()), Input::Answer("Blue".into()));
    }

    #[test]
    fn out_of_range_numbers_are_literal() {
        assert_eq!(resolve_input("7\n", &options()), Input::Answer("7".into()));
        assert_eq!(resolve_input("0\n", &options()), Input::Answer("0".into()));
    }

    #[test]
    fn text_is_kept_verbatim() {
        assert_eq!(resolve_input(" Blue\r\n", &options()), Input::Answer(" Blue".into()));
        assert_eq!(resolve_input(":q\n", &options()), Input::Quit);
    }

    #[test]
    fn plays_a_full_quiz_by_text() {
        let mut out = Vec::new();
        let result = run_play(
            &quiz(),
            StartRequest::new("solo", 1).with_mode("study"),
            "Blue\n".as_bytes(),
            &mut out,
        )
        .unwrap();

        assert_eq!((result.final_score, result.total), (1, 1));
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("[1/1] Sky colour?"));
        assert!(transcript.contains("Correct! Score: 1"));
        assert!(transcript.contains("Answer: Blue"));
        assert!(transcript.contains("Final score: 1/1"));
    }

    #[test]
    fn closed_input_ends_early() {
        let mut out = Vec::new();
        let result = run_play(&quiz(), StartRequest::new("solo", 1), "".as_bytes(), &mut out).unwrap();
        assert_eq!((result.final_score, result.total), (0, 1));
    }
}
