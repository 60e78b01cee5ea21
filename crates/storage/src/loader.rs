//! Loads question banks from a directory of JSON files.
//!
//! Each `*.json` file becomes one bank named after the file stem. A file holds
//! either a bare array of questions or an object with a `questions` array:
//!
//! ```json
//! [{ "question": "2+2?", "options": { "A": "3", "B": "4" }, "answer": "B" }]
//! ```
//!
//! ```json
//! { "questions": [{ "question": "2+2?", "options": { "A": "3", "B": "4" }, "answer": "B" }] }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quiz_core::model::{Bank, BankError, Question};
use serde_json::Value;
use thiserror::Error;

use crate::banks::BankStore;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseBankError {
    #[error("invalid bank json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array of questions or an object with a `questions` array")]
    Shape,

    #[error(transparent)]
    Bank(#[from] BankError),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("questions directory not found: {}", path.display())]
    MissingDir { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load bank {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseBankError,
    },
}

/// Parse one bank document, accepting both supported shapes.
///
/// # Errors
///
/// Returns `ParseBankError` for malformed JSON, an unsupported top-level
/// shape, or a question whose answer key is not among its options.
pub fn parse_bank(name: &str, json: &str) -> Result<Bank, ParseBankError> {
    let value: Value = serde_json::from_str(json)?;
    let questions = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map.remove("questions").ok_or(ParseBankError::Shape)?,
        _ => return Err(ParseBankError::Shape),
    };
    if !questions.is_array() {
        return Err(ParseBankError::Shape);
    }
    let questions: Vec<Question> = serde_json::from_value(questions)?;
    Ok(Bank::new(name, questions)?)
}

/// Load every `*.json` bank in `dir`.
///
/// Files with other extensions are ignored. Empty banks are kept but logged.
///
/// # Errors
///
/// Returns `LoadError` if the directory is missing or unreadable, or if any
/// bank file fails to parse.
pub fn load_banks_from_dir(dir: impl AsRef<Path>) -> Result<BankStore, LoadError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LoadError::MissingDir {
            path: dir.to_path_buf(),
        });
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LoadError::Io { path, source }
    };

    let mut banks = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping bank file with non-utf8 name");
            continue;
        };

        let raw = fs::read_to_string(&path).map_err(io_err(&path))?;
        let bank = parse_bank(name, &raw).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;
        if bank.is_empty() {
            tracing::warn!(bank = bank.name(), "loaded empty question bank");
        } else {
            tracing::debug!(bank = bank.name(), questions = bank.len(), "loaded question bank");
        }
        banks.push(bank);
    }

    let store = BankStore::new(banks);
    tracing::info!(dir = %dir.display(), banks = store.len(), "question banks loaded");
    Ok(store)
}
