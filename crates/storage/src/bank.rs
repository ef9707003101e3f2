//! Question bank loading from tabular (CSV) files.
//!
//! Expected columns: `question, category, options, answer, explanation`. `options` holds
//! 2–5 texts joined by `|`, each optionally prefixed with an ordinal marker such as `1.`;
//! `answer` holds one label or several joined by `&`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use exam_core::model::{
    BankError, Category, LabelSet, QuestionBank, QuestionDraft, QuestionId, QuestionRecord,
};

pub const REQUIRED_COLUMNS: [&str; 5] =
    ["question", "category", "options", "answer", "explanation"];

pub const OPTION_SEPARATOR: char = '|';

/// Errors raised while loading a question bank. Fatal to startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("failed to read question bank {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question bank: {0}")]
    Csv(#[from] csv::Error),

    #[error("question bank is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: exam_core::Error,
    },

    #[error(transparent)]
    Bank(#[from] BankError),
}

#[derive(Debug, Deserialize)]
struct RawQuestionRow {
    question: String,
    category: String,
    options: String,
    answer: String,
    explanation: String,
}

/// Read and parse a question bank file.
///
/// # Errors
///
/// Returns `BankLoadError::Io` if the file cannot be read, otherwise any `parse_bank` error.
pub async fn load_bank(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BankLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), bytes = text.len(), "read question bank");
    parse_bank(&text)
}

/// Parse question bank text. Row numbers in errors count data rows from 1.
///
/// # Errors
///
/// Returns `BankLoadError` for CSV syntax errors, missing columns, invalid rows, or a bank
/// without questions.
pub fn parse_bank(text: &str) -> Result<QuestionBank, BankLoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(BankLoadError::MissingColumn(column));
        }
    }

    let mut questions = Vec::new();
    for (index, row) in reader.deserialize::<RawQuestionRow>().enumerate() {
        let row_number = index + 1;
        let raw = row?;
        let id = QuestionId::new(u64::try_from(row_number).unwrap_or(u64::MAX));
        let record = parse_row(raw, id).map_err(|source| {
            warn!(row = row_number, error = %source, "rejected question row");
            BankLoadError::InvalidRow {
                row: row_number,
                source,
            }
        })?;
        questions.push(record);
    }

    let bank = QuestionBank::new(questions)?;
    info!(
        questions = bank.len(),
        supply = ?bank.count_by_category(),
        "question bank loaded"
    );
    Ok(bank)
}

fn parse_row(raw: RawQuestionRow, id: QuestionId) -> Result<QuestionRecord, exam_core::Error> {
    let category: Category = raw.category.parse()?;
    let answers: LabelSet = raw.answer.parse()?;
    let options = split_options(&raw.options);
    Ok(QuestionDraft {
        question: raw.question,
        category,
        options,
        answers,
        explanation: raw.explanation,
    }
    .validate(id)?)
}

/// Split an options field and drop ordinal markers.
#[must_use]
pub fn split_options(raw: &str) -> Vec<String> {
    raw.split(OPTION_SEPARATOR)
        .map(|option| strip_ordinal(option.trim()).to_string())
        .collect()
}

/// Strip a leading `1.`, `12.` or `a.` marker. Decimal numbers (`3.5 m`) are left alone.
fn strip_ordinal(option: &str) -> &str {
    let Some((marker, rest)) = option.split_once('.') else {
        return option;
    };
    let numeric = (1..=2).contains(&marker.len()) && marker.bytes().all(|b| b.is_ascii_digit());
    let letter = marker.len() == 1 && marker.bytes().all(|b| b.is_ascii_alphabetic());
    if !(numeric || letter) {
        return option;
    }
    if numeric && rest.starts_with(|c: char| c.is_ascii_digit()) {
        return option;
    }
    // `e.g.` and `a.m.` are text, `a. GPS` is a marker.
    if letter && !rest.starts_with(char::is_whitespace) {
        return option;
    }
    match rest.trim_start() {
        "" => option,
        stripped => stripped,
    }
}
