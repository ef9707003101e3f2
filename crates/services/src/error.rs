//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{OptionLabel, QuestionError, SessionSummaryError};
use storage::repository::StorageError;

use crate::sessions::{SessionOperation, SessionPhase};

/// Errors emitted by quiz sessions and the engine driving them.
///
/// Every failing operation leaves the session and history as they were.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("select exactly {expected} option(s), got {got}")]
    InvalidSelectionCount { expected: usize, got: usize },
    #[error("option {0} is not shown for this question")]
    UnknownOption(OptionLabel),
    #[error("cannot {operation} while the session is {phase}")]
    InvalidTransition {
        operation: SessionOperation,
        phase: SessionPhase,
    },
    #[error("question {got} is not the current question ({expected})")]
    QuestionMismatch { expected: usize, got: usize },
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
