use thiserror::Error;

use crate::model::{
    BankError, CategoryError, LabelError, QuestionError, SessionSummaryError, SettingsError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
