#![forbid(unsafe_code)]

pub mod error;
pub mod history_service;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use error::SessionError;
pub use history_service::{HistoryService, HistoryStats, SessionSummaryListItem};

pub use sessions::{
    AdvanceOutcome, AnswerCheck, OptionShuffler, Page, QuestionSelector, QuestionView,
    QuizEngine, QuizRequest, QuizSession, QuizSnapshot, SelectionPlan, SelectionStrategy,
    SessionAdvance, SessionOperation, SessionPhase, SessionProgress, SessionTimer,
};
