mod phase;
mod plan;
mod progress;
mod service;
mod shuffle;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use phase::{SessionOperation, SessionPhase};
pub use plan::{QuestionSelector, SelectionPlan, SelectionStrategy};
pub use progress::SessionProgress;
pub use service::{AdvanceOutcome, AnswerCheck, QuizSession};
pub use shuffle::OptionShuffler;
pub use timer::SessionTimer;
pub use view::{Page, QuestionView, QuizSnapshot};
pub use workflow::{QuizEngine, QuizRequest, SessionAdvance};
