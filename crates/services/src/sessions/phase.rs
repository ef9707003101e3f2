use std::fmt;

/// Lifecycle of the active quiz.
///
/// `Answering` and `Reviewing` are the two sub-phases of an in-progress session; a paused
/// session remembers which of them it left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    NotStarted,
    Answering,
    Reviewing,
    Paused,
    Completed,
}

impl SessionPhase {
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(self, SessionPhase::Answering | SessionPhase::Reviewing)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::Answering => "answering",
            SessionPhase::Reviewing => "reviewing",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Commands accepted from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOperation {
    Start,
    Pause,
    Resume,
    Submit,
    Advance,
    Abandon,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionOperation::Start => "start a quiz",
            SessionOperation::Pause => "pause",
            SessionOperation::Resume => "resume",
            SessionOperation::Submit => "submit an answer",
            SessionOperation::Advance => "advance",
            SessionOperation::Abandon => "abandon",
        };
        f.write_str(name)
    }
}
