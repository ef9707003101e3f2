use chrono::Duration;

use exam_core::model::{Category, DisplayOption, LabelSet, SessionSummary};

use super::phase::SessionPhase;
use super::progress::SessionProgress;
use super::service::QuizSession;
use crate::history_service::HistoryStats;

/// Screen the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Nothing running, or a paused session offering resume/discard.
    Home,
    Quiz,
    Results,
}

impl Page {
    #[must_use]
    pub fn for_phase(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::NotStarted | SessionPhase::Paused => Page::Home,
            SessionPhase::Answering | SessionPhase::Reviewing => Page::Quiz,
            SessionPhase::Completed => Page::Results,
        }
    }
}

/// Read-only view of the question on screen.
///
/// `correct`, `explanation` and `was_correct` stay `None` until the answer is revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub category: Category,
    pub question: String,
    pub options: Vec<DisplayOption>,
    pub required_selections: usize,
    pub chosen: Option<LabelSet>,
    pub correct: Option<LabelSet>,
    pub explanation: Option<String>,
    pub was_correct: Option<bool>,
}

impl QuestionView {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        let question = session.current_question()?;
        let revealed = session.is_revealed();
        Some(Self {
            index: session.current_index(),
            total: session.questions().len(),
            category: question.category(),
            question: question.question().to_string(),
            options: question.options().to_vec(),
            required_selections: question.required_selections(),
            chosen: session.chosen().cloned(),
            correct: revealed.then(|| question.correct_labels().clone()),
            explanation: revealed.then(|| question.explanation().to_string()),
            was_correct: session.revealed_verdict(),
        })
    }
}

/// Everything the presentation layer may read at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSnapshot {
    pub page: Page,
    pub phase: SessionPhase,
    pub progress: Option<SessionProgress>,
    pub remaining: Option<Duration>,
    pub time_limit: Option<Duration>,
    pub question: Option<QuestionView>,
    pub stats: HistoryStats,
    /// Summary of the most recently completed session.
    pub last_summary: Option<SessionSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{PreparedQuestion, QuestionDraft, QuestionId};
    use exam_core::time::fixed_now;

    fn session() -> QuizSession {
        let record = QuestionDraft {
            question: "Pick two".into(),
            category: Category::Systems,
            options: vec!["GPS".into(), "IMU".into(), "Radio".into()],
            answers: "a&b".parse().unwrap(),
            explanation: "Both sense position".into(),
        }
        .validate(QuestionId::new(1))
        .unwrap();
        let question = PreparedQuestion::unshuffled(record).unwrap();
        QuizSession::new(vec![question], Duration::minutes(1), fixed_now()).unwrap()
    }

    #[test]
    fn pages_follow_phase() {
        assert_eq!(Page::for_phase(SessionPhase::NotStarted), Page::Home);
        assert_eq!(Page::for_phase(SessionPhase::Paused), Page::Home);
        assert_eq!(Page::for_phase(SessionPhase::Answering), Page::Quiz);
        assert_eq!(Page::for_phase(SessionPhase::Reviewing), Page::Quiz);
        assert_eq!(Page::for_phase(SessionPhase::Completed), Page::Results);
    }

    #[test]
    fn answer_is_hidden_until_revealed() {
        let mut session = session();
        let view = QuestionView::from_session(&session).unwrap();
        assert_eq!(view.required_selections, 2);
        assert_eq!(view.total, 1);
        assert!(view.correct.is_none());
        assert!(view.explanation.is_none());
        assert!(view.was_correct.is_none());

        session
            .submit_answer("a&c".parse().unwrap(), fixed_now())
            .unwrap();
        let view = QuestionView::from_session(&session).unwrap();
        assert_eq!(view.correct, Some("a&b".parse().unwrap()));
        assert_eq!(view.chosen, Some("a&c".parse().unwrap()));
        assert_eq!(view.explanation.as_deref(), Some("Both sense position"));
        assert_eq!(view.was_correct, Some(false));
    }

    #[test]
    fn completed_session_has_no_question() {
        let mut session = session();
        session
            .submit_answer("a&b".parse().unwrap(), fixed_now())
            .unwrap();
        session.acknowledge_and_advance(0, fixed_now()).unwrap();
        assert!(QuestionView::from_session(&session).is_none());
    }
}
