use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{info, warn};

use exam_core::model::{
    Category, ExamSettings, LabelSet, QuestionBank, ResultRecord, SessionSummary,
};
use storage::repository::SessionSummaryId;

use super::phase::{SessionOperation, SessionPhase};
use super::plan::{QuestionSelector, SelectionStrategy};
use super::progress::SessionProgress;
use super::service::{AdvanceOutcome, AnswerCheck, QuizSession};
use super::shuffle::OptionShuffler;
use super::view::{Page, QuestionView, QuizSnapshot};
use crate::Clock;
use crate::error::SessionError;
use crate::history_service::HistoryService;

/// Parameters for a new quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizRequest {
    pub count: usize,
    pub strategy: SelectionStrategy,
}

impl QuizRequest {
    #[must_use]
    pub fn balanced(count: usize) -> Self {
        Self {
            count,
            strategy: SelectionStrategy::Balanced,
        }
    }

    #[must_use]
    pub fn focused(category: Category, count: usize) -> Self {
        Self {
            count,
            strategy: SelectionStrategy::Focused(category),
        }
    }

    /// Balanced quiz of the configured size.
    #[must_use]
    pub fn from_settings(settings: &ExamSettings) -> Self {
        Self::balanced(usize::try_from(settings.question_count()).unwrap_or(usize::MAX))
    }
}

/// Result of acknowledging a revealed answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAdvance {
    /// `None` when the index had already been scored.
    pub record: Option<ResultRecord>,
    pub is_complete: bool,
    pub summary: Option<SessionSummary>,
    pub summary_id: Option<SessionSummaryId>,
}

/// Drives one learner's quizzes: selection, shuffling, the session state machine and
/// history persistence.
///
/// Every command reads the clock once, applies a lazily detected time-out, and then either
/// fully applies or leaves the session and history as they were.
pub struct QuizEngine {
    clock: Clock,
    settings: ExamSettings,
    bank: Arc<QuestionBank>,
    history: HistoryService,
    selection_rng: StdRng,
    shuffle_rng: StdRng,
    session: Option<QuizSession>,
    summary_id: Option<SessionSummaryId>,
    last_summary: Option<SessionSummary>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(bank: Arc<QuestionBank>, history: HistoryService, settings: ExamSettings) -> Self {
        Self {
            clock: Clock::system(),
            settings,
            bank,
            history,
            selection_rng: StdRng::from_os_rng(),
            shuffle_rng: StdRng::from_os_rng(),
            session: None,
            summary_id: None,
            last_summary: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the selection and shuffle sources independently.
    #[must_use]
    pub fn with_seeds(mut self, selection: u64, shuffle: u64) -> Self {
        self.selection_rng = StdRng::seed_from_u64(selection);
        self.shuffle_rng = StdRng::seed_from_u64(shuffle);
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    /// Phase as of the last command; a pending time-out shows up on the next command.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map_or(SessionPhase::NotStarted, QuizSession::phase)
    }

    /// Select, shuffle and start a new quiz.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` while another quiz is running or paused.
    /// - `SessionError::Empty` if the selection came back empty.
    pub async fn start_quiz(
        &mut self,
        request: QuizRequest,
    ) -> Result<SessionProgress, SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;
        let phase = self.phase();
        if !matches!(phase, SessionPhase::NotStarted | SessionPhase::Completed) {
            return Err(SessionError::InvalidTransition {
                operation: SessionOperation::Start,
                phase,
            });
        }

        let plan = QuestionSelector::new(&self.bank)
            .with_strategy(request.strategy)
            .select(request.count, &mut self.selection_rng);
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }
        if plan.is_short() {
            warn!(
                requested = plan.requested,
                available = plan.total(),
                strategy = ?request.strategy,
                "not enough questions, starting a shorter quiz"
            );
        }

        let prepared = OptionShuffler::new(&mut self.shuffle_rng).prepare_all(plan.questions)?;
        let time_limit = self.settings.time_limit_for(prepared.len());
        let session = QuizSession::new(prepared, time_limit, now)?;
        let progress = session.progress();
        info!(
            questions = progress.total,
            strategy = ?request.strategy,
            time_limit_secs = time_limit.num_seconds(),
            "quiz started"
        );

        self.session = Some(session);
        self.summary_id = None;
        Ok(progress)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a quiz is in progress.
    pub async fn pause(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;
        self.session_mut(SessionOperation::Pause)?.pause(now)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the quiz is paused.
    pub async fn resume(&mut self) -> Result<(), SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;
        self.session_mut(SessionOperation::Resume)?.resume(now)
    }

    /// Submit labels for the question on screen and reveal the verdict.
    ///
    /// # Errors
    ///
    /// Returns the session's `submit_answer` errors, or `SessionError::InvalidTransition`
    /// when no quiz is running.
    pub async fn submit_answer(&mut self, chosen: LabelSet) -> Result<AnswerCheck, SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;
        self.session_mut(SessionOperation::Submit)?
            .submit_answer(chosen, now)
    }

    /// Score the revealed question at `index`, append it to history and move on.
    ///
    /// The result is appended before the session moves, so a storage failure leaves the
    /// session on the same revealed question. A failed summary append on the last question
    /// is logged and retried by the next command.
    ///
    /// # Errors
    ///
    /// Returns the session's `acknowledge_and_advance` errors and `SessionError::Storage` if
    /// the result cannot be appended.
    pub async fn advance(&mut self, index: usize) -> Result<SessionAdvance, SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;

        let mut next = self.session_mut(SessionOperation::Advance)?.clone();
        let outcome = next.acknowledge_and_advance(index, now)?;
        let record = match outcome {
            AdvanceOutcome::Recorded(record) => {
                self.history.record_result(&record).await?;
                Some(record)
            }
            AdvanceOutcome::Duplicate => None,
        };
        self.session = Some(next);
        if let Err(err) = self.finalize_summary().await {
            warn!(error = %err, "quiz summary not recorded, will retry");
        }

        let is_complete = self.session.as_ref().is_some_and(QuizSession::is_complete);
        Ok(SessionAdvance {
            record,
            is_complete,
            summary: if is_complete {
                self.current_session_summary().ok().flatten()
            } else {
                None
            },
            summary_id: self.summary_id,
        })
    }

    /// Advance past the question currently on screen.
    ///
    /// # Errors
    ///
    /// Same as `advance`.
    pub async fn advance_current(&mut self) -> Result<SessionAdvance, SessionError> {
        let index = self
            .session
            .as_ref()
            .map_or(0, QuizSession::current_index);
        self.advance(index).await
    }

    /// Drop a paused quiz and return home. Answers already scored stay in history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the quiz is paused.
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase != SessionPhase::Paused {
            return Err(SessionError::InvalidTransition {
                operation: SessionOperation::Abandon,
                phase,
            });
        }
        if let Some(session) = self.session.take() {
            info!(answered = session.results().len(), "paused quiz abandoned");
        }
        self.summary_id = None;
        Ok(())
    }

    /// Time left in the current quiz, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if a time-out summary cannot be appended.
    pub async fn remaining_time(&mut self) -> Result<Option<Duration>, SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;
        Ok(self.session.as_ref().map(|s| s.remaining_time(now)))
    }

    /// Summary of the current quiz once it has completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the results cannot be summarized.
    pub fn current_session_summary(&self) -> Result<Option<SessionSummary>, SessionError> {
        match &self.session {
            Some(session) => session.summary(),
            None => Ok(None),
        }
    }

    /// Everything the presentation layer needs to draw the current page.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if history cannot be read.
    pub async fn snapshot(&mut self) -> Result<QuizSnapshot, SessionError> {
        let now = self.clock.now();
        self.refresh(now).await?;
        let stats = self
            .history
            .stats(self.settings.recent_mistakes_limit())
            .await?;
        let phase = self.phase();
        let session = self.session.as_ref();

        Ok(QuizSnapshot {
            page: Page::for_phase(phase),
            phase,
            progress: session.map(QuizSession::progress),
            remaining: session.map(|s| s.remaining_time(now)),
            time_limit: session.map(QuizSession::time_limit),
            question: session.and_then(QuestionView::from_session),
            stats,
            last_summary: self.last_summary.clone(),
        })
    }

    /// Append the summary of a completed quiz if that has not happened yet.
    ///
    /// Safe to call repeatedly; useful to retry after a failed append.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persistence fails.
    pub async fn finalize_summary(&mut self) -> Result<Option<SessionSummaryId>, SessionError> {
        if self.summary_id.is_some() {
            return Ok(self.summary_id);
        }
        let Some(summary) = self.current_session_summary()? else {
            return Ok(None);
        };

        let id = self.history.record_summary(&summary).await?;
        info!(
            summary_id = id,
            correct = summary.correct(),
            total = summary.total(),
            timed_out = summary.timed_out(),
            passed = summary.passed(self.settings.pass_threshold_percent()),
            "quiz completed"
        );
        self.summary_id = Some(id);
        self.last_summary = Some(summary);
        Ok(self.summary_id)
    }

    async fn refresh(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if let Some(session) = self.session.as_mut() {
            session.observe(now);
        }
        self.finalize_summary().await?;
        Ok(())
    }

    fn session_mut(
        &mut self,
        operation: SessionOperation,
    ) -> Result<&mut QuizSession, SessionError> {
        self.session
            .as_mut()
            .ok_or(SessionError::InvalidTransition {
                operation,
                phase: SessionPhase::NotStarted,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamSettingsDraft, QuestionDraft, QuestionId};
    use exam_core::time::fixed_clock;

    fn bank(supply: [usize; 4]) -> Arc<QuestionBank> {
        let mut questions = Vec::new();
        let mut id = 1_u64;
        for (category, count) in Category::ALL.into_iter().zip(supply) {
            for _ in 0..count {
                let record = QuestionDraft {
                    question: format!("{category} {id}"),
                    category,
                    options: vec!["alpha".into(), "beta".into(), "gamma".into()],
                    answers: "b".parse().unwrap(),
                    explanation: "beta is right".into(),
                }
                .validate(QuestionId::new(id))
                .unwrap();
                questions.push(record);
                id += 1;
            }
        }
        Arc::new(QuestionBank::new(questions).unwrap())
    }

    fn engine(supply: [usize; 4]) -> QuizEngine {
        let settings = ExamSettingsDraft {
            seconds_per_question: Some(60),
            ..ExamSettingsDraft::default()
        }
        .validate()
        .unwrap();
        QuizEngine::new(bank(supply), HistoryService::in_memory(), settings)
            .with_clock(fixed_clock())
            .with_seeds(1, 2)
    }

    fn correct_labels(engine: &QuizEngine) -> LabelSet {
        engine
            .session()
            .and_then(QuizSession::current_question)
            .map(|q| q.correct_labels().clone())
            .unwrap()
    }

    fn wrong_labels(engine: &QuizEngine) -> LabelSet {
        let question = engine
            .session()
            .and_then(QuizSession::current_question)
            .unwrap();
        question
            .options()
            .iter()
            .map(|option| option.label)
            .find(|label| !question.correct_labels().contains(*label))
            .map(LabelSet::single)
            .unwrap()
    }

    #[tokio::test]
    async fn time_limit_scales_with_prepared_questions() {
        let mut engine = engine([2, 2, 2, 2]);
        let progress = engine.start_quiz(QuizRequest::balanced(50)).await.unwrap();
        assert_eq!(progress.total, 8);
        let snapshot = engine.snapshot().await.unwrap();
        assert_eq!(snapshot.time_limit, Some(Duration::minutes(8)));
        assert_eq!(snapshot.page, Page::Quiz);
    }

    #[tokio::test]
    async fn start_is_rejected_while_running() {
        let mut engine = engine([3, 3, 3, 3]);
        engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();
        let err = engine.start_quiz(QuizRequest::balanced(4)).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                operation: SessionOperation::Start,
                phase: SessionPhase::Answering,
            }
        ));
    }

    #[tokio::test]
    async fn empty_selection_leaves_engine_idle() {
        let mut engine = engine([3, 0, 3, 3]);
        let err = engine
            .start_quiz(QuizRequest::focused(Category::Systems, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Empty));
        assert_eq!(engine.phase(), SessionPhase::NotStarted);
    }

    #[tokio::test]
    async fn commands_without_a_quiz_are_invalid() {
        let mut engine = engine([1, 1, 1, 1]);
        assert!(matches!(
            engine.pause().await.unwrap_err(),
            SessionError::InvalidTransition {
                operation: SessionOperation::Pause,
                phase: SessionPhase::NotStarted,
            }
        ));
        assert!(engine.submit_answer(LabelSet::new()).await.is_err());
        assert!(engine.abandon().is_err());
        assert_eq!(engine.remaining_time().await.unwrap(), None);
    }

    #[tokio::test]
    async fn completing_a_quiz_records_results_and_summary() {
        let mut engine = engine([1, 1, 1, 1]);
        engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();

        for index in 0..4 {
            engine.clock_mut().advance(Duration::seconds(20));
            let chosen = if index == 0 {
                wrong_labels(&engine)
            } else {
                correct_labels(&engine)
            };
            engine.submit_answer(chosen).await.unwrap();
            let step = engine.advance(index).await.unwrap();
            assert!(step.record.is_some());
            assert_eq!(step.is_complete, index == 3);
        }

        let summary = engine.current_session_summary().unwrap().unwrap();
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.correct(), 3);
        assert_eq!(summary.time_spent(), Duration::seconds(80));
        assert_eq!(summary.average_answer_time(), Some(Duration::seconds(20)));

        let snapshot = engine.snapshot().await.unwrap();
        assert_eq!(snapshot.page, Page::Results);
        assert!(snapshot.question.is_none());
        assert_eq!(snapshot.last_summary, Some(summary));
        assert_eq!(snapshot.stats.total_answered, 4);
        assert_eq!(snapshot.stats.recent_mistakes.len(), 1);
        assert_eq!(engine.history().recent_sessions(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn double_advance_is_counted_once() {
        let mut engine = engine([1, 1, 1, 1]);
        engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();
        let chosen = correct_labels(&engine);
        engine.submit_answer(chosen).await.unwrap();

        assert!(engine.advance(0).await.unwrap().record.is_some());
        assert!(engine.advance(0).await.unwrap().record.is_none());
        assert_eq!(engine.history().log().await.unwrap().len(), 1);
        assert_eq!(engine.session().unwrap().current_index(), 1);
    }

    #[tokio::test]
    async fn abandon_keeps_recorded_history() {
        let mut engine = engine([1, 1, 1, 1]);
        engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();
        let chosen = correct_labels(&engine);
        engine.submit_answer(chosen).await.unwrap();
        engine.advance_current().await.unwrap();

        assert!(engine.abandon().is_err());
        engine.pause().await.unwrap();
        assert_eq!(engine.snapshot().await.unwrap().page, Page::Home);
        engine.abandon().unwrap();

        assert_eq!(engine.phase(), SessionPhase::NotStarted);
        assert_eq!(engine.history().log().await.unwrap().len(), 1);
        assert!(engine.history().recent_sessions(10).await.unwrap().is_empty());
        engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();
    }

    #[tokio::test]
    async fn time_out_is_detected_on_the_next_query() {
        let mut engine = engine([1, 1, 1, 1]);
        engine.start_quiz(QuizRequest::balanced(2)).await.unwrap();
        let chosen = correct_labels(&engine);
        engine.submit_answer(chosen).await.unwrap();
        engine.advance_current().await.unwrap();

        engine.clock_mut().advance(Duration::minutes(5));
        assert_eq!(engine.phase(), SessionPhase::Answering);
        assert_eq!(engine.remaining_time().await.unwrap(), Some(Duration::zero()));
        assert_eq!(engine.phase(), SessionPhase::Completed);

        let snapshot = engine.snapshot().await.unwrap();
        let summary = snapshot.last_summary.unwrap();
        assert!(summary.timed_out());
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.time_spent(), Duration::minutes(2));
        assert_eq!(engine.history().recent_sessions(10).await.unwrap().len(), 1);

        engine.start_quiz(QuizRequest::balanced(2)).await.unwrap();
        assert_eq!(engine.phase(), SessionPhase::Answering);
    }

    #[tokio::test]
    async fn same_seeds_prepare_the_same_quiz() {
        let mut first = engine([5, 5, 5, 5]);
        let mut second = engine([5, 5, 5, 5]);
        first.start_quiz(QuizRequest::balanced(8)).await.unwrap();
        second.start_quiz(QuizRequest::balanced(8)).await.unwrap();
        assert_eq!(
            first.session().unwrap().questions(),
            second.session().unwrap().questions()
        );
    }
}
