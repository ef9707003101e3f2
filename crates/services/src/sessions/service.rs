use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::{debug, warn};

use exam_core::model::{LabelSet, PreparedQuestion, ResultRecord, SessionSummary, SessionTiming};

use super::phase::{SessionOperation, SessionPhase};
use super::progress::SessionProgress;
use super::timer::SessionTimer;
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Verdict revealed after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCheck {
    pub was_correct: bool,
    pub correct: LabelSet,
}

/// What an acknowledge/advance did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The question was scored and the session moved on.
    Recorded(ResultRecord),
    /// The index had already been scored; nothing changed.
    Duplicate,
}

#[derive(Debug, Clone)]
struct Submission {
    chosen: LabelSet,
    was_correct: bool,
    answer_time: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Completion {
    at: DateTime<Utc>,
    time_spent: Duration,
    timed_out: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed run through a fixed list of prepared questions.
///
/// The session never reads a clock; every operation takes `now` from the caller. Failed
/// operations leave the session untouched, apart from a time-out that the operation itself
/// observed.
#[derive(Clone)]
pub struct QuizSession {
    questions: Vec<PreparedQuestion>,
    current: usize,
    submission: Option<Submission>,
    timer: SessionTimer,
    /// Timer reading when the current question was shown.
    shown_at: Duration,
    last_scored: Option<usize>,
    results: Vec<ResultRecord>,
    started_at: DateTime<Utc>,
    completion: Option<Completion>,
}

impl QuizSession {
    /// Start a session at `now` with a running timer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn new(
        questions: Vec<PreparedQuestion>,
        time_limit: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            questions,
            current: 0,
            submission: None,
            timer: SessionTimer::start(time_limit, now),
            shown_at: Duration::zero(),
            last_scored: None,
            results: Vec::new(),
            started_at: now,
            completion: None,
        })
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.completion.is_some() {
            SessionPhase::Completed
        } else if !self.timer.is_running() {
            SessionPhase::Paused
        } else if self.submission.is_some() {
            SessionPhase::Reviewing
        } else {
            SessionPhase::Answering
        }
    }

    /// Complete the session if its budget ran out while it was running.
    ///
    /// Returns `true` when this call timed the session out.
    pub fn observe(&mut self, now: DateTime<Utc>) -> bool {
        if !self.phase().is_in_progress() || !self.timer.is_expired(now) {
            return false;
        }

        let limit = self.timer.limit();
        let overrun = self.timer.elapsed(now) - limit;
        let at = (now - overrun).max(self.started_at);
        self.timer.pause(now);
        self.submission = None;
        self.completion = Some(Completion {
            at,
            time_spent: limit,
            timed_out: true,
        });
        warn!(
            answered = self.results.len(),
            total = self.questions.len(),
            "quiz timed out"
        );
        true
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is answering or reviewing.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.observe(now);
        self.require(SessionOperation::Pause, SessionPhase::is_in_progress)?;
        self.timer.pause(now);
        Ok(())
    }

    /// Resume into whichever sub-phase was active when paused.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.require(SessionOperation::Resume, |phase| {
            phase == SessionPhase::Paused
        })?;
        self.timer.resume(now);
        Ok(())
    }

    /// Judge `chosen` against the current question and reveal the answer.
    ///
    /// Nothing is scored until the learner acknowledges the reveal.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` outside the answering sub-phase.
    /// - `SessionError::InvalidSelectionCount` if the number of labels differs from the
    ///   number of correct options. Checked before the labels themselves.
    /// - `SessionError::UnknownOption` if a label is not shown for the question.
    pub fn submit_answer(
        &mut self,
        chosen: LabelSet,
        now: DateTime<Utc>,
    ) -> Result<AnswerCheck, SessionError> {
        self.observe(now);
        self.require(SessionOperation::Submit, |phase| {
            phase == SessionPhase::Answering
        })?;
        let Some(question) = self.questions.get(self.current) else {
            return Err(self.invalid(SessionOperation::Submit));
        };

        let expected = question.required_selections();
        if chosen.len() != expected {
            return Err(SessionError::InvalidSelectionCount {
                expected,
                got: chosen.len(),
            });
        }
        if let Some(label) = chosen.first_out_of_range(question.options().len()) {
            return Err(SessionError::UnknownOption(label));
        }

        let was_correct = question.judge(&chosen);
        let correct = question.correct_labels().clone();
        let answer_time = self.timer.elapsed(now) - self.shown_at;
        debug!(
            index = self.current,
            question_id = %question.id(),
            chosen = %chosen,
            was_correct,
            "answer submitted"
        );
        self.submission = Some(Submission {
            chosen,
            was_correct,
            answer_time,
        });

        Ok(AnswerCheck {
            was_correct,
            correct,
        })
    }

    /// Score the revealed question at `index` and move to the next one.
    ///
    /// Acknowledging an index that was already scored is a no-op, so a double-submitted
    /// advance counts once.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` outside the reviewing sub-phase.
    /// - `SessionError::QuestionMismatch` if `index` is not the question on screen.
    pub fn acknowledge_and_advance(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<AdvanceOutcome, SessionError> {
        self.observe(now);
        if self.last_scored == Some(index) {
            return Ok(AdvanceOutcome::Duplicate);
        }
        self.require(SessionOperation::Advance, |phase| {
            phase == SessionPhase::Reviewing
        })?;
        if index != self.current {
            return Err(SessionError::QuestionMismatch {
                expected: self.current,
                got: index,
            });
        }
        let (Some(question), Some(submission)) =
            (self.questions.get(self.current), self.submission.take())
        else {
            return Err(self.invalid(SessionOperation::Advance));
        };

        let record = ResultRecord::new(
            question,
            submission.was_correct,
            now,
            submission.answer_time,
        );
        self.results.push(record.clone());
        self.last_scored = Some(self.current);
        self.current += 1;
        debug!(index, was_correct = record.was_correct, "question scored");

        if self.current >= self.questions.len() {
            let time_spent = self.timer.elapsed(now).min(self.timer.limit());
            self.timer.pause(now);
            self.completion = Some(Completion {
                at: now.max(self.started_at),
                time_spent,
                timed_out: false,
            });
        } else {
            self.shown_at = self.timer.elapsed(now);
        }

        Ok(AdvanceOutcome::Recorded(record))
    }

    /// Budget left at `now`, floored at zero. Frozen while paused or completed.
    #[must_use]
    pub fn remaining_time(&self, now: DateTime<Utc>) -> Duration {
        self.timer.remaining(now)
    }

    #[must_use]
    pub fn time_limit(&self) -> Duration {
        self.timer.limit()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.map(|c| c.at)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.completion.is_some_and(|c| c.timed_out)
    }

    /// 0-based index of the question on screen.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question on screen; `None` once completed.
    #[must_use]
    pub fn current_question(&self) -> Option<&PreparedQuestion> {
        if self.is_complete() {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[PreparedQuestion] {
        &self.questions
    }

    /// Labels submitted for the current question, once revealed.
    #[must_use]
    pub fn chosen(&self) -> Option<&LabelSet> {
        self.submission.as_ref().map(|s| &s.chosen)
    }

    /// Verdict for the current question, once revealed.
    #[must_use]
    pub fn revealed_verdict(&self) -> Option<bool> {
        self.submission.as_ref().map(|s| s.was_correct)
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.submission.is_some()
    }

    /// Results scored in this session, in answer order.
    #[must_use]
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.results.len();
        SessionProgress {
            total,
            current: if self.is_complete() {
                total
            } else {
                self.current.min(total)
            },
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// Summary of this session's results; `None` until the session completes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Summary` if the recorded results cannot be summarized.
    pub fn summary(&self) -> Result<Option<SessionSummary>, SessionError> {
        let Some(completion) = self.completion else {
            return Ok(None);
        };
        let timing = SessionTiming {
            started_at: self.started_at,
            completed_at: completion.at,
            time_spent: completion.time_spent,
            time_limit: self.timer.limit(),
            timed_out: completion.timed_out,
        };
        Ok(Some(SessionSummary::from_results(timing, &self.results)?))
    }

    fn require(
        &self,
        operation: SessionOperation,
        allowed: impl FnOnce(SessionPhase) -> bool,
    ) -> Result<(), SessionError> {
        if allowed(self.phase()) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: SessionOperation) -> SessionError {
        SessionError::InvalidTransition {
            operation,
            phase: self.phase(),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("phase", &self.phase())
            .field("results_len", &self.results.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
