use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::result::ResultRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many results for a single session: {len}")]
    TooManyResults { len: usize },

    #[error("correct answers ({correct}) exceed total answers ({total})")]
    CountMismatch { total: u32, correct: u32 },
}

/// Wall-clock facts about a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Active time, capped at the limit; a timed-out session reports the full limit.
    pub time_spent: Duration,
    pub time_limit: Duration,
    pub timed_out: bool,
}

/// Aggregate result of one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    timing: SessionTiming,
    total: u32,
    correct: u32,
    answer_time_total: Duration,
}

impl SessionSummary {
    /// Rehydrate a summary from stored counts.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` or `SessionSummaryError::CountMismatch`
    /// when the values are inconsistent.
    pub fn from_persisted(
        timing: SessionTiming,
        total: u32,
        correct: u32,
        answer_time_total: Duration,
    ) -> Result<Self, SessionSummaryError> {
        if timing.completed_at < timing.started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if correct > total {
            return Err(SessionSummaryError::CountMismatch { total, correct });
        }
        Ok(Self {
            timing,
            total,
            correct,
            answer_time_total,
        })
    }

    /// Build a summary from the results recorded during the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if the timing is inverted and
    /// `SessionSummaryError::TooManyResults` if the count does not fit in `u32`.
    pub fn from_results(
        timing: SessionTiming,
        results: &[ResultRecord],
    ) -> Result<Self, SessionSummaryError> {
        let total = u32::try_from(results.len())
            .map_err(|_| SessionSummaryError::TooManyResults { len: results.len() })?;
        let mut correct = 0_u32;
        let mut answer_time_total = Duration::zero();
        for result in results {
            if result.was_correct {
                correct = correct.saturating_add(1);
            }
            answer_time_total += result.answer_time;
        }
        Self::from_persisted(timing, total, correct, answer_time_total)
    }

    #[must_use]
    pub fn timing(&self) -> &SessionTiming {
        &self.timing
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.timing.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.timing.completed_at
    }

    #[must_use]
    pub fn time_spent(&self) -> Duration {
        self.timing.time_spent
    }

    #[must_use]
    pub fn time_limit(&self) -> Duration {
        self.timing.time_limit
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timing.timed_out
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Percentage of correct answers; `0.0` when nothing was answered.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.correct) / f64::from(self.total)
    }

    /// Mean answer time per recorded question.
    #[must_use]
    pub fn average_answer_time(&self) -> Option<Duration> {
        if self.total == 0 {
            return None;
        }
        Some(self.answer_time_total / i32::try_from(self.total).unwrap_or(i32::MAX))
    }

    /// Whether the session reached `threshold_percent`. An empty session never passes.
    #[must_use]
    pub fn passed(&self, threshold_percent: u8) -> bool {
        self.total > 0
            && u64::from(self.correct) * 100 >= u64::from(self.total) * u64::from(threshold_percent)
    }

    /// Additional correct answers that were needed to pass.
    #[must_use]
    pub fn correct_needed_to_pass(&self, threshold_percent: u8) -> u32 {
        let required = (u64::from(self.total) * u64::from(threshold_percent)).div_ceil(100);
        let required = u32::try_from(required).unwrap_or(u32::MAX);
        required.saturating_sub(self.correct)
    }
}
