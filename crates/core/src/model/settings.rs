use chrono::Duration;
use thiserror::Error;

/// Question counts offered by the trainer.
pub const STANDARD_QUESTION_COUNTS: [u32; 2] = [30, 50];

/// 50 questions in 30 minutes.
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 36;

pub const DEFAULT_QUESTION_COUNT: u32 = 50;
pub const DEFAULT_PASS_THRESHOLD_PERCENT: u8 = 80;
pub const DEFAULT_RECENT_MISTAKES_LIMIT: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,

    #[error("pass threshold must be between 1 and 100 percent, got {0}")]
    InvalidPassThreshold(u8),

    #[error("recent mistakes limit must be > 0")]
    InvalidRecentMistakesLimit,
}

/// Validated exam configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSettings {
    question_count: u32,
    seconds_per_question: u32,
    pass_threshold_percent: u8,
    recent_mistakes_limit: usize,
}

/// Unvalidated settings; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct ExamSettingsDraft {
    pub question_count: Option<u32>,
    pub seconds_per_question: Option<u32>,
    pub pass_threshold_percent: Option<u8>,
    pub recent_mistakes_limit: Option<usize>,
}

impl ExamSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for zero counts/limits or a threshold outside `1..=100`.
    pub fn validate(self) -> Result<ExamSettings, SettingsError> {
        let question_count = self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
        if question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        let seconds_per_question = self
            .seconds_per_question
            .unwrap_or(DEFAULT_SECONDS_PER_QUESTION);
        if seconds_per_question == 0 {
            return Err(SettingsError::InvalidSecondsPerQuestion);
        }
        let pass_threshold_percent = self
            .pass_threshold_percent
            .unwrap_or(DEFAULT_PASS_THRESHOLD_PERCENT);
        if !(1..=100).contains(&pass_threshold_percent) {
            return Err(SettingsError::InvalidPassThreshold(pass_threshold_percent));
        }
        let recent_mistakes_limit = self
            .recent_mistakes_limit
            .unwrap_or(DEFAULT_RECENT_MISTAKES_LIMIT);
        if recent_mistakes_limit == 0 {
            return Err(SettingsError::InvalidRecentMistakesLimit);
        }

        Ok(ExamSettings {
            question_count,
            seconds_per_question,
            pass_threshold_percent,
            recent_mistakes_limit,
        })
    }
}

impl ExamSettings {
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn pass_threshold_percent(&self) -> u8 {
        self.pass_threshold_percent
    }

    #[must_use]
    pub fn recent_mistakes_limit(&self) -> usize {
        self.recent_mistakes_limit
    }

    /// Time budget for a session of `question_count` questions.
    ///
    /// Time per question is constant, so the budget scales linearly with the set size.
    #[must_use]
    pub fn time_limit_for(&self, question_count: usize) -> Duration {
        let count = i64::try_from(question_count).unwrap_or(i64::MAX);
        Duration::try_seconds(count.saturating_mul(i64::from(self.seconds_per_question)))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            pass_threshold_percent: DEFAULT_PASS_THRESHOLD_PERCENT,
            recent_mistakes_limit: DEFAULT_RECENT_MISTAKES_LIMIT,
        }
    }
}
