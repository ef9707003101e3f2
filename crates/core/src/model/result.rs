use chrono::{DateTime, Duration, Utc};

use crate::model::{category::Category, ids::QuestionId, question::PreparedQuestion};

/// Outcome of one answered question.
///
/// Appended to the history log once per question and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub question_id: QuestionId,
    pub category: Category,
    pub question_text: String,
    pub was_correct: bool,
    pub answered_at: DateTime<Utc>,
    /// Active time between the question being shown and the answer being submitted.
    pub answer_time: Duration,
}

impl ResultRecord {
    #[must_use]
    pub fn new(
        question: &PreparedQuestion,
        was_correct: bool,
        answered_at: DateTime<Utc>,
        answer_time: Duration,
    ) -> Self {
        Self {
            question_id: question.id(),
            category: question.category(),
            question_text: question.question().to_string(),
            was_correct,
            answered_at,
            answer_time,
        }
    }
}
