use std::collections::HashSet;
use thiserror::Error;

use crate::model::{
    category::Category,
    ids::QuestionId,
    label::{LabelSet, MAX_OPTIONS, MIN_OPTIONS, OptionLabel},
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("a question needs 2 to 5 options, got {count}")]
    OptionCount { count: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("option text appears twice: {text:?}")]
    DuplicateOption { text: String },

    #[error("question has no correct answer")]
    NoAnswer,

    #[error("answer {label} does not match any of the {options} options")]
    AnswerOutOfRange { label: OptionLabel, options: usize },

    #[error("display order is not a permutation of {options} options")]
    InvalidPermutation { options: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as read from a bank source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub category: Category,
    pub options: Vec<String>,
    pub answers: LabelSet,
    pub explanation: String,
}

impl QuestionDraft {
    /// Validate the draft and bind it to an identity.
    ///
    /// Option texts must be distinct: shuffling identifies correct options by text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is empty, the option list is out of bounds or
    /// holds empty/duplicate entries, or an answer label has no matching option.
    pub fn validate(self, id: QuestionId) -> Result<QuestionRecord, QuestionError> {
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Err(QuestionError::EmptyQuestion);
        }

        let count = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            return Err(QuestionError::OptionCount { count });
        }

        let mut seen = HashSet::with_capacity(count);
        let mut options = Vec::with_capacity(count);
        for (index, raw) in self.options.into_iter().enumerate() {
            let text = raw.trim().to_string();
            if text.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            if !seen.insert(text.clone()) {
                return Err(QuestionError::DuplicateOption { text });
            }
            options.push(text);
        }

        if self.answers.is_empty() {
            return Err(QuestionError::NoAnswer);
        }
        if let Some(label) = self.answers.first_out_of_range(count) {
            return Err(QuestionError::AnswerOutOfRange {
                label,
                options: count,
            });
        }

        Ok(QuestionRecord {
            id,
            question,
            category: self.category,
            options,
            answers: self.answers,
            explanation: self.explanation.trim().to_string(),
        })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Immutable bank question with its options in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    id: QuestionId,
    question: String,
    category: Category,
    options: Vec<String>,
    answers: LabelSet,
    explanation: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Options in bank order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Correct labels against bank order.
    #[must_use]
    pub fn answers(&self) -> &LabelSet {
        &self.answers
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Texts of the correct options.
    #[must_use]
    pub fn correct_texts(&self) -> Vec<&str> {
        self.answers
            .iter()
            .filter_map(|label| self.options.get(label.index()))
            .map(String::as_str)
            .collect()
    }
}

//
// ─── PREPARED ──────────────────────────────────────────────────────────────────
//

/// Option as presented to the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOption {
    pub label: OptionLabel,
    pub text: String,
}

/// Question with options in display order and correct labels remapped to that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuestion {
    record: QuestionRecord,
    options: Vec<DisplayOption>,
    correct: LabelSet,
}

impl PreparedQuestion {
    /// Lay out `record`'s options so that display position `i` shows bank option `order[i]`.
    ///
    /// Correct labels are recomputed from the correct option texts, never carried over by
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidPermutation` if `order` does not name every option
    /// exactly once.
    pub fn from_permutation(
        record: QuestionRecord,
        order: &[usize],
    ) -> Result<Self, QuestionError> {
        let count = record.options.len();
        let mut used = vec![false; count];
        if order.len() != count {
            return Err(QuestionError::InvalidPermutation { options: count });
        }
        for &index in order {
            match used.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(QuestionError::InvalidPermutation { options: count }),
            }
        }

        let correct_texts: HashSet<&str> = record.correct_texts().into_iter().collect();
        let mut options = Vec::with_capacity(count);
        let mut correct = LabelSet::new();
        for (position, &index) in order.iter().enumerate() {
            let label = OptionLabel::from_index(position)
                .map_err(|_| QuestionError::OptionCount { count })?;
            let text = record.options[index].clone();
            if correct_texts.contains(text.as_str()) {
                correct.insert(label);
            }
            options.push(DisplayOption { label, text });
        }

        Ok(Self {
            record,
            options,
            correct,
        })
    }

    /// Present options in bank order.
    ///
    /// # Errors
    ///
    /// Propagates `from_permutation` errors (none for a validated record).
    pub fn unshuffled(record: QuestionRecord) -> Result<Self, QuestionError> {
        let order: Vec<usize> = (0..record.options.len()).collect();
        Self::from_permutation(record, &order)
    }

    #[must_use]
    pub fn record(&self) -> &QuestionRecord {
        &self.record
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.record.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.record.question
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.record.category
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.record.explanation
    }

    #[must_use]
    pub fn options(&self) -> &[DisplayOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, label: OptionLabel) -> Option<&DisplayOption> {
        self.options.get(label.index())
    }

    #[must_use]
    pub fn correct_labels(&self) -> &LabelSet {
        &self.correct
    }

    /// How many options the learner must pick.
    #[must_use]
    pub fn required_selections(&self) -> usize {
        self.correct.len()
    }

    /// Exact-match judgement: no partial credit.
    #[must_use]
    pub fn judge(&self, chosen: &LabelSet) -> bool {
        *chosen == self.correct
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
