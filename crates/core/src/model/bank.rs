use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{category::Category, ids::QuestionId, question::QuestionRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,

    #[error("question id {0} appears more than once")]
    DuplicateId(QuestionId),
}

/// Immutable in-memory question bank, loaded once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Build a bank from validated records.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list and `BankError::DuplicateId` when two
    /// records share an identity.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        let mut ids = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !ids.insert(question.id()) {
                return Err(BankError::DuplicateId(question.id()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &QuestionRecord> {
        self.questions
            .iter()
            .filter(move |q| q.category() == category)
    }

    /// Supply per category; categories without questions are reported as zero.
    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts: BTreeMap<Category, usize> =
            Category::ALL.into_iter().map(|c| (c, 0)).collect();
        for question in &self.questions {
            *counts.entry(question.category()).or_default() += 1;
        }
        counts
    }
}
