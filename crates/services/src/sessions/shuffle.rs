use rand::Rng;
use rand::seq::SliceRandom;

use exam_core::model::{PreparedQuestion, QuestionError, QuestionRecord};

/// Randomizes option order while keeping the correct answers attached to their texts.
pub struct OptionShuffler<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
}

impl<'r, R: Rng + ?Sized> OptionShuffler<'r, R> {
    #[must_use]
    pub fn new(rng: &'r mut R) -> Self {
        Self { rng }
    }

    /// Apply a uniform random permutation to the record's options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` only if the record's option count cannot be labelled, which a
    /// validated record never triggers.
    pub fn shuffle(&mut self, record: QuestionRecord) -> Result<PreparedQuestion, QuestionError> {
        let mut order: Vec<usize> = (0..record.options().len()).collect();
        order.as_mut_slice().shuffle(&mut *self.rng);
        PreparedQuestion::from_permutation(record, &order)
    }

    /// Shuffle every selected record, keeping the selection order.
    ///
    /// # Errors
    ///
    /// Propagates the first `shuffle` error.
    pub fn prepare_all(
        &mut self,
        records: impl IntoIterator<Item = QuestionRecord>,
    ) -> Result<Vec<PreparedQuestion>, QuestionError> {
        records.into_iter().map(|record| self.shuffle(record)).collect()
    }
}
