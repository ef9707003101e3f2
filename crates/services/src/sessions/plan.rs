use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashSet};

use exam_core::model::{Category, QuestionBank, QuestionRecord};

/// How questions are drawn from the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Spread evenly over every category, topping up from the rest of the bank.
    Balanced,
    /// Draw only from one category.
    Focused(Category),
}

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPlan {
    pub questions: Vec<QuestionRecord>,
    pub requested: usize,
    /// Questions taken by the top-up pass after the per-category draw.
    pub topped_up: usize,
}

impl SelectionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// True when supply could not cover the requested count.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.questions.len() < self.requested
    }

    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for question in &self.questions {
            *counts.entry(question.category()).or_default() += 1;
        }
        counts
    }
}

/// Draws a non-repeating subset of the bank.
///
/// Never fails: when supply is short the plan holds everything available.
pub struct QuestionSelector<'a> {
    bank: &'a QuestionBank,
    strategy: SelectionStrategy,
}

impl<'a> QuestionSelector<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self {
            bank,
            strategy: SelectionStrategy::Balanced,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Draw up to `count` questions.
    ///
    /// - `Balanced`: `count / 4` per category (or all a category has), then the shortfall
    ///   from the not-yet-selected pool, then the whole list is shuffled so categories do
    ///   not run in blocks.
    /// - `Focused`: up to `count` from the chosen category.
    pub fn select<R: Rng + ?Sized>(self, count: usize, rng: &mut R) -> SelectionPlan {
        let (questions, topped_up) = match self.strategy {
            SelectionStrategy::Balanced => self.select_balanced(count, rng),
            SelectionStrategy::Focused(category) => {
                (draw(self.bank.in_category(category), count, rng), 0)
            }
        };

        SelectionPlan {
            questions: questions.into_iter().cloned().collect(),
            requested: count,
            topped_up,
        }
    }

    fn select_balanced<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> (Vec<&'a QuestionRecord>, usize) {
        let per_category = count / Category::ALL.len();

        let mut selected = Vec::with_capacity(count);
        for category in Category::ALL {
            selected.extend(draw(self.bank.in_category(category), per_category, rng));
        }

        let shortfall = count.saturating_sub(selected.len());
        let mut topped_up = 0;
        if shortfall > 0 {
            let selected_ids: HashSet<_> = selected.iter().map(|q| q.id()).collect();
            let leftovers = self
                .bank
                .questions()
                .iter()
                .filter(|q| !selected_ids.contains(&q.id()));
            let extra = draw(leftovers, shortfall, rng);
            topped_up = extra.len();
            selected.extend(extra);
        }

        selected.as_mut_slice().shuffle(rng);
        (selected, topped_up)
    }
}

/// Uniform draw of up to `take` items without replacement.
fn draw<'q, R: Rng + ?Sized>(
    pool: impl Iterator<Item = &'q QuestionRecord>,
    take: usize,
    rng: &mut R,
) -> Vec<&'q QuestionRecord> {
    let mut pool: Vec<_> = pool.collect();
    pool.as_mut_slice().shuffle(rng);
    pool.truncate(take);
    pool
}
