//! Read-side projections over the result history.
//!
//! `HistoryLog` is an append-only sequence of `ResultRecord`s. Every statistic here is a
//! pure function of that sequence, so the same views can be replayed from any stored log.

use std::collections::BTreeMap;

use crate::model::{Category, ResultRecord};

/// Answer counts for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStats {
    pub category: Category,
    pub answered: usize,
    pub correct: usize,
}

impl CategoryStats {
    /// Percentage of correct answers; `None` when nothing was answered.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        (self.answered > 0).then(|| 100.0 * self.correct as f64 / self.answered as f64)
    }
}

/// A wrongly answered question, as listed for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mistake {
    pub category: Category,
    pub question_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    records: Vec<ResultRecord>,
}

impl HistoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: ResultRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Per-category counts; categories without answers are omitted.
    #[must_use]
    pub fn category_stats(&self) -> BTreeMap<Category, CategoryStats> {
        let mut stats = BTreeMap::new();
        for record in &self.records {
            let entry = stats.entry(record.category).or_insert(CategoryStats {
                category: record.category,
                answered: 0,
                correct: 0,
            });
            entry.answered += 1;
            if record.was_correct {
                entry.correct += 1;
            }
        }
        stats
    }

    /// Percentage correct per category; categories without answers are omitted.
    #[must_use]
    pub fn accuracy_by_category(&self) -> BTreeMap<Category, f64> {
        self.category_stats()
            .into_iter()
            .filter_map(|(category, stats)| stats.accuracy().map(|a| (category, a)))
            .collect()
    }

    #[must_use]
    pub fn count_by_category(&self) -> BTreeMap<Category, usize> {
        self.category_stats()
            .into_iter()
            .map(|(category, stats)| (category, stats.answered))
            .collect()
    }

    /// The last `limit` mistakes, oldest first.
    #[must_use]
    pub fn recent_mistakes(&self, limit: usize) -> Vec<Mistake> {
        let mut mistakes: Vec<Mistake> = self
            .records
            .iter()
            .rev()
            .filter(|record| !record.was_correct)
            .take(limit)
            .map(|record| Mistake {
                category: record.category,
                question_text: record.question_text.clone(),
            })
            .collect();
        mistakes.reverse();
        mistakes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn record(id: u64, category: Category, correct: bool) -> ResultRecord {
        ResultRecord {
            question_id: QuestionId::new(id),
            category,
            question_text: format!("Q{id}"),
            was_correct: correct,
            answered_at: fixed_now(),
            answer_time: Duration::seconds(5),
        }
    }

    #[test]
    fn empty_log_has_no_stats() {
        let log = HistoryLog::new();
        assert!(log.accuracy_by_category().is_empty());
        assert!(log.count_by_category().is_empty());
        assert!(log.recent_mistakes(10).is_empty());
    }

    #[test]
    fn accuracy_omits_unanswered_categories() {
        let log = HistoryLog::from_records(vec![
            record(1, Category::Rules, true),
            record(2, Category::Rules, false),
            record(3, Category::Risk, true),
        ]);

        let accuracy = log.accuracy_by_category();
        assert_eq!(accuracy.len(), 2);
        assert_eq!(accuracy[&Category::Rules], 50.0);
        assert_eq!(accuracy[&Category::Risk], 100.0);
        assert!(!accuracy.contains_key(&Category::Systems));

        let counts = log.count_by_category();
        assert_eq!(counts[&Category::Rules], 2);
        assert_eq!(counts[&Category::Risk], 1);
    }

    #[test]
    fn recent_mistakes_keep_chronological_tail() {
        let mut log = HistoryLog::new();
        for id in 1..=15 {
            log.append(record(id, Category::Operations, id % 5 == 0));
        }

        let mistakes = log.recent_mistakes(10);
        let texts: Vec<_> = mistakes.iter().map(|m| m.question_text.as_str()).collect();
        assert_eq!(
            texts,
            ["Q3", "Q4", "Q6", "Q7", "Q8", "Q9", "Q11", "Q12", "Q13", "Q14"]
        );
    }

    #[test]
    fn recent_mistakes_with_zero_limit_is_empty() {
        let log = HistoryLog::from_records(vec![record(1, Category::Systems, false)]);
        assert!(log.recent_mistakes(0).is_empty());
    }
}
