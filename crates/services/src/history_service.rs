use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use exam_core::history::{HistoryLog, Mistake};
use exam_core::model::{Category, ResultRecord, SessionSummary};
use storage::repository::{
    HistoryRepository, SessionSummaryId, SessionSummaryRepository, SessionSummaryRow, Storage,
};

use crate::error::SessionError;

/// Aggregate statistics over every answer recorded in this process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStats {
    /// Percentage correct per category; categories never answered are absent.
    pub accuracy_by_category: BTreeMap<Category, f64>,
    pub count_by_category: BTreeMap<Category, usize>,
    /// Oldest first.
    pub recent_mistakes: Vec<Mistake>,
    pub total_answered: usize,
}

impl HistoryStats {
    #[must_use]
    pub fn from_log(log: &HistoryLog, mistakes_limit: usize) -> Self {
        Self {
            accuracy_by_category: log.accuracy_by_category(),
            count_by_category: log.count_by_category(),
            recent_mistakes: log.recent_mistakes(mistakes_limit),
            total_answered: log.len(),
        }
    }
}

/// Presentation-agnostic list item for a completed session.
///
/// No pre-formatted strings; the UI formats durations and timestamps as it likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryListItem {
    pub id: SessionSummaryId,
    pub completed_at: DateTime<Utc>,
    pub total: u32,
    pub correct: u32,
    pub time_spent: Duration,
    pub timed_out: bool,
}

impl SessionSummaryListItem {
    #[must_use]
    pub fn from_summary(id: SessionSummaryId, summary: &SessionSummary) -> Self {
        Self {
            id,
            completed_at: summary.completed_at(),
            total: summary.total(),
            correct: summary.correct(),
            time_spent: summary.time_spent(),
            timed_out: summary.timed_out(),
        }
    }

    #[must_use]
    pub fn from_row(row: &SessionSummaryRow) -> Self {
        Self::from_summary(row.id, &row.summary)
    }
}

/// Append and query side of the answer history.
#[derive(Clone)]
pub struct HistoryService {
    results: Arc<dyn HistoryRepository>,
    summaries: Arc<dyn SessionSummaryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(
        results: Arc<dyn HistoryRepository>,
        summaries: Arc<dyn SessionSummaryRepository>,
    ) -> Self {
        Self { results, summaries }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(
            Arc::clone(&storage.history),
            Arc::clone(&storage.session_summaries),
        )
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_storage(&Storage::in_memory())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the record cannot be appended.
    pub async fn record_result(&self, record: &ResultRecord) -> Result<(), SessionError> {
        self.results.append_result(record).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the summary cannot be appended.
    pub async fn record_summary(
        &self,
        summary: &SessionSummary,
    ) -> Result<SessionSummaryId, SessionError> {
        Ok(self.summaries.append_summary(summary).await?)
    }

    /// The full answer log.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the log cannot be read.
    pub async fn log(&self) -> Result<HistoryLog, SessionError> {
        Ok(HistoryLog::from_records(self.results.list_results().await?))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the log cannot be read.
    pub async fn stats(&self, mistakes_limit: usize) -> Result<HistoryStats, SessionError> {
        let log = self.log().await?;
        Ok(HistoryStats::from_log(&log, mistakes_limit))
    }

    /// Completed sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn recent_sessions(
        &self,
        limit: u32,
    ) -> Result<Vec<SessionSummaryListItem>, SessionError> {
        let rows = self.summaries.list_summaries(limit).await?;
        Ok(rows.iter().map(SessionSummaryListItem::from_row).collect())
    }
}
