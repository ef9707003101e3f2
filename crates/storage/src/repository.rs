use async_trait::async_trait;
use exam_core::model::{ResultRecord, SessionSummary};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),
}

/// Storage identifier for a recorded session summary.
pub type SessionSummaryId = i64;

/// A summary together with its storage identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryRow {
    pub id: SessionSummaryId,
    pub summary: SessionSummary,
}

/// Append-only log of answered questions across every session of the process.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append one result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_result(&self, record: &ResultRecord) -> Result<(), StorageError>;

    /// Every stored result in the order it was appended.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the log cannot be read.
    async fn list_results(&self) -> Result<Vec<ResultRecord>, StorageError>;
}

#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// Store a completed session summary and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, summary: &SessionSummary)
    -> Result<SessionSummaryId, StorageError>;

    /// Most recent summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summaries cannot be read.
    async fn list_summaries(&self, limit: u32) -> Result<Vec<SessionSummaryRow>, StorageError>;
}

/// Process-lifetime repository; nothing survives a restart.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    results: Arc<Mutex<Vec<ResultRecord>>>,
    summaries: Arc<Mutex<Vec<SessionSummaryRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_result(&self, record: &ResultRecord) -> Result<(), StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(record.clone());
        Ok(())
    }

    async fn list_results(&self) -> Result<Vec<ResultRecord>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(
        &self,
        summary: &SessionSummary,
    ) -> Result<SessionSummaryId, StorageError> {
        let mut guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(SessionSummaryRow {
            id,
            summary: summary.clone(),
        });
        Ok(id)
    }

    async fn list_summaries(&self, limit: u32) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

/// Aggregates the history repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
    pub session_summaries: Arc<dyn SessionSummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let history: Arc<dyn HistoryRepository> = Arc::new(repo.clone());
        let session_summaries: Arc<dyn SessionSummaryRepository> = Arc::new(repo);
        Self {
            history,
            session_summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use exam_core::model::{Category, QuestionId, SessionTiming};
    use exam_core::time::fixed_now;

    fn result(id: u64, correct: bool) -> ResultRecord {
        ResultRecord {
            question_id: QuestionId::new(id),
            category: Category::Systems,
            question_text: format!("Q{id}"),
            was_correct: correct,
            answered_at: fixed_now(),
            answer_time: Duration::seconds(3),
        }
    }

    fn summary(minutes: i64) -> SessionSummary {
        let timing = SessionTiming {
            started_at: fixed_now(),
            completed_at: fixed_now() + Duration::minutes(minutes),
            time_spent: Duration::minutes(minutes),
            time_limit: Duration::minutes(30),
            timed_out: false,
        };
        SessionSummary::from_results(timing, &[result(1, true)]).unwrap()
    }

    #[tokio::test]
    async fn results_keep_append_order() {
        let repo = InMemoryRepository::new();
        repo.append_result(&result(1, true)).await.unwrap();
        repo.append_result(&result(2, false)).await.unwrap();

        let results = repo.list_results().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].question_id, QuestionId::new(1));
        assert!(!results[1].was_correct);
    }

    #[tokio::test]
    async fn summaries_list_newest_first() {
        let repo = InMemoryRepository::new();
        let first = repo.append_summary(&summary(5)).await.unwrap();
        let second = repo.append_summary(&summary(7)).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let rows = repo.list_summaries(10).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), [2, 1]);
        assert_eq!(repo.list_summaries(1).await.unwrap().len(), 1);
        assert_eq!(rows[1].summary, summary(5));
    }

    #[tokio::test]
    async fn storage_clones_share_history() {
        let storage = Storage::in_memory();
        let other = storage.clone();
        storage.history.append_result(&result(1, true)).await.unwrap();
        assert_eq!(other.history.list_results().await.unwrap().len(), 1);
    }
}
