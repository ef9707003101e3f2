use async_trait::async_trait;
use chrono::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use exam_core::model::{Category, ExamSettings, LabelSet, ResultRecord, SessionSummary};
use exam_core::time::fixed_clock;
use services::{
    HistoryService, Page, QuizEngine, QuizRequest, QuizSession, SessionError, SessionPhase,
};
use storage::repository::{
    HistoryRepository, InMemoryRepository, SessionSummaryId, SessionSummaryRepository,
    SessionSummaryRow, StorageError,
};
use storage::parse_bank;

const BANK: &str = "\u{feff}question,category,options,answer,explanation\n\
Max altitude?,規則,1. 150 m|2. 300 m|3. 500 m,a,Limit is 150 m\n\
Night flight needs?,Rules,approval|nothing|a badge,a,Approval is required\n\
Which sense position?,システム,a. GPS|b. IMU|c. Speaker,a&b,Both sense position\n\
Battery chemistry?,Systems,LiPo|Lead acid,a,\n\
Pre-flight check?,運航,\"props, battery|nothing\",a,\n\
Crosswind limit?,Operations,10 m/s|50 m/s|90 m/s,a,\n\
Bird strike risk?,リスク,low|high,b,\n\
Crowd overflight?,Risk,forbidden|fine|encouraged,a,\n";

fn correct_for_current(engine: &QuizEngine) -> LabelSet {
    engine
        .session()
        .and_then(QuizSession::current_question)
        .map(|q| q.correct_labels().clone())
        .unwrap()
}

fn engine_with(history: HistoryService) -> QuizEngine {
    let bank = Arc::new(parse_bank(BANK).unwrap());
    QuizEngine::new(bank, history, ExamSettings::default())
        .with_clock(fixed_clock())
        .with_seeds(7, 11)
}

#[tokio::test]
async fn full_quiz_run_accumulates_history_across_sessions() {
    let mut engine = engine_with(HistoryService::in_memory());

    let progress = engine.start_quiz(QuizRequest::balanced(8)).await.unwrap();
    assert_eq!(progress.total, 8);
    let limit = engine.snapshot().await.unwrap().time_limit.unwrap();
    assert_eq!(limit, Duration::seconds(8 * 36));

    while engine.phase() != SessionPhase::Completed {
        let snapshot = engine.snapshot().await.unwrap();
        assert_eq!(snapshot.page, Page::Quiz);
        let view = snapshot.question.unwrap();
        assert!(view.correct.is_none());

        engine.clock_mut().advance(Duration::seconds(10));
        let chosen = correct_for_current(&engine);
        assert_eq!(chosen.len(), view.required_selections);
        let check = engine.submit_answer(chosen).await.unwrap();
        assert!(check.was_correct);
        engine.advance(view.index).await.unwrap();
    }

    let snapshot = engine.snapshot().await.unwrap();
    assert_eq!(snapshot.page, Page::Results);
    let summary = snapshot.last_summary.unwrap();
    assert_eq!((summary.correct(), summary.total()), (8, 8));
    assert!(summary.passed(engine.settings().pass_threshold_percent()));
    assert_eq!(summary.time_spent(), Duration::seconds(80));
    for category in Category::ALL {
        assert_eq!(snapshot.stats.count_by_category[&category], 2);
        assert_eq!(snapshot.stats.accuracy_by_category[&category], 100.0);
    }

    engine
        .start_quiz(QuizRequest::focused(Category::Risk, 30))
        .await
        .unwrap();
    for _ in 0..2 {
        let question = engine
            .session()
            .and_then(QuizSession::current_question)
            .unwrap();
        assert_eq!(question.category(), Category::Risk);
        let wrong = question
            .options()
            .iter()
            .map(|option| option.label)
            .find(|label| !question.correct_labels().contains(*label))
            .map(LabelSet::single)
            .unwrap();
        engine.submit_answer(wrong).await.unwrap();
        engine.advance_current().await.unwrap();
    }

    let snapshot = engine.snapshot().await.unwrap();
    assert_eq!(snapshot.stats.total_answered, 10);
    assert_eq!(snapshot.stats.accuracy_by_category[&Category::Risk], 50.0);
    assert_eq!(snapshot.stats.recent_mistakes.len(), 2);
    let last = snapshot.last_summary.unwrap();
    assert_eq!(last.total(), 2);
    assert!(!last.passed(80));
    assert_eq!(last.correct_needed_to_pass(80), 2);

    let sessions = engine.history().recent_sessions(10).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].total, 2);
    assert_eq!(sessions[1].total, 8);
}

/// History repository whose appends can be switched to fail.
#[derive(Clone, Default)]
struct FlakyHistory {
    inner: InMemoryRepository,
    failing: Arc<AtomicBool>,
}

#[async_trait]
impl HistoryRepository for FlakyHistory {
    async fn append_result(&self, record: &ResultRecord) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk unplugged".into()));
        }
        self.inner.append_result(record).await
    }

    async fn list_results(&self) -> Result<Vec<ResultRecord>, StorageError> {
        self.inner.list_results().await
    }
}

#[tokio::test]
async fn failed_history_append_leaves_session_unchanged() {
    let flaky = FlakyHistory::default();
    let history = HistoryService::new(Arc::new(flaky.clone()), Arc::new(flaky.inner.clone()));
    let mut engine = engine_with(history);
    engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();

    let chosen = correct_for_current(&engine);
    engine.submit_answer(chosen).await.unwrap();

    flaky.failing.store(true, Ordering::SeqCst);
    let err = engine.advance(0).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(engine.phase(), SessionPhase::Reviewing);
    assert_eq!(engine.session().unwrap().current_index(), 0);
    assert!(engine.session().unwrap().results().is_empty());

    flaky.failing.store(false, Ordering::SeqCst);
    let step = engine.advance(0).await.unwrap();
    assert!(step.record.is_some());
    assert_eq!(engine.history().log().await.unwrap().len(), 1);
    assert_eq!(engine.session().unwrap().current_index(), 1);
}

/// Summary repository whose appends can be switched to fail.
#[derive(Clone, Default)]
struct FlakySummaries {
    inner: InMemoryRepository,
    failing: Arc<AtomicBool>,
}

#[async_trait]
impl SessionSummaryRepository for FlakySummaries {
    async fn append_summary(
        &self,
        summary: &SessionSummary,
    ) -> Result<SessionSummaryId, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk full".into()));
        }
        self.inner.append_summary(summary).await
    }

    async fn list_summaries(&self, limit: u32) -> Result<Vec<SessionSummaryRow>, StorageError> {
        self.inner.list_summaries(limit).await
    }
}

#[tokio::test]
async fn failed_summary_append_completes_quiz_and_retries() {
    let summaries = FlakySummaries::default();
    let history = HistoryService::new(
        Arc::new(summaries.inner.clone()),
        Arc::new(summaries.clone()),
    );
    let mut engine = engine_with(history);
    engine.start_quiz(QuizRequest::balanced(4)).await.unwrap();
    summaries.failing.store(true, Ordering::SeqCst);

    let mut last = None;
    while engine.phase() != SessionPhase::Completed {
        let chosen = correct_for_current(&engine);
        engine.submit_answer(chosen).await.unwrap();
        last = Some(engine.advance_current().await.unwrap());
    }

    let last = last.unwrap();
    assert!(last.is_complete);
    assert_eq!(last.summary.map(|s| s.correct()), Some(4));
    assert_eq!(last.summary_id, None);
    assert_eq!(engine.history().log().await.unwrap().len(), 4);
    assert!(engine.history().recent_sessions(10).await.unwrap().is_empty());

    summaries.failing.store(false, Ordering::SeqCst);
    let snapshot = engine.snapshot().await.unwrap();
    assert_eq!(snapshot.page, Page::Results);
    assert_eq!(snapshot.last_summary.map(|s| s.total()), Some(4));
    let sessions = engine.history().recent_sessions(10).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].correct, 4);
}
