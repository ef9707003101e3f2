use chrono::{DateTime, Duration, Utc};

/// Elapsed-time accounting against a fixed budget.
///
/// There is no ticking task: elapsed time is recomputed from stored timestamps whenever it
/// is asked for. Time spent paused is never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimer {
    limit: Duration,
    accumulated: Duration,
    resumed_at: Option<DateTime<Utc>>,
}

impl SessionTimer {
    /// Start a running timer at `now`.
    #[must_use]
    pub fn start(limit: Duration, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            accumulated: Duration::zero(),
            resumed_at: Some(now),
        }
    }

    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.resumed_at.is_some()
    }

    /// Fold the running span into the accumulated total. No-op when already stopped.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let Some(resumed_at) = self.resumed_at.take() {
            self.accumulated += span(resumed_at, now);
        }
    }

    /// Restart the running span at `now`. No-op when already running.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(now);
        }
    }

    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.resumed_at {
            Some(resumed_at) => self.accumulated + span(resumed_at, now),
            None => self.accumulated,
        }
    }

    /// Budget left, floored at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.limit - self.elapsed(now)).max(Duration::zero())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.elapsed(now) >= self.limit
    }
}

// A clock that steps backwards contributes nothing rather than refunding time.
fn span(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).max(Duration::zero())
}
