use crate::metrics::snapshot::MetricsSnapshot;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Thread-safe accumulator of operation outcomes for one batch run.
///
/// Every field lives behind a single lock, so a recording call updates the
/// counters, the byte total and the per-key timing as one step and a
/// concurrent [`summary`](Self::summary) never observes a partial update.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    tally: Mutex<Tally>,
}

#[derive(Debug, Default)]
struct Tally {
    started: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    last_recorded: Option<Instant>,
    per_key_duration: BTreeMap<String, Duration>,
    successful: u64,
    failed: u64,
    total_bytes: u64,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of the batch. Only the first call has an effect.
    pub fn start_operation(&self) {
        let mut tally = self.tally.lock();
        if tally.started.is_none() {
            tally.started = Some(Instant::now());
            tally.started_at = Some(Utc::now());
        }
    }

    pub fn record_success(&self, key: impl Into<String>, duration: Duration, bytes: u64) {
        let key = key.into();
        let now = Instant::now();
        let mut tally = self.tally.lock();
        tally.successful += 1;
        tally.total_bytes += bytes;
        tally.per_key_duration.insert(key, duration);
        tally.last_recorded = Some(now);
    }

    pub fn record_failure(&self, key: impl Into<String>, duration: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut tally = self.tally.lock();
        tally.failed += 1;
        tally.per_key_duration.insert(key, duration);
        tally.last_recorded = Some(now);
    }

    /// Produces a consistent view of the batch.
    ///
    /// `average_duration` is the mean of the per-key timings. Keys are
    /// last-write-wins, so repeated keys contribute only their latest value.
    pub fn summary(&self) -> MetricsSnapshot {
        let tally = self.tally.lock();

        let average_duration = if tally.per_key_duration.is_empty() {
            Duration::ZERO
        } else {
            let sum: Duration = tally.per_key_duration.values().sum();
            sum / tally.per_key_duration.len() as u32
        };

        let span = match (tally.started, tally.last_recorded) {
            (Some(started), Some(last)) => last.saturating_duration_since(started),
            _ => Duration::ZERO,
        };

        MetricsSnapshot {
            total_requests: tally.successful + tally.failed,
            successful: tally.successful,
            failed: tally.failed,
            total_bytes: tally.total_bytes,
            average_duration,
            per_key_duration: tally.per_key_duration.clone(),
            started_at: tally.started_at,
            span,
        }
    }
}
