use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub total_bytes: u64,
    pub average_duration: Duration,
    pub per_key_duration: BTreeMap<String, Duration>,
    /// Wall-clock time the batch started, if it was started.
    pub started_at: Option<DateTime<Utc>>,
    /// Time from the batch start to the most recent recorded outcome.
    pub span: Duration,
}

impl MetricsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_requests == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests > 0 {
            (self.successful as f64 / self.total_requests as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn requests_per_second(&self) -> f64 {
        let secs = self.span.as_secs_f64();
        if secs > 0.0 {
            self.total_requests as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No requests processed");
        }
        write!(
            f,
            "Performance Summary:\n\
             Total Requests: {}\n\
             Successful: {}\n\
             Failed: {}\n\
             Average Duration: {:.2?}\n\
             Total Data: {} bytes",
            self.total_requests,
            self.successful,
            self.failed,
            self.average_duration,
            self.total_bytes
        )
    }
}
