use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage a unit of work belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Network retrieval: connect errors, timeouts, non-2xx statuses.
    Fetch,
    /// HTML parsing of an already retrieved payload.
    Process,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Process => write!(f, "process"),
        }
    }
}

/// Structured description of one failed unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed after {elapsed:.2?}: {message}")]
pub struct ErrorInfo {
    pub message: String,
    pub stage: Stage,
    pub elapsed: Duration,
}

impl ErrorInfo {
    pub fn new(stage: Stage, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            message: message.into(),
            stage,
            elapsed,
        }
    }
}

/// Result of one submitted work item.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<O> {
    Success(O),
    Failure(ErrorInfo),
}

impl<O> Outcome<O> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn success(&self) -> Option<&O> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(info) => Some(info),
        }
    }

    pub fn ok(self) -> Option<O> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<O, ErrorInfo> {
        self.into()
    }
}

impl<O> From<std::result::Result<O, ErrorInfo>> for Outcome<O> {
    fn from(result: std::result::Result<O, ErrorInfo>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(info) => Outcome::Failure(info),
        }
    }
}

impl<O> From<Outcome<O>> for std::result::Result<O, ErrorInfo> {
    fn from(outcome: Outcome<O>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(info) => Err(info),
        }
    }
}

/// Counts `(successes, failures)` in a batch of outcomes.
pub fn tally<O>(outcomes: &[Outcome<O>]) -> (usize, usize) {
    let successes = outcomes.iter().filter(|o| o.is_success()).count();
    (successes, outcomes.len() - successes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_conversions() {
        let ok: Outcome<u32> = Ok(7).into();
        assert!(ok.is_success());
        assert_eq!(ok.success(), Some(&7));
        assert_eq!(ok.into_result(), Ok(7));

        let info = ErrorInfo::new(Stage::Fetch, "connection refused", Duration::from_millis(5));
        let failed: Outcome<u32> = Err(info.clone()).into();
        assert!(failed.is_failure());
        assert_eq!(failed.failure(), Some(&info));
        assert_eq!(failed.ok(), None);
    }

    #[test]
    fn test_tally() {
        let outcomes = vec![
            Outcome::Success(1),
            Outcome::Failure(ErrorInfo::new(Stage::Process, "bad", Duration::ZERO)),
            Outcome::Success(3),
        ];
        assert_eq!(tally(&outcomes), (2, 1));
        assert_eq!(tally::<u8>(&[]), (0, 0));
    }

    #[test]
    fn test_error_info_display() {
        let info = ErrorInfo::new(Stage::Fetch, "HTTP status 404 Not Found", Duration::from_secs(1));
        let rendered = info.to_string();
        assert!(rendered.starts_with("fetch failed after"));
        assert!(rendered.ends_with("HTTP status 404 Not Found"));
    }
}
