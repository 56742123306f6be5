pub mod config;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod outcome;
pub mod output;
pub mod pool;
pub mod processor;
pub mod selector;

pub use error::{Error, Result};
pub use fetcher::{FetchResult, Fetcher};
pub use metrics::aggregator::MetricsAggregator;
pub use metrics::snapshot::MetricsSnapshot;
pub use outcome::{ErrorInfo, Outcome, Stage};
pub use pool::{BatchProgress, BoundedWorkerPool};
pub use processor::{ProcessedRecord, Processor};
