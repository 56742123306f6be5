use crate::config::ProcessSettings;
use crate::error::{Error, Result};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::outcome::{ErrorInfo, Outcome, Stage};
use crate::pool::{BatchProgress, BoundedWorkerPool};
use crate::selector::CssSelector;
use parking_lot::Mutex;
use select::document::Document;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Metrics key shared by every item of a processing run.
pub const PROCESSING_KEY: &str = "processing";

/// Title used when a document has no `<title>` element. A present title is
/// kept verbatim, even when blank.
pub const NO_TITLE: &str = "No title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedRecord {
    pub title: String,
    pub links: Vec<String>,
    pub text_content: String,
}

/// Parses batches of HTML payloads on the blocking thread pool.
pub struct Processor {
    pool: BoundedWorkerPool,
    metrics: Mutex<Arc<MetricsAggregator>>,
}

impl Processor {
    pub fn new(settings: &ProcessSettings) -> Result<Self> {
        let pool = match settings.concurrency {
            Some(max_concurrent) => BoundedWorkerPool::new(Stage::Process, max_concurrent)?,
            None => BoundedWorkerPool::unbounded(Stage::Process),
        };
        Ok(Self {
            pool,
            metrics: Mutex::new(Arc::new(MetricsAggregator::new())),
        })
    }

    pub async fn process_all(&self, contents: Vec<String>) -> Vec<Outcome<ProcessedRecord>> {
        let metrics = Arc::new(MetricsAggregator::new());
        *self.metrics.lock() = Arc::clone(&metrics);
        metrics.start_operation();

        log::info!(
            "Processing {} documents with up to {} workers",
            contents.len(),
            self.pool.max_concurrent()
        );

        self.pool
            .run(contents, move |html| {
                let metrics = Arc::clone(&metrics);
                async move { process_one(&metrics, html).await }
            })
            .await
    }

    /// Summary of the most recent [`process_all`](Self::process_all) run.
    pub fn metrics_summary(&self) -> MetricsSnapshot {
        self.metrics.lock().summary()
    }

    pub fn watch_progress(&self) -> watch::Receiver<BatchProgress> {
        self.pool.subscribe()
    }
}

async fn process_one(
    metrics: &MetricsAggregator,
    html: String,
) -> std::result::Result<ProcessedRecord, ErrorInfo> {
    process_with(metrics, html, extract_record).await
}

/// Runs `extract` on the blocking pool. The parser accepts any input, so the
/// only failure is the parser itself aborting.
async fn process_with(
    metrics: &MetricsAggregator,
    html: String,
    extract: fn(&str) -> ProcessedRecord,
) -> std::result::Result<ProcessedRecord, ErrorInfo> {
    let start = Instant::now();
    let bytes = html.len() as u64;

    let result = tokio::task::spawn_blocking(move || extract(&html))
        .await
        .map_err(|join_error| Error::Parse(format!("parser aborted: {}", join_error)));
    let duration = start.elapsed();

    match result {
        Ok(record) => {
            metrics.record_success(PROCESSING_KEY, duration, bytes);
            Ok(record)
        }
        Err(e) => {
            metrics.record_failure(PROCESSING_KEY, duration);
            log::warn!("Failed to process document: {}", e);
            Err(ErrorInfo::new(Stage::Process, e.to_string(), duration))
        }
    }
}

/// Extracts the title, every `a[href]` target and the heading/paragraph text
/// of one HTML document, all in document order.
///
/// Empty and plain-text payloads parse like any other document and yield a
/// record with [`NO_TITLE`] and no links.
pub fn extract_record(html: &str) -> ProcessedRecord {
    let document = Document::from(html);

    let title_selector = CssSelector::tag("title");
    let link_selector = CssSelector::links();
    let text_selector = CssSelector::text_blocks();
    log::debug!(
        "Extracting {} / {} / {} from {} bytes",
        title_selector.to_css_string(),
        link_selector.to_css_string(),
        text_selector.to_css_string(),
        html.len()
    );

    let title = document
        .find(title_selector)
        .next()
        .map(|node| node.text())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let links = document
        .find(link_selector)
        .filter_map(|node| node.attr("href"))
        .map(String::from)
        .collect();

    let text_content = document
        .find(text_selector)
        .map(|node| node.text())
        .collect::<Vec<String>>()
        .join(" ");

    ProcessedRecord {
        title,
        links,
        text_content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> Processor {
        Processor::new(&ProcessSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_content_processing() {
        let processor = processor();
        let html = "<html><head><title>T</title></head><body><p>Hi</p><a href='x'>l</a></body></html>";

        let results = processor.process_all(vec![html.to_string()]).await;
        assert_eq!(results.len(), 1);

        let record = results[0].success().unwrap();
        assert_eq!(record.title, "T");
        assert_eq!(record.links, vec!["x".to_string()]);
        assert!(record.text_content.contains("Hi"));

        let summary = processor.metrics_summary();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.total_bytes, html.len() as u64);
        assert!(summary.per_key_duration.contains_key(PROCESSING_KEY));
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let record = extract_record("<html><body><h1>Heading</h1></body></html>");
        assert_eq!(record.title, NO_TITLE);
        assert_eq!(record.text_content, "Heading");
    }

    #[test]
    fn test_title_text_is_kept_verbatim() {
        let record = extract_record("<title>  Padded Title </title><p>x</p>");
        assert_eq!(record.title, "  Padded Title ");

        let record = extract_record("<title></title><p>x</p>");
        assert_eq!(record.title, "");
    }

    #[test]
    fn test_links_keep_document_order_and_duplicates() {
        let record = extract_record(
            r#"<body>
                <a href="/b">b</a>
                <a>no target</a>
                <div><a href="/a">a</a></div>
                <a href="/b">b again</a>
                <a href="">empty</a>
            </body>"#,
        );
        assert_eq!(record.links, vec!["/b", "/a", "/b", ""]);
    }

    #[test]
    fn test_text_blocks_joined_in_document_order() {
        let record = extract_record(
            "<h2>Second level</h2><p>First para</p><div>ignored</div><h6>Deep</h6><p>Last</p>",
        );
        assert_eq!(record.text_content, "Second level First para Deep Last");
    }

    #[test]
    fn test_empty_and_plain_text_payloads_yield_records() {
        for payload in ["", "  \n\t", "Hello world"] {
            let record = extract_record(payload);
            assert_eq!(record.title, NO_TITLE);
            assert!(record.links.is_empty());
            assert_eq!(record.text_content, "");
        }
    }

    #[tokio::test]
    async fn test_plain_and_empty_bodies_count_as_successes() {
        let processor = Processor::new(&ProcessSettings {
            concurrency: Some(2),
        })
        .unwrap();
        let contents = vec![
            "Hello world".to_string(),
            String::new(),
            "<p>ok</p>".to_string(),
        ];

        let results = processor.process_all(contents).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].success().map(|r| r.title.as_str()), Some(NO_TITLE));
        assert_eq!(results[1].success().map(|r| r.title.as_str()), Some(NO_TITLE));
        assert_eq!(results[2].success().map(|r| r.text_content.as_str()), Some("ok"));

        let summary = processor.metrics_summary();
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total_bytes, ("Hello world".len() + "<p>ok</p>".len()) as u64);
        // Every item shares one metrics key.
        assert_eq!(summary.per_key_duration.len(), 1);
    }

    fn exploding_parser(html: &str) -> ProcessedRecord {
        if html.contains("explode") {
            panic!("parser blew up");
        }
        extract_record(html)
    }

    #[tokio::test]
    async fn test_aborted_parser_is_a_process_failure() {
        let metrics = MetricsAggregator::new();
        metrics.start_operation();

        let ok = process_with(&metrics, "<title>fine</title>".to_string(), exploding_parser).await;
        assert_eq!(ok.map(|r| r.title), Ok("fine".to_string()));

        let failed = process_with(&metrics, "<p>explode</p>".to_string(), exploding_parser).await;
        let info = failed.unwrap_err();
        assert_eq!(info.stage, Stage::Process);
        assert!(info.message.contains("parser aborted"));

        let summary = metrics.summary();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_bytes, "<title>fine</title>".len() as u64);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let processor = processor();
        assert!(processor.process_all(Vec::new()).await.is_empty());

        let summary = processor.metrics_summary();
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.to_string(), "No requests processed");
    }

    #[tokio::test]
    async fn test_each_run_gets_fresh_metrics() {
        let processor = processor();
        processor.process_all(vec!["<p>a</p>".to_string(); 3]).await;
        assert_eq!(processor.metrics_summary().successful, 3);

        processor.process_all(vec!["<p>b</p>".to_string()]).await;
        assert_eq!(processor.metrics_summary().successful, 1);
    }
}
