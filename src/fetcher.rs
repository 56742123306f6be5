use crate::config::FetchSettings;
use crate::error::{Error, Result};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::outcome::{ErrorInfo, Outcome, Stage};
use crate::pool::{BatchProgress, BoundedWorkerPool};
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// One successfully retrieved page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub status: u16,
    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub content: String,
    /// Body exactly as received.
    pub body: Vec<u8>,
}

impl FetchResult {
    /// Raw body length before UTF-8 decoding.
    pub fn bytes(&self) -> u64 {
        self.body.len() as u64
    }
}

/// Retrieves batches of URLs with a fixed concurrency cap.
pub struct Fetcher {
    client: Client,
    pool: BoundedWorkerPool,
    metrics: Mutex<Arc<MetricsAggregator>>,
}

impl Fetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Self::with_client(client, settings.concurrency)
    }

    pub fn with_client(client: Client, max_concurrent: usize) -> Result<Self> {
        Ok(Self {
            client,
            pool: BoundedWorkerPool::new(Stage::Fetch, max_concurrent)?,
            metrics: Mutex::new(Arc::new(MetricsAggregator::new())),
        })
    }

    /// GETs every URL and returns one outcome per URL, in input order.
    pub async fn fetch_all(&self, urls: Vec<String>) -> Vec<Outcome<FetchResult>> {
        let metrics = Arc::new(MetricsAggregator::new());
        *self.metrics.lock() = Arc::clone(&metrics);
        metrics.start_operation();

        log::info!(
            "Fetching {} URLs with up to {} concurrent requests",
            urls.len(),
            self.pool.max_concurrent()
        );

        let client = self.client.clone();
        self.pool
            .run(urls, move |url| {
                let client = client.clone();
                let metrics = Arc::clone(&metrics);
                async move { fetch_one(&client, &metrics, url).await }
            })
            .await
    }

    /// Summary of the most recent [`fetch_all`](Self::fetch_all) run.
    pub fn metrics_summary(&self) -> MetricsSnapshot {
        self.metrics.lock().summary()
    }

    pub fn watch_progress(&self) -> watch::Receiver<BatchProgress> {
        self.pool.subscribe()
    }
}

async fn fetch_one(
    client: &Client,
    metrics: &MetricsAggregator,
    url: String,
) -> std::result::Result<FetchResult, ErrorInfo> {
    log::debug!("Visiting: {}", url);
    let start = Instant::now();

    match retrieve(client, &url).await {
        Ok((status, body)) => {
            let duration = start.elapsed();
            let page = FetchResult {
                content: String::from_utf8_lossy(&body).into_owned(),
                url,
                status,
                body,
            };
            metrics.record_success(page.url.as_str(), duration, page.bytes());
            log::debug!("Fetched {} ({} bytes in {:.2?})", page.url, page.bytes(), duration);

            Ok(page)
        }
        Err(e) => {
            let duration = start.elapsed();
            metrics.record_failure(url.as_str(), duration);
            log::warn!("Failed to fetch {}: {}", url, e);
            Err(ErrorInfo::new(Stage::Fetch, format!("{}: {}", url, e), duration))
        }
    }
}

async fn retrieve(client: &Client, url: &str) -> Result<(u16, Vec<u8>)> {
    let res = client.get(url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(Error::HttpStatus(status));
    }
    let body = res.bytes().await?;
    Ok((status.as_u16(), body.to_vec()))
}
