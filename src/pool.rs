//! Bounded-concurrency execution of independent units of work.
//!
//! [`BoundedWorkerPool::run`] takes a batch of inputs and a work function,
//! keeps at most `max_concurrent` invocations in flight, and returns exactly
//! one [`Outcome`] per input in submission order. Each invocation runs as its
//! own tokio task, so an error or a panic in one unit becomes a `Failure` for
//! that slot and never reaches sibling work or the caller.

use crate::error::{Error, Result};
use crate::outcome::{ErrorInfo, Outcome, Stage};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Completion counters for the batch currently running on a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

impl BatchProgress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

pub struct BoundedWorkerPool {
    stage: Stage,
    max_concurrent: usize,
    progress: watch::Sender<BatchProgress>,
}

impl BoundedWorkerPool {
    pub fn new(stage: Stage, max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(Error::Config(format!(
                "{} pool needs a concurrency cap of at least 1",
                stage
            )));
        }
        let (progress, _) = watch::channel(BatchProgress::default());
        Ok(Self {
            stage,
            max_concurrent,
            progress,
        })
    }

    /// A pool capped at the number of CPUs the process may use.
    pub fn unbounded(stage: Stage) -> Self {
        let max_concurrent = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let (progress, _) = watch::channel(BatchProgress::default());
        Self {
            stage,
            max_concurrent,
            progress,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Receives a fresh [`BatchProgress`] every time a unit of work finishes.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// Runs `work` over every item and waits for all of them to finish.
    ///
    /// The returned vector has the same length as `items` and `outcomes[i]`
    /// belongs to `items[i]`, whatever order the work completed in.
    pub async fn run<I, O, F, Fut>(&self, items: Vec<I>, work: F) -> Vec<Outcome<O>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<O, ErrorInfo>> + Send + 'static,
    {
        let total = items.len();
        self.progress.send_replace(BatchProgress {
            total,
            ..Default::default()
        });
        if total == 0 {
            return Vec::new();
        }

        log::debug!(
            "{} pool: running {} items, at most {} at a time",
            self.stage,
            total,
            self.max_concurrent
        );

        let stage = self.stage;
        let work = Arc::new(work);
        let mut slots: Vec<Option<Outcome<O>>> = (0..total).map(|_| None).collect();

        let mut completions = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| {
                let work = Arc::clone(&work);
                async move {
                    let started = Instant::now();
                    // The task is spawned only once this future is polled by
                    // buffer_unordered, which is what bounds concurrency.
                    let handle = tokio::spawn(async move { (*work)(item).await });
                    let outcome = match handle.await {
                        Ok(result) => Outcome::from(result),
                        Err(join_error) => {
                            let message = if join_error.is_panic() {
                                format!("unit of work panicked: {}", panic_message(join_error))
                            } else {
                                "unit of work was cancelled".to_string()
                            };
                            Outcome::Failure(ErrorInfo::new(stage, message, started.elapsed()))
                        }
                    };
                    (index, outcome)
                }
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((index, outcome)) = completions.next().await {
            if let Outcome::Failure(info) = &outcome {
                log::debug!("{} pool: item {} failed: {}", stage, index, info.message);
            }
            let failed = outcome.is_failure();
            self.progress.send_modify(|progress| {
                progress.completed += 1;
                if failed {
                    progress.failed += 1;
                }
            });
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Outcome::Failure(ErrorInfo::new(
                        stage,
                        "unit of work produced no outcome",
                        std::time::Duration::ZERO,
                    ))
                })
            })
            .collect()
    }
}

fn panic_message(join_error: tokio::task::JoinError) -> String {
    let payload = join_error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
