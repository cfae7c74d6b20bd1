//! Ad hoc crawl requests outside the timer cadence.
//!
//! [`CrawlQueue`] is the producer half of a bounded channel; [`CrawlWorker`]
//! drains it. A job naming a source fetches only that source; a job without
//! one triggers a full run through the single-flight guard.

use newswire_core::{CrawlJob, FetchOutcome};
use newswire_feeds::FeedReader;
use newswire_summarizer::CompletionProvider;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::scheduler::{RunController, TickResult, Trigger};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("crawl queue is full")]
    Full,

    #[error("crawl worker has stopped")]
    Closed,
}

/// Producer handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CrawlQueue {
    tx: mpsc::Sender<CrawlJob>,
}

impl CrawlQueue {
    /// A queue with room for `capacity` pending jobs (at least 1), and the
    /// receiver to hand to [`CrawlWorker::new`].
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<CrawlJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue a crawl, waiting for room if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the worker has stopped.
    pub async fn enqueue(&self, job: CrawlJob) -> Result<(), QueueError> {
        self.tx.send(job).await.map_err(|_| QueueError::Closed)
    }

    /// Enqueue without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] or [`QueueError::Closed`].
    pub fn try_enqueue(&self, job: CrawlJob) -> Result<(), QueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// What a single crawl job did.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlResult {
    Source {
        source_id: String,
        outcome: FetchOutcome,
    },
    Full(TickResult),
    UnknownSource(String),
}

pub struct CrawlWorker<R, P> {
    controller: RunController<R, P>,
    rx: mpsc::Receiver<CrawlJob>,
}

impl<R: FeedReader, P: CompletionProvider> CrawlWorker<R, P> {
    pub fn new(controller: RunController<R, P>, rx: mpsc::Receiver<CrawlJob>) -> Self {
        Self { controller, rx }
    }

    /// Execute one job.
    pub async fn handle(&self, job: CrawlJob) -> CrawlResult {
        let Some(source_id) = job.source_id else {
            return CrawlResult::Full(self.controller.tick(Trigger::Manual).await);
        };

        match self.controller.service().crawl(&source_id).await {
            Some(outcome) => {
                match &outcome {
                    FetchOutcome::Ok(items) => tracing::info!(
                        source_id = %source_id,
                        count = items.len(),
                        placeholders = items.iter().filter(|i| i.placeholder).count(),
                        "crawl: source fetched"
                    ),
                    FetchOutcome::Error { message, .. } => tracing::warn!(
                        source_id = %source_id,
                        error = %message,
                        "crawl: source failed"
                    ),
                }
                CrawlResult::Source { source_id, outcome }
            }
            None => {
                tracing::warn!(source_id = %source_id, "crawl: unknown source id; discarding job");
                CrawlResult::UnknownSource(source_id)
            }
        }
    }

    /// Drain the queue until every [`CrawlQueue`] handle is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            self.handle(job).await;
        }
        tracing::info!("crawl: queue closed; worker exiting");
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
