//! Periodic full aggregate runs with a single-flight guard.
//!
//! [`RunController`] owns the guard and the latest-run channel and is shared
//! by the timer job and the ad hoc crawl worker. [`Scheduler`] registers the
//! timer job with `tokio-cron-scheduler`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use newswire_core::AggregateResult;
use newswire_feeds::FeedReader;
use newswire_summarizer::CompletionProvider;
use serde::Serialize;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::service::NewsService;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Timer,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Success { result: AggregateResult },
    Failure { message: String },
}

/// Summary of one completed full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickResult {
    /// A run was already in flight; this tick was dropped.
    Skipped,
    Completed(RunReport),
}

/// At most one holder at a time. Acquisition never waits.
#[derive(Debug, Default)]
pub struct SingleFlight {
    running: AtomicBool,
}

impl SingleFlight {
    /// Claim the flag, or `None` if it is already held.
    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flight: self })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Returns the flag to idle on drop, including on panic or cancellation.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.running.store(false, Ordering::Release);
    }
}

/// Runs full aggregate passes under the single-flight guard and publishes
/// each report.
pub struct RunController<R, P> {
    service: Arc<NewsService<R, P>>,
    flight: Arc<SingleFlight>,
    reports: Arc<watch::Sender<Option<RunReport>>>,
}

impl<R, P> Clone for RunController<R, P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            flight: Arc::clone(&self.flight),
            reports: Arc::clone(&self.reports),
        }
    }
}

impl<R: FeedReader, P: CompletionProvider> RunController<R, P> {
    pub fn new(service: Arc<NewsService<R, P>>) -> Self {
        let (reports, _) = watch::channel(None);
        Self {
            service,
            flight: Arc::new(SingleFlight::default()),
            reports: Arc::new(reports),
        }
    }

    #[must_use]
    pub fn service(&self) -> &NewsService<R, P> {
        &self.service
    }

    /// Receiver that always holds the most recent report.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<RunReport>> {
        self.reports.subscribe()
    }

    #[must_use]
    pub fn latest(&self) -> Option<RunReport> {
        self.reports.borrow().clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flight.is_running()
    }

    /// Run one full pass unless one is already in progress.
    pub async fn tick(&self, trigger: Trigger) -> TickResult {
        let Some(_guard) = self.flight.try_acquire() else {
            tracing::info!(?trigger, "scheduler: previous run still in progress; skipping tick");
            return TickResult::Skipped;
        };

        tracing::info!(?trigger, "scheduler: starting full aggregate run");
        let started_at = Utc::now();
        let outcome = match self.service.run_all().await {
            Ok(result) => {
                tracing::info!(
                    total = result.total,
                    succeeded = result.success_count,
                    failed = result.error_count,
                    "scheduler: full aggregate run complete"
                );
                RunOutcome::Success { result }
            }
            Err(e) => {
                tracing::error!(error = %e, "scheduler: full aggregate run failed");
                RunOutcome::Failure {
                    message: e.to_string(),
                }
            }
        };

        let report = RunReport {
            trigger,
            started_at,
            finished_at: Utc::now(),
            outcome,
        };
        self.reports.send_replace(Some(report.clone()));
        TickResult::Completed(report)
    }
}

/// Handle to the running timer job.
pub struct Scheduler {
    jobs: JobScheduler,
}

impl Scheduler {
    /// Register the repeating full-run job and start the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
    /// the job cannot be registered, or the scheduler fails to start.
    pub async fn start<R, P>(
        controller: RunController<R, P>,
        interval: Duration,
    ) -> Result<Self, JobSchedulerError>
    where
        R: FeedReader + 'static,
        P: CompletionProvider + 'static,
    {
        let jobs = JobScheduler::new().await?;

        let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
            let controller = controller.clone();
            Box::pin(async move {
                controller.tick(Trigger::Timer).await;
            })
        })?;

        jobs.add(job).await?;
        jobs.start().await?;
        tracing::info!(interval_secs = interval.as_secs(), "scheduler: registered full-run job");
        Ok(Self { jobs })
    }

    /// Stop the timer job.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler fails to shut down.
    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.jobs.shutdown().await?;
        tracing::info!("scheduler: stopped");
        Ok(())
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
