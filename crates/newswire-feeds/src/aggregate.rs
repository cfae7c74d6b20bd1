//! Fan-out across sources and merge into one sorted page.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use newswire_core::{AggregateResult, FetchOutcome, Source, SourceFailure};
use thiserror::Error;
use tokio::time::Instant;

use crate::fetch::{FeedReader, Fetcher};

/// Default in-flight fetch cap.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

const DEADLINE_MESSAGE: &str = "aggregate deadline exceeded";

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("all {attempted} attempted sources failed")]
    AllSourcesFailed {
        attempted: usize,
        failures: Vec<SourceFailure>,
    },
}

/// Parameters for one aggregate pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateQuery {
    /// Page size, and the per-source fetch limit.
    pub limit: usize,
    pub category: Option<String>,
    /// Case-insensitive substring of the source URL.
    pub domain: Option<String>,
    /// Applies to the whole pass; stragglers are counted as errors.
    pub deadline: Option<Duration>,
}

impl AggregateQuery {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            category: None,
            domain: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Select the sources an aggregate pass should fetch.
///
/// A category keeps sources listing it (case-insensitive); an unknown
/// category selects nothing. A domain keeps sources whose URL contains it.
/// Blank filters are ignored.
#[must_use]
pub fn filter_sources<'a>(
    sources: &'a [Source],
    category: Option<&str>,
    domain: Option<&str>,
) -> Vec<&'a Source> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    let domain = domain
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty());

    sources
        .iter()
        .filter(|s| category.is_none_or(|c| s.has_category(c)))
        .filter(|s| {
            domain
                .as_deref()
                .is_none_or(|d| s.url.to_lowercase().contains(d))
        })
        .collect()
}

/// Merge per-source outcomes (in registry order) into one page.
///
/// Items are stable-sorted newest first with untimestamped items last, then
/// truncated to `limit`. `total` counts items before truncation.
///
/// # Errors
///
/// Returns [`AggregateError::AllSourcesFailed`] when at least one source was
/// attempted and none succeeded.
pub fn merge_outcomes(
    outcomes: Vec<FetchOutcome>,
    limit: usize,
) -> Result<AggregateResult, AggregateError> {
    let attempted = outcomes.len();
    let mut items = Vec::new();
    let mut errors = Vec::new();
    let mut success_count = 0;

    for outcome in outcomes {
        match outcome {
            FetchOutcome::Ok(batch) => {
                success_count += 1;
                items.extend(batch);
            }
            FetchOutcome::Error {
                source_domain,
                message,
            } => errors.push(SourceFailure {
                source_domain,
                message,
            }),
        }
    }

    if attempted > 0 && success_count == 0 {
        return Err(AggregateError::AllSourcesFailed {
            attempted,
            failures: errors,
        });
    }

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let total = items.len();
    items.truncate(limit.max(1));

    Ok(AggregateResult {
        items,
        total,
        success_count,
        error_count: errors.len(),
        errors,
    })
}

/// Fetches every selected source in parallel on a bounded pool.
#[derive(Debug, Clone)]
pub struct Aggregator<R> {
    fetcher: Fetcher<R>,
    max_concurrent: usize,
}

impl<R: FeedReader> Aggregator<R> {
    pub fn new(fetcher: Fetcher<R>, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
        }
    }

    #[must_use]
    pub fn fetcher(&self) -> &Fetcher<R> {
        &self.fetcher
    }

    /// Run one aggregate pass over `sources`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::AllSourcesFailed`] if every selected source
    /// produced an error outcome.
    pub async fn aggregate(
        &self,
        sources: &[Source],
        query: &AggregateQuery,
    ) -> Result<AggregateResult, AggregateError> {
        let selected = filter_sources(sources, query.category.as_deref(), query.domain.as_deref());
        if selected.is_empty() {
            tracing::debug!(
                category = ?query.category,
                domain = ?query.domain,
                "no sources matched aggregate filters"
            );
            return Ok(AggregateResult::default());
        }

        let pool = self.max_concurrent.min(selected.len());
        let deadline = query.deadline.map(|d| Instant::now() + d);
        let limit = query.limit.max(1);

        // Each fetch future owns its source so the whole pass stays `Send`.
        let owned: Vec<Source> = selected.into_iter().cloned().collect();
        let mut outcomes: Vec<(usize, FetchOutcome)> = stream::iter(owned.into_iter().enumerate())
            .map(|(idx, source)| async move {
                let fetch = self.fetcher.fetch(&source, limit);
                let outcome = match deadline {
                    Some(at) => tokio::time::timeout_at(at, fetch).await.unwrap_or_else(|_| {
                        tracing::warn!(source = %source.label(), "abandoned at aggregate deadline");
                        FetchOutcome::Error {
                            source_domain: source.label(),
                            message: DEADLINE_MESSAGE.to_string(),
                        }
                    }),
                    None => fetch.await,
                };
                (idx, outcome)
            })
            .buffer_unordered(pool)
            .collect()
            .await;
        outcomes.sort_by_key(|(idx, _)| *idx);

        let result = merge_outcomes(outcomes.into_iter().map(|(_, o)| o).collect(), limit);
        match &result {
            Ok(page) => {
                if page.error_count > 0 {
                    tracing::warn!(
                        failed = page.error_count,
                        attempted = page.attempted(),
                        "some sources failed during aggregate"
                    );
                }
                tracing::info!(
                    total = page.total,
                    returned = page.items.len(),
                    succeeded = page.success_count,
                    "aggregate complete"
                );
            }
            Err(e) => tracing::error!(error = %e, "aggregate failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
