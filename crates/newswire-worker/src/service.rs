//! The call-contract facade: aggregate, summarize, chat.
//!
//! Every failure reaches the caller as data (`status: "failure"` or an
//! `{"error": ..}` payload); nothing here returns `Err`.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use newswire_core::{
    AggregateResult, AppConfig, FeedItem, FetchOutcome, SourceFailure, SourceRegistry,
};
use newswire_feeds::{
    AggregateError, AggregateQuery, Aggregator, FallbackFetch, FeedError, FeedReader, Fetcher,
    HttpFeedReader,
};
use newswire_summarizer::{CompletionProvider, OpenAiProvider, SummarizerClient, SummarizerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size when a request does not name one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Items summarized concurrently when a request asks for AI summaries.
const SUMMARY_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("feed client setup failed: {0}")]
    Feed(#[from] FeedError),

    #[error("summarizer setup failed: {0}")]
    Summarizer(#[from] SummarizerError),
}

/// Input to [`NewsService::aggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    #[serde(default)]
    pub category: Option<String>,
    /// Case-insensitive substring of the source URL.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_page_size")]
    pub limit: usize,
    #[serde(default)]
    pub include_summaries: bool,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for AggregateRequest {
    fn default() -> Self {
        Self {
            category: None,
            source: None,
            limit: DEFAULT_PAGE_SIZE,
            include_summaries: false,
        }
    }
}

impl AggregateRequest {
    /// Filtered lookup without AI summaries.
    #[must_use]
    pub fn search(category: Option<String>, source: Option<String>) -> Self {
        Self {
            category,
            source,
            ..Self::default()
        }
    }

    /// Every source, no summaries.
    #[must_use]
    pub fn refresh() -> Self {
        Self::default()
    }

    /// Every source, with AI summaries.
    #[must_use]
    pub fn update() -> Self {
        Self {
            include_summaries: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub status: ResponseStatus,
    pub items: Vec<FeedItem>,
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AggregateResponse {
    fn success(result: AggregateResult) -> Self {
        Self {
            status: ResponseStatus::Success,
            items: result.items,
            total: result.total,
            success_count: result.success_count,
            error_count: result.error_count,
            errors: result.errors,
            message: None,
        }
    }

    fn failure(err: AggregateError) -> Self {
        let message = err.to_string();
        let AggregateError::AllSourcesFailed {
            attempted,
            failures,
        } = err;
        Self {
            status: ResponseStatus::Failure,
            items: Vec::new(),
            total: 0,
            success_count: 0,
            error_count: attempted,
            errors: failures,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummarizeResponse {
    Summary { summary: String },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Reply { reply: String },
    Error { error: String },
}

/// Owns the registry, the aggregator, and the summarizer for one process.
#[derive(Debug)]
pub struct NewsService<R = HttpFeedReader, P = OpenAiProvider> {
    registry: Arc<SourceRegistry>,
    aggregator: Aggregator<R>,
    summarizer: SummarizerClient<P>,
    default_limit: usize,
    deadline: Option<Duration>,
}

impl NewsService<HttpFeedReader, OpenAiProvider> {
    /// Wire the production reader and provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if an HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        registry: Arc<SourceRegistry>,
    ) -> Result<Self, ServiceError> {
        let reader = HttpFeedReader::new(&config.user_agent, config.fetch_timeout)?;
        let fallback = config
            .fallback_enabled
            .then(|| FallbackFetch::new(config.fallback_count));
        let fetcher = Fetcher::new(reader, registry.categories().to_vec())
            .with_fallback(fallback)
            .with_timeout(config.fetch_timeout);
        let aggregator = Aggregator::new(fetcher, config.fetch_max_concurrent);
        let summarizer = SummarizerClient::from_settings(&config.ai)?;

        Ok(Self::new(registry, aggregator, summarizer)
            .with_default_limit(config.default_limit)
            .with_deadline(config.aggregate_deadline))
    }
}

impl<R: FeedReader, P: CompletionProvider> NewsService<R, P> {
    pub fn new(
        registry: Arc<SourceRegistry>,
        aggregator: Aggregator<R>,
        summarizer: SummarizerClient<P>,
    ) -> Self {
        Self {
            registry,
            aggregator,
            summarizer,
            default_limit: DEFAULT_PAGE_SIZE,
            deadline: None,
        }
    }

    /// Page size used by scheduled full runs.
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    /// Caller-side deadline applied to every aggregate pass.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Aggregate across the registry and optionally attach AI summaries.
    pub async fn aggregate(&self, request: &AggregateRequest) -> AggregateResponse {
        let query = AggregateQuery::new(request.limit)
            .with_category(request.category.clone())
            .with_domain(request.source.clone())
            .with_deadline(self.deadline);

        match self.aggregator.aggregate(self.registry.sources(), &query).await {
            Ok(mut result) => {
                if request.include_summaries {
                    self.attach_summaries(&mut result.items).await;
                }
                AggregateResponse::success(result)
            }
            Err(e) => AggregateResponse::failure(e),
        }
    }

    /// Full unfiltered pass at the default page size. Used by scheduled runs.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::AllSourcesFailed`] if every source errored.
    pub async fn run_all(&self) -> Result<AggregateResult, AggregateError> {
        let query = AggregateQuery::new(self.default_limit).with_deadline(self.deadline);
        self.aggregator.aggregate(self.registry.sources(), &query).await
    }

    /// Fetch one source by slug or URL. `None` if no such source exists.
    pub async fn crawl(&self, source_id: &str) -> Option<FetchOutcome> {
        let source = self.registry.find(source_id)?;
        Some(
            self.aggregator
                .fetcher()
                .fetch(source, self.default_limit)
                .await,
        )
    }

    pub async fn summarize(&self, content: &str) -> SummarizeResponse {
        if content.trim().is_empty() {
            return SummarizeResponse::Error {
                error: "content must not be empty".to_string(),
            };
        }
        match self.summarizer.summarize(content).await {
            Ok(summary) => SummarizeResponse::Summary { summary },
            Err(e) => {
                tracing::warn!(error = %e, "summarize failed");
                SummarizeResponse::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    pub async fn chat(&self, message: &str) -> ChatResponse {
        if message.trim().is_empty() {
            return ChatResponse::Error {
                error: "message must not be empty".to_string(),
            };
        }
        match self.summarizer.chat(message).await {
            Ok(reply) => ChatResponse::Reply { reply },
            Err(e) => {
                tracing::warn!(error = %e, "chat failed");
                ChatResponse::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Fill `ai_summary` for real items. Placeholders are skipped and a
    /// failed summary leaves the field empty.
    async fn attach_summaries(&self, items: &mut [FeedItem]) {
        if !self.summarizer.is_configured() {
            tracing::info!("AI summaries requested but no provider is configured; skipping");
            return;
        }

        let prompts: Vec<Option<(String, String)>> = items
            .iter()
            .map(|item| {
                if item.placeholder {
                    return None;
                }
                let prompt = match item.summary.as_deref() {
                    Some(summary) => format!("{}\n\n{summary}", item.title),
                    None => item.title.clone(),
                };
                Some((prompt, item.link.clone()))
            })
            .collect();

        let summarizer = &self.summarizer;
        let summaries: Vec<Option<String>> = stream::iter(prompts)
            .map(|prompt| async move {
                let (prompt, link) = prompt?;
                match summarizer.summarize(&prompt).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        tracing::warn!(link = %link, error = %e, "item summary failed");
                        None
                    }
                }
            })
            .buffered(SUMMARY_CONCURRENCY)
            .collect()
            .await;

        for (item, summary) in items.iter_mut().zip(summaries) {
            item.ai_summary = summary;
        }
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
