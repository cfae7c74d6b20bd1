//! Per-source fetching with placeholder fallback.
//!
//! [`FeedReader`] is the real attempt (HTTP + feed parsing); [`Fetcher`]
//! wraps it with a per-fetch timeout and decides, from the outcome, whether
//! to categorize real entries, synthesize placeholders, or report an error.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use feed_rs::model::Entry;
use newswire_core::{CategoryRule, FetchOutcome, Source};
use url::Url;

use crate::categorize::{assign_category, categorize};
use crate::error::FeedError;
use crate::fallback::FallbackFetch;

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Feeds larger than this are rejected before parsing.
const MAX_FEED_BYTES: u64 = 5 * 1024 * 1024;

const MAX_REDIRECTS: usize = 5;

/// Reads and parses the entries of one feed.
pub trait FeedReader: Send + Sync {
    fn read(&self, url: &str) -> impl Future<Output = Result<Vec<Entry>, FeedError>> + Send;
}

/// [`FeedReader`] over `reqwest` and `feed-rs`.
#[derive(Debug, Clone)]
pub struct HttpFeedReader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpFeedReader {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_bytes: MAX_FEED_BYTES,
        })
    }
}

impl FeedReader for HttpFeedReader {
    async fn read(&self, url: &str) -> Result<Vec<Entry>, FeedError> {
        let parsed = validate_feed_url(url)?;
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(FeedError::TooLarge {
                    url: url.to_string(),
                    bytes: len,
                });
            }
        }

        let bytes = response.bytes().await?;
        let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if len > self.max_bytes {
            return Err(FeedError::TooLarge {
                url: url.to_string(),
                bytes: len,
            });
        }

        let feed = feed_rs::parser::parse(&bytes[..])?;
        Ok(feed.entries)
    }
}

/// Parse `url` and require an `http`/`https` scheme with a host.
///
/// # Errors
///
/// Returns [`FeedError::InvalidUrl`] otherwise.
pub fn validate_feed_url(url: &str) -> Result<Url, FeedError> {
    let parsed = Url::parse(url).map_err(|e| FeedError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FeedError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(FeedError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(parsed)
}

/// Fetches one source at a time, never failing with `Err`.
#[derive(Debug, Clone)]
pub struct Fetcher<R> {
    reader: R,
    rules: Vec<CategoryRule>,
    fallback: Option<FallbackFetch>,
    timeout: Duration,
}

impl<R: FeedReader> Fetcher<R> {
    /// A fetcher with the default fallback and timeout.
    pub fn new(reader: R, rules: Vec<CategoryRule>) -> Self {
        Self {
            reader,
            rules,
            fallback: Some(FallbackFetch::default()),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// `None` disables placeholder fallback; masked failures become errors.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Option<FallbackFetch>) -> Self {
        self.fallback = fallback;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Fetch up to `limit` items from `source`. A zero limit is treated as 1.
    ///
    /// Empty feeds and recoverable failures (network, status, parse, timeout)
    /// are replaced by placeholder items when fallback is enabled. A malformed
    /// source URL is always an `Error` outcome.
    pub async fn fetch(&self, source: &Source, limit: usize) -> FetchOutcome {
        let limit = limit.max(1);
        let domain = source.label();

        if let Err(e) = validate_feed_url(&source.url) {
            tracing::warn!(source = %domain, error = %e, "skipping source with malformed url");
            return FetchOutcome::Error {
                source_domain: domain,
                message: e.to_string(),
            };
        }

        let result = match tokio::time::timeout(self.timeout, self.reader.read(&source.url)).await
        {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout {
                url: source.url.clone(),
                millis: self.timeout.as_millis(),
            }),
        };

        match result {
            Ok(entries) if !entries.is_empty() => {
                let items: Vec<_> = entries
                    .iter()
                    .take(limit)
                    .map(|entry| categorize(entry, source, &self.rules))
                    .collect();
                tracing::debug!(source = %domain, count = items.len(), "fetched feed");
                FetchOutcome::Ok(items)
            }
            Ok(_) => self.fall_back(source, domain, limit, "feed returned no entries"),
            Err(e) if e.is_recoverable() => self.fall_back(source, domain, limit, &e.to_string()),
            Err(e) => {
                tracing::warn!(source = %domain, error = %e, "feed fetch failed");
                FetchOutcome::Error {
                    source_domain: domain,
                    message: e.to_string(),
                }
            }
        }
    }

    fn fall_back(&self, source: &Source, domain: String, limit: usize, reason: &str) -> FetchOutcome {
        match self.fallback {
            Some(fallback) => {
                tracing::warn!(
                    source = %domain,
                    reason,
                    "real fetch yielded nothing; serving placeholders"
                );
                let category = assign_category(&domain, &self.rules);
                FetchOutcome::Ok(fallback.synthesize(source, category, limit, Utc::now()))
            }
            None => {
                tracing::warn!(source = %domain, reason, "feed fetch failed");
                FetchOutcome::Error {
                    source_domain: domain,
                    message: reason.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
