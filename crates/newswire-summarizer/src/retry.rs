//! Fixed-delay retry for AI provider calls.
//!
//! [`RetryPolicy::run`] wraps any fallible async operation and retries on
//! transient errors (timeouts, connect failures, 429, 5xx). Everything else is
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::SummarizerError;

/// Returns `true` for errors that are worth retrying after the fixed delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - HTTP 429 and 5xx responses.
///
/// **Not retriable:**
/// - Other 4xx responses (bad credential, bad request).
/// - Malformed or empty completions.
/// - [`SummarizerError::Unconfigured`] and [`SummarizerError::InvalidBaseUrl`].
#[must_use]
pub fn is_retriable(err: &SummarizerError) -> bool {
    match err {
        SummarizerError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status()
                    .is_some_and(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
        }
        SummarizerError::Status { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..=599).contains(status)
        }
        SummarizerError::EmptyResponse
        | SummarizerError::Unconfigured
        | SummarizerError::InvalidBaseUrl { .. } => false,
    }
}

/// Bounded retry with a constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    /// `max_attempts` counts the first try and is raised to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `operation` up to `max_attempts` times, sleeping `delay` between
    /// retriable failures. The last error is returned once attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the first non-retriable error, or the final retriable one.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, SummarizerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SummarizerError>>,
    {
        let delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX);
        let mut attempt = 1u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_retriable(&err) || attempt >= self.max_attempts {
                        if attempt > 1 {
                            tracing::error!(
                                attempt,
                                max_attempts = self.max_attempts,
                                error = %err,
                                "AI provider call failed after retries"
                            );
                        }
                        return Err(err);
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms,
                        error = %err,
                        "transient AI provider error; retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}
