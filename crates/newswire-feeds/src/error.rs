use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("feed parse error: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    #[error("feed from {url} is too large ({bytes} bytes)")]
    TooLarge { url: String, bytes: u64 },

    #[error("timed out after {millis}ms fetching {url}")]
    Timeout { url: String, millis: u128 },

    #[error("invalid feed URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FeedError {
    /// Only a malformed source URL is unrecoverable; every other failure is
    /// eligible for placeholder fallback.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FeedError::InvalidUrl { .. })
    }
}
