use thiserror::Error;

/// Errors returned by the summarizer and its completion provider.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Network, TLS, or body-decoding failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered 2xx but with no usable completion text.
    #[error("provider returned an empty completion")]
    EmptyResponse,

    /// No credential is configured; no call was attempted.
    #[error("AI provider is not configured")]
    Unconfigured,

    #[error("invalid AI base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
