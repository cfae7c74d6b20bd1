//! AI summaries and chat replies for newswire.
//!
//! [`SummarizerClient`] wraps a [`CompletionProvider`] in a fixed-delay
//! [`RetryPolicy`]. Without a credential the client runs in offline mode:
//! summaries fail fast with [`SummarizerError::Unconfigured`] and chat answers
//! with a canned, clearly labeled reply.

pub mod client;
pub mod error;
pub mod provider;
pub mod retry;

pub use client::{Backend, SummarizerClient, OFFLINE_REPLIES};
pub use error::SummarizerError;
pub use provider::{CompletionProvider, Mode, OpenAiProvider};
pub use retry::{is_retriable, RetryPolicy};
