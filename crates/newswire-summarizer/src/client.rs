//! The summarizer client shared by the summary and chat call sites.

use newswire_core::AiSettings;
use rand::seq::IndexedRandom;

use crate::error::SummarizerError;
use crate::provider::{CompletionProvider, Mode, OpenAiProvider};
use crate::retry::RetryPolicy;

/// Canned chat replies used when no provider is configured.
pub const OFFLINE_REPLIES: [&str; 4] = [
    "[offline] AI replies are unavailable right now. Browse the latest headlines in the meantime.",
    "[offline] The assistant is not configured on this server, so no AI answer could be generated.",
    "[offline] No AI provider is set up. Try the refresh option to pull the newest stories.",
    "[offline] Chat is running without an AI backend; your message was received but not answered.",
];

/// Whether a completion provider is available.
#[derive(Debug)]
pub enum Backend<P> {
    Configured(P),
    Unconfigured,
}

#[derive(Debug)]
pub struct SummarizerClient<P = OpenAiProvider> {
    backend: Backend<P>,
    retry: RetryPolicy,
}

impl SummarizerClient<OpenAiProvider> {
    /// Build a client from configured settings. A missing credential yields
    /// the offline client.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizerError`] if a configured provider cannot be built.
    pub fn from_settings(settings: &AiSettings) -> Result<Self, SummarizerError> {
        let backend = match OpenAiProvider::from_settings(settings)? {
            Some(provider) => Backend::Configured(provider),
            None => {
                tracing::info!("no AI credential configured; summarizer running offline");
                Backend::Unconfigured
            }
        };
        Ok(Self::new(
            backend,
            RetryPolicy::new(settings.max_attempts, settings.retry_delay),
        ))
    }
}

impl<P: CompletionProvider> SummarizerClient<P> {
    pub fn new(backend: Backend<P>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// A client with no provider.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(Backend::Unconfigured, RetryPolicy::default())
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(self.backend, Backend::Configured(_))
    }

    /// Run one completion under the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizerError::Unconfigured`] without touching the network
    /// when no provider is set, otherwise the provider's final error.
    pub async fn complete(&self, prompt: &str, mode: Mode) -> Result<String, SummarizerError> {
        let Backend::Configured(provider) = &self.backend else {
            return Err(SummarizerError::Unconfigured);
        };
        self.retry.run(|| provider.complete(prompt, mode)).await
    }

    /// Summarize article text.
    ///
    /// # Errors
    ///
    /// See [`SummarizerClient::complete`].
    pub async fn summarize(&self, content: &str) -> Result<String, SummarizerError> {
        self.complete(content, Mode::Summarize).await
    }

    /// Answer a chat message. Offline clients answer with one of
    /// [`OFFLINE_REPLIES`].
    ///
    /// # Errors
    ///
    /// Returns the provider's final error when configured.
    pub async fn chat(&self, message: &str) -> Result<String, SummarizerError> {
        match self.backend {
            Backend::Unconfigured => Ok(offline_reply().to_string()),
            Backend::Configured(_) => self.complete(message, Mode::Reply).await,
        }
    }
}

fn offline_reply() -> &'static str {
    OFFLINE_REPLIES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(OFFLINE_REPLIES[0])
}
