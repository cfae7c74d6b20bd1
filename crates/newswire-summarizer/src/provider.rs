//! Completion providers.
//!
//! [`OpenAiProvider`] speaks the chat-completions wire format. Use
//! [`OpenAiProvider::with_base_url`] to point it at a mock server in tests.

use std::future::Future;
use std::time::Duration;

use newswire_core::AiSettings;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::SummarizerError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const USER_AGENT: &str = "newswire/0.1 (summarizer)";

/// Error bodies are cut to this many chars before being surfaced.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// What the completion is for. Selects the system prompt and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Summarize,
    Reply,
}

impl Mode {
    fn system_prompt(self) -> &'static str {
        match self {
            Mode::Summarize => {
                "You summarize news articles. Reply with two or three plain sentences \
                 covering the key facts. No preamble, no markdown."
            }
            Mode::Reply => {
                "You are a concise news assistant. Answer the user's message in a \
                 short, friendly paragraph."
            }
        }
    }

    fn temperature(self) -> f32 {
        match self {
            Mode::Summarize => 0.2,
            Mode::Reply => 0.7,
        }
    }

    fn max_tokens(self) -> u32 {
        match self {
            Mode::Summarize => 200,
            Mode::Reply => 400,
        }
    }
}

/// Turns a prompt into completion text.
pub trait CompletionProvider: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        mode: Mode,
    ) -> impl Future<Output = Result<String, SummarizerError>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// Creates a provider against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, SummarizerError> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    /// Creates a provider from configured settings. `None` when no credential
    /// is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizerError`] if the client cannot be built or the base
    /// URL is invalid.
    pub fn from_settings(settings: &AiSettings) -> Result<Option<Self>, SummarizerError> {
        settings
            .api_key
            .as_deref()
            .map(|key| {
                Self::with_base_url(
                    key,
                    settings.request_timeout,
                    &settings.base_url,
                    &settings.model,
                )
            })
            .transpose()
    }

    /// Creates a provider with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SummarizerError::Http`] if the client cannot be built, or
    /// [`SummarizerError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout: Duration,
        base_url: &str,
        model: &str,
    ) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .user_agent(USER_AGENT)
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| SummarizerError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint,
            model: model.to_owned(),
        })
    }
}

impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, mode: Mode) -> Result<String, SummarizerError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: mode.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: mode.temperature(),
            max_tokens: mode.max_tokens(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(SummarizerError::EmptyResponse)
    }
}
