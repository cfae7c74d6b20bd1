use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings for the AI completion provider.
///
/// `api_key == None` is the degraded mode: the summarizer never touches the
/// network and chat falls back to canned replies.
#[derive(Clone)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub sources_path: Option<PathBuf>,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub fetch_max_concurrent: usize,
    pub fallback_enabled: bool,
    pub fallback_count: usize,
    pub default_limit: usize,
    pub aggregate_deadline: Option<Duration>,
    pub schedule_interval: Duration,
    pub crawl_queue_capacity: usize,
    pub ai: AiSettings,
}
