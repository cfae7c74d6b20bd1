//! Shared types, configuration, and the feed source registry for newswire.

pub mod app_config;
pub mod config;
pub mod sources;
pub mod types;

pub use app_config::{AiSettings, AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use sources::{default_registry, load_registry, CategoryRule, Source, SourceRegistry};
pub use types::{AggregateResult, CrawlJob, FeedItem, FetchOutcome, SourceFailure};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("sources validation failed: {0}")]
    Validation(String),
}
