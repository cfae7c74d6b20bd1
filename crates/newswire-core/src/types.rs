use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized news entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub source_domain: String,
    pub category: String,
    /// `true` for synthetic fallback content.
    #[serde(default)]
    pub placeholder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

/// Result of fetching one source.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Ok(Vec<FeedItem>),
    Error {
        source_domain: String,
        message: String,
    },
}

impl FetchOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Ok(_))
    }

    /// Items of an `Ok` outcome; empty for `Error`.
    #[must_use]
    pub fn items(&self) -> &[FeedItem] {
        match self {
            FetchOutcome::Ok(items) => items,
            FetchOutcome::Error { .. } => &[],
        }
    }
}

/// A source that returned `FetchOutcome::Error` during an aggregate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_domain: String,
    pub message: String,
}

/// Merged, sorted, truncated result of one aggregate pass.
///
/// `success_count + error_count` always equals the number of sources
/// attempted, and `total` counts items before truncation to the page size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub items: Vec<FeedItem>,
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceFailure>,
}

impl AggregateResult {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.success_count + self.error_count
    }
}

/// A crawl request handed to the scheduler. `None` means every source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    pub source_id: Option<String>,
}

impl CrawlJob {
    #[must_use]
    pub fn single(source_id: &str) -> Self {
        Self {
            source_id: Some(source_id.to_string()),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self { source_id: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> FeedItem {
        FeedItem {
            title: "Title".to_string(),
            link: "https://example.com/a".to_string(),
            published_at: None,
            summary: Some("Summary".to_string()),
            image: None,
            source_domain: "example.com".to_string(),
            category: "general".to_string(),
            placeholder: false,
            ai_summary: None,
        }
    }

    #[test]
    fn ai_summary_is_omitted_until_set() {
        let json = serde_json::to_value(item()).unwrap();
        assert!(json.get("ai_summary").is_none());
        assert_eq!(json["placeholder"], false);
    }

    #[test]
    fn placeholder_defaults_to_false_when_absent() {
        let parsed: FeedItem = serde_json::from_str(
            r#"{"title":"t","link":"l","published_at":null,"summary":null,"image":null,
                "source_domain":"d","category":"c"}"#,
        )
        .unwrap();
        assert!(!parsed.placeholder);
        assert!(parsed.ai_summary.is_none());
    }

    #[test]
    fn error_outcome_has_no_items() {
        let outcome = FetchOutcome::Error {
            source_domain: "example.com".to_string(),
            message: "boom".to_string(),
        };
        assert!(!outcome.is_ok());
        assert!(outcome.items().is_empty());
        assert_eq!(FetchOutcome::Ok(vec![item()]).items().len(), 1);
    }

    #[test]
    fn crawl_job_constructors() {
        assert_eq!(CrawlJob::all().source_id, None);
        assert_eq!(CrawlJob::single("bbc-news").source_id.as_deref(), Some("bbc-news"));
    }
}
