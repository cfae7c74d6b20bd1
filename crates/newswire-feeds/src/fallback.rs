//! Synthetic placeholder content for sources that yielded nothing.

use chrono::{DateTime, Utc};
use newswire_core::{FeedItem, Source};

/// Prefix on every placeholder title.
pub const PLACEHOLDER_TAG: &str = "[placeholder]";

/// Generates deterministic placeholder items when a real fetch comes back
/// empty or fails recoverably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackFetch {
    count: usize,
}

impl FallbackFetch {
    pub const DEFAULT_COUNT: usize = 3;

    /// A zero count is raised to one so a masked failure always yields content.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count: count.max(1),
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Build `min(limit, count)` placeholder items for `source`.
    ///
    /// Items carry no `published_at`, so they sort after timestamped content.
    #[must_use]
    pub fn synthesize(
        &self,
        source: &Source,
        category: &str,
        limit: usize,
        generated_at: DateTime<Utc>,
    ) -> Vec<FeedItem> {
        let ts = generated_at.timestamp();
        let stamp = generated_at.to_rfc3339();
        let source_domain = source.label();

        (1..=self.count.min(limit))
            .map(|n| FeedItem {
                title: format!("{PLACEHOLDER_TAG} {} #{n}", source.display_name),
                link: format!("{}#placeholder-{ts}-{n}", source.url),
                published_at: None,
                summary: Some(format!(
                    "Placeholder generated at {stamp}; {} returned no items.",
                    source.display_name
                )),
                image: None,
                source_domain: source_domain.clone(),
                category: category.to_string(),
                placeholder: true,
                ai_summary: None,
            })
            .collect()
    }
}

impl Default for FallbackFetch {
    fn default() -> Self {
        Self::new(Self::DEFAULT_COUNT)
    }
}
