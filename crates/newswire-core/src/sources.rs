//! The feed source registry.
//!
//! A compiled-in list of news feeds plus the ordered category rules used to
//! classify items by source domain. An operator may replace both with a YAML
//! file (`NEWSWIRE_SOURCES_PATH`); the registry is read-only afterwards.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One configured feed endpoint. Identity is the `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Category names this source is listed under (used by category filters).
    #[serde(default, rename = "categories")]
    pub category_keywords: BTreeSet<String>,
}

impl Source {
    pub fn new(url: &str, display_name: &str, categories: &[&str]) -> Self {
        Self {
            url: url.to_string(),
            display_name: display_name.to_string(),
            category_keywords: categories.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    /// Generate a URL-safe slug from the display name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.display_name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Host of the feed URL without a leading `www.`, or `None` if the URL
    /// does not parse or has no host.
    #[must_use]
    pub fn domain(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
    }

    /// Domain when available, otherwise the raw URL. Used to label outcomes.
    #[must_use]
    pub fn label(&self) -> String {
        self.domain().unwrap_or_else(|| self.url.clone())
    }

    /// Case-insensitive membership test against the category set.
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.category_keywords
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category.trim()))
    }
}

/// Maps a category name to domain keywords. Rules are evaluated in declared
/// order and the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// True if any keyword is a case-insensitive substring of `domain`.
    #[must_use]
    pub fn matches(&self, domain: &str) -> bool {
        let domain = domain.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .any(|k| domain.contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
    categories: Vec<CategoryRule>,
}

impl SourceRegistry {
    /// Build a validated registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on empty names, non-http(s) URLs,
    /// or duplicate URLs/slugs.
    pub fn new(sources: Vec<Source>, categories: Vec<CategoryRule>) -> Result<Self, ConfigError> {
        validate_sources(&sources)?;
        Ok(Self {
            sources,
            categories,
        })
    }

    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Look up a source by slug or URL (case-insensitive).
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Source> {
        let id = id.trim();
        self.sources
            .iter()
            .find(|s| s.slug().eq_ignore_ascii_case(id) || s.url.eq_ignore_ascii_case(id))
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    categories: Option<Vec<CategoryRule>>,
    sources: Vec<Source>,
}

/// Load the registry from `path`, or return the compiled-in registry when
/// `path` is `None`. A file without a `categories:` section keeps the default
/// category rules.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_registry(path: Option<&Path>) -> Result<SourceRegistry, ConfigError> {
    let Some(path) = path else {
        return Ok(default_registry());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: SourcesFile = serde_yaml::from_str(&content)?;
    let categories = file.categories.unwrap_or_else(default_category_rules);
    SourceRegistry::new(file.sources, categories)
}

/// The compiled-in registry.
#[must_use]
pub fn default_registry() -> SourceRegistry {
    SourceRegistry {
        sources: default_sources(),
        categories: default_category_rules(),
    }
}

fn default_sources() -> Vec<Source> {
    vec![
        Source::new("https://feeds.bbci.co.uk/news/rss.xml", "BBC News", &["world", "general"]),
        Source::new("https://techcrunch.com/feed/", "TechCrunch", &["tech", "startups"]),
        Source::new("https://www.theverge.com/rss/index.xml", "The Verge", &["tech"]),
        Source::new(
            "https://feeds.arstechnica.com/arstechnica/index",
            "Ars Technica",
            &["tech", "science"],
        ),
        Source::new("https://hnrss.org/frontpage", "Hacker News", &["tech"]),
        Source::new(
            "https://www.cnbc.com/id/100003114/device/rss/rss.html",
            "CNBC",
            &["business", "finance"],
        ),
        Source::new("https://www.nasa.gov/news-release/feed/", "NASA", &["science"]),
        Source::new("https://www.espn.com/espn/rss/news", "ESPN", &["sports"]),
    ]
}

fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("tech", &["techcrunch", "theverge", "arstechnica", "hnrss", "wired"]),
        CategoryRule::new("business", &["cnbc", "bloomberg", "ft.com", "wsj"]),
        CategoryRule::new("science", &["nasa", "sciencedaily", "nature.com"]),
        CategoryRule::new("sports", &["espn", "skysports"]),
        CategoryRule::new("world", &["bbc", "aljazeera", "npr"]),
    ]
}

fn validate_sources(sources: &[Source]) -> Result<(), ConfigError> {
    let mut seen_urls = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for source in sources {
        if source.display_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' must have a non-empty name",
                source.url
            )));
        }

        let scheme_ok = url::Url::parse(&source.url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
        if !scheme_ok {
            return Err(ConfigError::Validation(format!(
                "source '{}' has invalid url '{}'; must be an http(s) URL",
                source.display_name, source.url
            )));
        }

        if !seen_urls.insert(source.url.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source url: '{}'",
                source.url
            )));
        }

        let slug = source.slug();
        if slug.is_empty() || !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate or empty source slug: '{}' (from source '{}')",
                slug, source.display_name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
