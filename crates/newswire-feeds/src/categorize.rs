//! Entry normalization: category assignment, image extraction, summary cleanup.

use feed_rs::model::Entry;
use newswire_core::{CategoryRule, FeedItem, Source};

pub const DEFAULT_CATEGORY: &str = "general";

/// Summary used when a real entry carries none.
pub const NO_SUMMARY: &str = "no summary available";

const DEFAULT_TITLE: &str = "Untitled";

/// Summaries longer than this (in chars) are cut and suffixed with `...`.
const MAX_SUMMARY_CHARS: usize = 600;

/// Name of the first rule whose keyword appears in `domain`, or
/// [`DEFAULT_CATEGORY`]. Rules are checked in declared order.
#[must_use]
pub fn assign_category<'a>(domain: &str, rules: &'a [CategoryRule]) -> &'a str {
    rules
        .iter()
        .find(|rule| rule.matches(domain))
        .map_or(DEFAULT_CATEGORY, |rule| rule.name.as_str())
}

/// Map a parsed feed entry to a [`FeedItem`] for `source`.
#[must_use]
pub fn categorize(entry: &Entry, source: &Source, rules: &[CategoryRule]) -> FeedItem {
    let source_domain = source.label();
    let category = assign_category(&source_domain, rules).to_string();

    let title = entry
        .title
        .as_ref()
        .map(|t| strip_html(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map_or_else(|| entry.id.clone(), |l| l.href.clone());

    let raw_summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_deref()));
    let summary = raw_summary
        .map(strip_html)
        .filter(|s| !s.is_empty())
        .map(|s| truncate_chars(&s, MAX_SUMMARY_CHARS))
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    FeedItem {
        title,
        link,
        published_at: entry.published.or(entry.updated),
        summary: Some(summary),
        image: extract_image(entry),
        source_domain,
        category,
        placeholder: false,
        ai_summary: None,
    }
}

/// Illustrative image for an entry.
///
/// Precedence: the first media-content URL, then the first link whose media
/// type is `image/*`, then none.
#[must_use]
pub fn extract_image(entry: &Entry) -> Option<String> {
    let media = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref())
        .map(ToString::to_string);
    if media.is_some() {
        return media;
    }

    entry
        .links
        .iter()
        .find(|l| {
            l.media_type
                .as_deref()
                .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image/"))
        })
        .map(|l| l.href.clone())
}

/// Strip HTML tags from a string and normalize whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
#[path = "categorize_test.rs"]
mod tests;
