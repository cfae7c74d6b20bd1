use std::time::Duration;

use feed_rs::model::Entry;
use newswire_core::{CategoryRule, FetchOutcome, Source};

use super::*;
use crate::fallback::{FallbackFetch, PLACEHOLDER_TAG};

const THREE_ITEMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Stub</title>
    <link>https://stub.example.com</link>
    <description>Stub feed</description>
    <item><title>One</title><link>https://stub.example.com/1</link>
      <pubDate>Tue, 10 Jun 2025 04:00:00 GMT</pubDate></item>
    <item><title>Two</title><link>https://stub.example.com/2</link>
      <pubDate>Tue, 10 Jun 2025 05:00:00 GMT</pubDate></item>
    <item><title>Three</title><link>https://stub.example.com/3</link>
      <pubDate>Tue, 10 Jun 2025 06:00:00 GMT</pubDate></item>
  </channel>
</rss>"#;

enum Behavior {
    Entries,
    Empty,
    Status(u16),
    Hang,
}

struct StubReader(Behavior);

impl FeedReader for StubReader {
    async fn read(&self, url: &str) -> Result<Vec<Entry>, FeedError> {
        match self.0 {
            Behavior::Entries => Ok(feed_rs::parser::parse(THREE_ITEMS.as_bytes())?.entries),
            Behavior::Empty => Ok(Vec::new()),
            Behavior::Status(status) => Err(FeedError::Status {
                status,
                url: url.to_string(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

fn rules() -> Vec<CategoryRule> {
    vec![CategoryRule::new("tech", &["stub"])]
}

fn source() -> Source {
    Source::new("https://stub.example.com/feed", "Stub Wire", &["tech"])
}

#[tokio::test]
async fn real_entries_are_capped_at_limit() {
    let fetcher = Fetcher::new(StubReader(Behavior::Entries), rules());
    let outcome = fetcher.fetch(&source(), 2).await;
    let items = outcome.items();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| !i.placeholder));
    assert_eq!(items[0].category, "tech");
}

#[tokio::test]
async fn real_entries_are_never_padded() {
    let fetcher = Fetcher::new(StubReader(Behavior::Entries), rules());
    let outcome = fetcher.fetch(&source(), 10).await;
    assert_eq!(outcome.items().len(), 3);
}

#[tokio::test]
async fn zero_limit_is_clamped_to_one() {
    let fetcher = Fetcher::new(StubReader(Behavior::Entries), rules());
    assert_eq!(fetcher.fetch(&source(), 0).await.items().len(), 1);
}

#[tokio::test]
async fn empty_feed_falls_back_to_placeholders() {
    let fetcher = Fetcher::new(StubReader(Behavior::Empty), rules());
    let outcome = fetcher.fetch(&source(), 10).await;
    assert!(outcome.is_ok());
    let items = outcome.items();
    assert_eq!(items.len(), FallbackFetch::DEFAULT_COUNT);
    assert!(items.iter().all(|i| i.placeholder && i.title.starts_with(PLACEHOLDER_TAG)));
    assert_eq!(items[0].category, "tech");
}

#[tokio::test]
async fn status_error_falls_back_to_placeholders() {
    let fetcher = Fetcher::new(StubReader(Behavior::Status(503)), rules());
    let outcome = fetcher.fetch(&source(), 2).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.items().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn timeout_falls_back_to_placeholders() {
    let fetcher = Fetcher::new(StubReader(Behavior::Hang), rules())
        .with_timeout(Duration::from_secs(1));
    let outcome = fetcher.fetch(&source(), 5).await;
    assert!(outcome.is_ok());
    assert_eq!(outcome.items().len(), 3);
}

#[tokio::test]
async fn disabled_fallback_reports_error() {
    let fetcher = Fetcher::new(StubReader(Behavior::Status(500)), rules()).with_fallback(None);
    match fetcher.fetch(&source(), 5).await {
        FetchOutcome::Error {
            source_domain,
            message,
        } => {
            assert_eq!(source_domain, "stub.example.com");
            assert!(message.contains("500"));
        }
        FetchOutcome::Ok(items) => panic!("expected error, got {} items", items.len()),
    }
}

#[tokio::test]
async fn disabled_fallback_reports_empty_feed_as_error() {
    let fetcher = Fetcher::new(StubReader(Behavior::Empty), rules()).with_fallback(None);
    assert!(!fetcher.fetch(&source(), 5).await.is_ok());
}

#[tokio::test]
async fn malformed_url_is_error_even_with_fallback() {
    let fetcher = Fetcher::new(StubReader(Behavior::Entries), rules());
    let broken = Source::new("not a url", "Broken", &[]);
    match fetcher.fetch(&broken, 5).await {
        FetchOutcome::Error { source_domain, .. } => assert_eq!(source_domain, "not a url"),
        FetchOutcome::Ok(_) => panic!("malformed url must not succeed"),
    }
}

#[tokio::test]
async fn non_http_scheme_is_error() {
    let fetcher = Fetcher::new(StubReader(Behavior::Entries), rules());
    let ftp = Source::new("ftp://files.example.com/feed.xml", "Ftp", &[]);
    assert!(!fetcher.fetch(&ftp, 5).await.is_ok());
}

#[test]
fn validate_feed_url_accepts_https() {
    assert!(validate_feed_url("https://example.com/rss").is_ok());
}

#[test]
fn validate_feed_url_rejects_relative_and_file_urls() {
    assert!(matches!(
        validate_feed_url("/rss.xml"),
        Err(FeedError::InvalidUrl { .. })
    ));
    assert!(matches!(
        validate_feed_url("file:///etc/passwd"),
        Err(FeedError::InvalidUrl { .. })
    ));
}
