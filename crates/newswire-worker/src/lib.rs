//! The newswire service layer: call contracts, the periodic scheduler, and
//! the ad hoc crawl queue.

pub mod queue;
pub mod scheduler;
pub mod service;

pub use queue::{CrawlQueue, CrawlResult, CrawlWorker, QueueError};
pub use scheduler::{
    FlightGuard, RunController, RunOutcome, RunReport, Scheduler, SingleFlight, TickResult, Trigger,
};
pub use service::{
    AggregateRequest, AggregateResponse, ChatResponse, NewsService, ResponseStatus, ServiceError,
    SummarizeResponse, DEFAULT_PAGE_SIZE,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use feed_rs::model::Entry;
    use newswire_core::{default_registry, Source, SourceRegistry};
    use newswire_feeds::{Aggregator, FeedError, FeedReader, Fetcher};
    use newswire_summarizer::SummarizerClient;

    use crate::service::NewsService;

    pub(crate) const ONE_ITEM_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Stub</title><link>https://stub.example.com</link>
<description>d</description>
<item><title>Stub story</title><link>https://stub.example.com/story</link>
<pubDate>Tue, 10 Jun 2025 04:00:00 GMT</pubDate></item>
</channel></rss>"#;

    /// Serves `ONE_ITEM_RSS` for URLs containing "alpha" and a 500 for
    /// everything else. URLs containing `slow` wait `delay` first; an empty
    /// `slow` delays every URL.
    pub(crate) struct StubReader {
        pub(crate) delay: Duration,
        pub(crate) slow: &'static str,
    }

    impl FeedReader for StubReader {
        async fn read(&self, url: &str) -> Result<Vec<Entry>, FeedError> {
            if url.contains(self.slow) {
                tokio::time::sleep(self.delay).await;
            }
            if url.contains("alpha") {
                Ok(feed_rs::parser::parse(ONE_ITEM_RSS.as_bytes())?.entries)
            } else {
                Err(FeedError::Status {
                    status: 500,
                    url: url.to_string(),
                })
            }
        }
    }

    pub(crate) fn registry() -> SourceRegistry {
        SourceRegistry::new(
            vec![
                Source::new("https://alpha.example.com/rss", "Alpha", &["tech"]),
                Source::new("https://beta.example.com/rss", "Beta", &["tech", "world"]),
            ],
            default_registry().categories().to_vec(),
        )
        .expect("test registry is valid")
    }

    pub(crate) fn service(delay: Duration) -> NewsService<StubReader> {
        service_slow_on(delay, "")
    }

    pub(crate) fn service_slow_on(delay: Duration, slow: &'static str) -> NewsService<StubReader> {
        let fetcher = Fetcher::new(StubReader { delay, slow }, Vec::new())
            .with_timeout(Duration::from_secs(60));
        NewsService::new(
            Arc::new(registry()),
            Aggregator::new(fetcher, 4),
            SummarizerClient::offline(),
        )
    }
}
