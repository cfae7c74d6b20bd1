//! Feed ingestion for newswire.
//!
//! Fetches every configured source in parallel, masks per-source failures with
//! synthetic placeholder items, classifies entries by source domain, and merges
//! the results into one sorted page.

pub mod aggregate;
pub mod categorize;
pub mod error;
pub mod fallback;
pub mod fetch;

pub use aggregate::{
    filter_sources, merge_outcomes, AggregateError, AggregateQuery, Aggregator,
    DEFAULT_MAX_CONCURRENT,
};
pub use categorize::{assign_category, categorize, extract_image, DEFAULT_CATEGORY, NO_SUMMARY};
pub use error::FeedError;
pub use fallback::{FallbackFetch, PLACEHOLDER_TAG};
pub use fetch::{validate_feed_url, FeedReader, Fetcher, HttpFeedReader, DEFAULT_FETCH_TIMEOUT};
