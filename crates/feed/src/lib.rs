// ABOUTME: Podcast feed normalization library for rewise.
// ABOUTME: Parses RSS/Atom/RDF/JSON feeds, normalizes episodes, and serves them through a cached, rate-limited service.

pub mod cache;
pub mod duration_parse;
pub mod episode;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod fields;
pub mod models;
pub mod normalize;
pub mod options;
pub mod parser;
pub mod rate_limit;
pub mod raw_xml;
pub mod sanitize;
pub mod search;
pub mod service;

pub use cache::{CacheEntry, FeedCache};
pub use duration_parse::parse_duration_seconds;
pub use episode::normalize_episode;
pub use error::{FeedError, FetchError, ServiceError};
pub use extract::{get, get_bool, get_int, get_or, FieldError};
pub use fetcher::{FeedFetcher, HttpFeedFetcher};
pub use fields::{FeedDocument, FieldSource, FieldValue, Fields};
pub use models::{
    CacheCleared, CacheEntryStatus, CacheStatus, Chapter, Episode, EpisodesResponse,
    NormalizedFeed, Podcast, PodcastInfo, SearchResponse,
};
pub use normalize::{normalize_feed, MAX_EPISODES};
pub use options::{ServiceBuilder, ServiceOptions};
pub use parser::parse_feed_bytes;
pub use rate_limit::{client_identity, RateLimiter};
pub use sanitize::{sanitize, validate_url};
pub use search::SearchClient;
pub use service::PodcastService;

/// Parses raw feed bytes and normalizes them in one step.
pub fn normalize_feed_bytes(
    data: &[u8],
    feed_url: &str,
    max_episodes: usize,
) -> Result<NormalizedFeed, FeedError> {
    normalize_feed(&parse_feed_bytes(data), feed_url, max_episodes)
}
