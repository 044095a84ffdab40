// ABOUTME: Request-level orchestration: rate limiting, input validation, caching, fetching and normalization.
// ABOUTME: PodcastService owns the shared cache and limiter and is safe to call from concurrent tasks.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{CacheEntry, FeedCache};
use crate::error::ServiceError;
use crate::fetcher::FeedFetcher;
use crate::models::{non_empty, CacheCleared, CacheStatus, EpisodesResponse, SearchResponse};
use crate::normalize::normalize_feed;
use crate::options::{ServiceBuilder, ServiceOptions};
use crate::rate_limit::RateLimiter;
use crate::sanitize::validate_url;
use crate::search::SearchClient;

/// Entry point for every podcast operation.
///
/// Cloning is cheap; clones share the same cache and rate limiter.
#[derive(Clone)]
pub struct PodcastService {
    opts: ServiceOptions,
    cache: Arc<FeedCache>,
    limiter: Arc<RateLimiter>,
    fetcher: Arc<dyn FeedFetcher>,
    search: SearchClient,
}

impl PodcastService {
    pub fn new(opts: ServiceOptions, fetcher: Arc<dyn FeedFetcher>, search: SearchClient) -> Self {
        let cache = Arc::new(FeedCache::new(opts.cache_ttl));
        let limiter = Arc::new(RateLimiter::new(
            opts.rate_window,
            opts.max_requests_per_window,
        ));
        Self {
            opts,
            cache,
            limiter,
            fetcher,
            search,
        }
    }

    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.opts
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Returns the normalized episodes of `feed_url`, from cache when fresh.
    ///
    /// # Errors
    /// `RateLimited` before anything else, `InvalidInput` for a missing,
    /// overlong or malformed URL, `Timeout`/`Upstream` when the fetch fails
    /// and `Feed` when the document is unusable. Failures never touch the cache.
    pub async fn episodes(
        &self,
        client: &str,
        feed_url: &str,
    ) -> Result<EpisodesResponse, ServiceError> {
        self.admit(client)?;
        let feed_url = self.check_feed_url(feed_url)?;

        if let Some(entry) = self.cache.get_fresh(feed_url) {
            info!(client, episodes = entry.episodes.len(), "serving cached feed");
            return Ok(episodes_response(feed_url, entry, true));
        }

        let document = match tokio::time::timeout(
            self.opts.fetch_timeout,
            self.fetcher.fetch(feed_url),
        )
        .await
        {
            Ok(result) => result.map_err(|err| {
                warn!(client, error = %err, "feed fetch failed");
                ServiceError::from(err)
            })?,
            Err(_) => {
                warn!(client, timeout = ?self.opts.fetch_timeout, "feed fetch timed out");
                return Err(ServiceError::Timeout);
            }
        };

        let feed = normalize_feed(&document, feed_url, self.opts.max_episodes)?;
        info!(
            client,
            episodes = feed.episodes.len(),
            issues = feed.parsing_issues.len(),
            "feed fetched and cached"
        );
        let entry = self.cache.put(feed_url, feed);
        Ok(episodes_response(feed_url, entry, false))
    }

    pub async fn search(&self, client: &str, term: &str) -> Result<SearchResponse, ServiceError> {
        self.admit(client)?;
        self.search.search(term).await
    }

    pub fn clear_cache(&self, client: &str) -> Result<CacheCleared, ServiceError> {
        self.admit(client)?;
        let cleared_entries = self.cache.clear();
        info!(client, cleared_entries, "cache cleared");
        Ok(CacheCleared {
            message: "Cache cleared successfully".to_string(),
            cleared_entries,
        })
    }

    pub fn cache_status(&self, client: &str) -> Result<CacheStatus, ServiceError> {
        self.admit(client)?;
        Ok(self.cache.status())
    }

    fn admit(&self, client: &str) -> Result<(), ServiceError> {
        if self.limiter.admit(client) {
            Ok(())
        } else {
            Err(ServiceError::RateLimited)
        }
    }

    fn check_feed_url<'a>(&self, feed_url: &'a str) -> Result<&'a str, ServiceError> {
        let feed_url = feed_url.trim();
        if feed_url.is_empty() {
            return Err(ServiceError::invalid_input("Feed URL is required"));
        }
        if feed_url.chars().count() > self.opts.max_feed_url_length {
            return Err(ServiceError::invalid_input("Feed URL is too long"));
        }
        if !validate_url(feed_url) {
            return Err(ServiceError::invalid_input("Invalid URL format"));
        }
        Ok(feed_url)
    }
}

fn episodes_response(feed_url: &str, entry: CacheEntry, cached: bool) -> EpisodesResponse {
    EpisodesResponse {
        podcast: entry.podcast,
        count: entry.episodes.len(),
        episodes: entry.episodes,
        feed_url: feed_url.to_string(),
        cached,
        cache_timestamp: entry.timestamp,
        parsing_issues: non_empty(entry.parsing_issues),
    }
}
