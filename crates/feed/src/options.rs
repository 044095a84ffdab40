// ABOUTME: Configuration for PodcastService and the ServiceBuilder used to assemble it.
// ABOUTME: Defaults match the production limits: 10 minute cache, 30 requests per minute, 20 episodes.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::error::FetchError;
use crate::fetcher::{FeedFetcher, HttpFeedFetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};
use crate::normalize::MAX_EPISODES;
use crate::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_RATE_WINDOW};
use crate::search::{SearchClient, DEFAULT_SEARCH_BASE_URL, DEFAULT_SEARCH_TIMEOUT};
use crate::service::PodcastService;

pub const MAX_FEED_URL_LENGTH: usize = 500;

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub cache_ttl: Duration,
    pub rate_window: Duration,
    pub max_requests_per_window: usize,
    pub max_episodes: usize,
    pub max_feed_url_length: usize,
    pub fetch_timeout: Duration,
    pub search_timeout: Duration,
    pub user_agent: String,
    pub search_base_url: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            rate_window: DEFAULT_RATE_WINDOW,
            max_requests_per_window: DEFAULT_MAX_REQUESTS,
            max_episodes: MAX_EPISODES,
            max_feed_url_length: MAX_FEED_URL_LENGTH,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
        }
    }
}

/// Fluent builder for [`PodcastService`].
pub struct ServiceBuilder {
    opts: ServiceOptions,
    fetcher: Option<Arc<dyn FeedFetcher>>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            opts: ServiceOptions::default(),
            fetcher: None,
        }
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.opts.cache_ttl = ttl;
        self
    }

    /// Set the sliding window and the admissions allowed inside it.
    pub fn rate_limit(mut self, window: Duration, max_requests: usize) -> Self {
        self.opts.rate_window = window;
        self.opts.max_requests_per_window = max_requests;
        self
    }

    pub fn max_episodes(mut self, max: usize) -> Self {
        self.opts.max_episodes = max;
        self
    }

    pub fn max_feed_url_length(mut self, max: usize) -> Self {
        self.opts.max_feed_url_length = max;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.opts.fetch_timeout = timeout;
        self
    }

    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.opts.search_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    pub fn search_base_url(mut self, url: impl Into<String>) -> Self {
        self.opts.search_base_url = url.into();
        self
    }

    /// Use a custom feed source instead of HTTP.
    pub fn fetcher(mut self, fetcher: Arc<dyn FeedFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.opts
    }

    /// Build the service, creating the HTTP clients that were not supplied.
    pub fn build(self) -> Result<PodcastService, FetchError> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFeedFetcher::new(
                self.opts.fetch_timeout,
                &self.opts.user_agent,
            )?),
        };
        let search = SearchClient::new(
            &self.opts.search_base_url,
            self.opts.search_timeout,
            &self.opts.user_agent,
        )?;
        Ok(PodcastService::new(self.opts, fetcher, search))
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ServiceOptions::default();
        assert_eq!(opts.cache_ttl, Duration::from_secs(600));
        assert_eq!(opts.rate_window, Duration::from_secs(60));
        assert_eq!(opts.max_requests_per_window, 30);
        assert_eq!(opts.max_episodes, 20);
        assert_eq!(opts.max_feed_url_length, 500);
        assert_eq!(opts.fetch_timeout, Duration::from_secs(15));
        assert_eq!(opts.search_timeout, Duration::from_secs(10));
        assert_eq!(opts.user_agent, "ReWise-Backend/1.0.0");
    }

    #[test]
    fn test_builder_overrides() {
        let builder = ServiceBuilder::new()
            .cache_ttl(Duration::from_secs(5))
            .rate_limit(Duration::from_secs(1), 2)
            .max_episodes(3)
            .user_agent("test-agent");
        let opts = builder.options();
        assert_eq!(opts.cache_ttl, Duration::from_secs(5));
        assert_eq!(opts.rate_window, Duration::from_secs(1));
        assert_eq!(opts.max_requests_per_window, 2);
        assert_eq!(opts.max_episodes, 3);
        assert_eq!(opts.user_agent, "test-agent");
    }
}
