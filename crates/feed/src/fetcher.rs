// ABOUTME: Feed retrieval behind the FeedFetcher trait, with a reqwest-based HTTP implementation.
// ABOUTME: Enforces a request timeout and a body size cap before handing bytes to the parser.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::fields::FeedDocument;
use crate::parser::parse_feed_bytes;

/// Maximum accepted feed body (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

pub const DEFAULT_USER_AGENT: &str = "ReWise-Backend/1.0.0";

/// Source of parsed feed documents.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError>;
}

/// Fetches feeds over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Request)?;
        Ok(Self { client, timeout })
    }

    /// Uses a caller-provided client; `timeout` is only reported in errors.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Downloads the raw body, rejecting non-2xx responses and oversized bodies.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "feed request returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_CONTENT_LENGTH as u64 {
                return Err(FetchError::TooLarge(MAX_CONTENT_LENGTH));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        if body.len() > MAX_CONTENT_LENGTH {
            return Err(FetchError::TooLarge(MAX_CONTENT_LENGTH));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<FeedDocument, FetchError> {
        let body = self.fetch_bytes(url).await?;
        info!(bytes = body.len(), "feed downloaded");
        Ok(parse_feed_bytes(&body))
    }
}
