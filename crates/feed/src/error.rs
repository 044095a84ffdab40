// ABOUTME: Error types for feed normalization, fetching, search and the request service.
// ABOUTME: FeedError covers unusable documents; ServiceError is the per-request taxonomy.

use thiserror::Error;

/// Errors that make a feed document unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The data was parsed but has no channel-level information.
    #[error("invalid feed: {0}")]
    Invalid(String),

    /// The feed contains no entries.
    #[error("no episodes found in RSS feed")]
    Empty,
}

impl FeedError {
    /// Creates an Invalid error with a custom message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        FeedError::Invalid(msg.into())
    }
}

/// Errors from fetching a feed or calling the search API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected status code: {0}")]
    Status(u16),

    #[error("response body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classifies a reqwest error, separating timeouts from other failures.
    pub fn from_reqwest(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Request(err)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// Failure of a single service request. Nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Rejected before any cache or network activity.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Request timeout")]
    Timeout,

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl ServiceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ServiceError::InvalidInput(msg.into())
    }

    /// HTTP status an outer surface should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::RateLimited => 429,
            ServiceError::InvalidInput(_) => 400,
            ServiceError::Timeout => 504,
            ServiceError::Upstream(_) => 502,
            ServiceError::Feed(_) => 400,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ServiceError::RateLimited)
    }
}

impl From<FetchError> for ServiceError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(_) => ServiceError::Timeout,
            other => ServiceError::Upstream(other.to_string()),
        }
    }
}
