// ABOUTME: Podcast directory search against the iTunes Search API.
// ABOUTME: Sanitizes the term, queries the directory and keeps only results with a usable feed URL.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::error::{FetchError, ServiceError};
use crate::models::{Podcast, SearchResponse};
use crate::sanitize::{sanitize, validate_url};

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://itunes.apple.com";
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_SEARCH_TERM_LENGTH: usize = 100;

const MAX_NAME_LENGTH: usize = 200;
const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl SearchClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Request)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Searches for podcasts matching `term`.
    ///
    /// # Errors
    /// `InvalidInput` for a blank term, `Timeout` when the directory is slow,
    /// `Upstream` for transport failures and non-2xx answers.
    pub async fn search(&self, term: &str) -> Result<SearchResponse, ServiceError> {
        if term.trim().is_empty() {
            return Err(ServiceError::invalid_input("Search term is required"));
        }
        let search_term = sanitize(term, MAX_SEARCH_TERM_LENGTH);
        if search_term.is_empty() {
            return Err(ServiceError::invalid_input("Invalid search term"));
        }

        let url = self.search_url(&search_term)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "search request failed");
            return Err(FetchError::Status(status.as_u16()).into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let podcasts = podcasts_from_results(&body);
        info!(term = %search_term, results = podcasts.len(), "podcast search completed");

        Ok(SearchResponse {
            count: podcasts.len(),
            podcasts,
            search_term,
        })
    }

    fn search_url(&self, term: &str) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&format!("{}/search", self.base_url))
            .map_err(|e| ServiceError::Upstream(format!("bad search base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("term", term)
            .append_pair("entity", "podcast");
        Ok(url)
    }
}

/// Converts the `results` array of a search answer. Anything that is not
/// an array yields no podcasts.
pub fn podcasts_from_results(body: &Value) -> Vec<Podcast> {
    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|result| {
            let feed_url = result
                .get("feedUrl")
                .and_then(Value::as_str)
                .filter(|url| validate_url(url))?;

            let artwork = ["artworkUrl600", "artworkUrl100"]
                .iter()
                .filter_map(|key| result.get(*key).and_then(Value::as_str))
                .find(|url| !url.is_empty())
                .map(String::from);

            Some(Podcast {
                podcast_name: display_name(result, "collectionName"),
                feed_url: feed_url.to_string(),
                artwork,
                artist_name: display_name(result, "artistName"),
            })
        })
        .collect()
}

fn display_name(result: &Value, key: &str) -> String {
    let name = sanitize(
        result.get(key).and_then(Value::as_str).unwrap_or_default(),
        MAX_NAME_LENGTH,
    );
    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name
    }
}
