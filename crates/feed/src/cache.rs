// ABOUTME: In-memory TTL cache of normalized feeds keyed by feed URL.
// ABOUTME: Entries are overwritten on refetch and never evicted; staleness is checked on read.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::models::{CacheEntryStatus, CacheStatus, Episode, NormalizedFeed, PodcastInfo};

/// Freshness window for cached feeds (10 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Keys longer than this are shortened in `status()` output.
const STATUS_URL_PREVIEW: usize = 50;

/// A normalized feed as it was stored, with the unix time of the fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub podcast: PodcastInfo,
    pub episodes: Vec<Episode>,
    pub parsing_issues: Vec<String>,
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(feed: NormalizedFeed, timestamp: i64) -> Self {
        Self {
            podcast: feed.podcast,
            episodes: feed.episodes,
            parsing_issues: feed.parsing_issues,
            timestamp,
        }
    }

    /// `now - timestamp < ttl`, all in unix seconds.
    pub fn is_valid_at(&self, now: i64, ttl: Duration) -> bool {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        now.saturating_sub(self.timestamp) < ttl
    }
}

/// Feed cache shared by all requests.
///
/// Each operation takes the lock once, so a read never observes a
/// half-written entry. Two requests racing on the same cold key may both
/// fetch; the last `put` wins.
#[derive(Debug)]
pub struct FeedCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored entry for `url`, fresh or not.
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.lock().get(url).cloned()
    }

    /// Returns the entry for `url` only while it is still fresh.
    pub fn get_fresh(&self, url: &str) -> Option<CacheEntry> {
        self.get_fresh_at(url, Utc::now().timestamp())
    }

    pub fn get_fresh_at(&self, url: &str, now: i64) -> Option<CacheEntry> {
        self.lock()
            .get(url)
            .filter(|entry| entry.is_valid_at(now, self.ttl))
            .cloned()
    }

    /// Stores `feed` under `url` stamped with the current time.
    pub fn put(&self, url: &str, feed: NormalizedFeed) -> CacheEntry {
        self.put_at(url, feed, Utc::now().timestamp())
    }

    pub fn put_at(&self, url: &str, feed: NormalizedFeed, timestamp: i64) -> CacheEntry {
        let entry = CacheEntry::new(feed, timestamp);
        self.lock().insert(url.to_string(), entry.clone());
        entry
    }

    pub fn is_valid(&self, entry: &CacheEntry) -> bool {
        entry.is_valid_at(Utc::now().timestamp(), self.ttl)
    }

    /// Removes every entry and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn status(&self) -> CacheStatus {
        self.status_at(Utc::now().timestamp())
    }

    /// Read-only diagnostic view, ordered by key.
    pub fn status_at(&self, now: i64) -> CacheStatus {
        let entries = self.lock();
        let mut rows: Vec<CacheEntryStatus> = entries
            .iter()
            .map(|(url, entry)| CacheEntryStatus {
                url: preview_url(url),
                episode_count: entry.episodes.len(),
                timestamp: entry.timestamp,
                is_valid: entry.is_valid_at(now, self.ttl),
            })
            .collect();
        rows.sort_by(|a, b| a.url.cmp(&b.url));

        CacheStatus {
            cache_size: entries.len(),
            entries: rows,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn preview_url(url: &str) -> String {
    if url.chars().count() > STATUS_URL_PREVIEW {
        let head: String = url.chars().take(STATUS_URL_PREVIEW).collect();
        format!("{head}...")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(episodes: usize) -> NormalizedFeed {
        NormalizedFeed {
            podcast: PodcastInfo {
                title: "Show".into(),
                description: "About".into(),
                artwork: None,
            },
            episodes: (0..episodes)
                .map(|i| Episode {
                    title: format!("Episode {i}"),
                    audio_url: format!("https://cdn.example.com/{i}.mp3"),
                    ..Default::default()
                })
                .collect(),
            parsing_issues: Vec::new(),
        }
    }

    #[test]
    fn test_fresh_until_ttl() {
        let cache = FeedCache::default();
        cache.put_at("https://example.com/feed", feed(2), 1_000);

        assert!(cache.get_fresh_at("https://example.com/feed", 1_000).is_some());
        assert!(cache.get_fresh_at("https://example.com/feed", 1_599).is_some());
        assert!(cache.get_fresh_at("https://example.com/feed", 1_600).is_none());
        // Stale entries are kept, only not served as fresh.
        assert_eq!(cache.get("https://example.com/feed").unwrap().timestamp, 1_000);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = FeedCache::default();
        cache.put_at("k", feed(1), 10);
        cache.put_at("k", feed(3), 20);
        let entry = cache.get("k").unwrap();
        assert_eq!(entry.episodes.len(), 3);
        assert_eq!(entry.timestamp, 20);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_reports_prior_count() {
        let cache = FeedCache::default();
        cache.put_at("a", feed(1), 0);
        cache.put_at("b", feed(1), 0);
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear(), 0);
    }

    #[test]
    fn test_status_truncates_keys() {
        let cache = FeedCache::new(Duration::from_secs(60));
        let long = format!("https://example.com/{}", "x".repeat(60));
        cache.put_at(&long, feed(2), 100);
        cache.put_at("https://a.example.com/feed", feed(1), 10);

        let status = cache.status_at(120);
        assert_eq!(status.cache_size, 2);
        assert_eq!(
            status.entries[0],
            CacheEntryStatus {
                url: "https://a.example.com/feed".into(),
                episode_count: 1,
                timestamp: 10,
                is_valid: false,
            }
        );
        let truncated = &status.entries[1];
        assert_eq!(truncated.url.chars().count(), 53);
        assert!(truncated.url.ends_with("..."));
        assert!(truncated.is_valid);
        assert_eq!(truncated.episode_count, 2);
    }
}
