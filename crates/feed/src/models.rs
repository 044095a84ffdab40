// ABOUTME: Normalized podcast and episode records plus the response envelopes built from them.
// ABOUTME: Serialized with camelCase names; optional fields serialize as null.

use serde::{Deserialize, Serialize};

/// Podcast-level metadata taken from the feed channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodcastInfo {
    pub title: String,
    pub description: String,
    pub artwork: Option<String>,
}

/// One chapter marker from a Podlove Simple Chapters block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub start: String,
    pub end: String,
}

/// A normalized episode. Only episodes with a validated audio URL exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub title: String,
    pub description: String,
    pub pub_date: Option<String>,
    pub audio_url: String,
    pub duration: Option<String>,
    pub duration_seconds: Option<u32>,
    pub episode_link: Option<String>,
    pub image: Option<String>,

    pub episode_number: Option<i64>,
    pub season: Option<i64>,
    pub explicit: Option<bool>,
    pub language: Option<String>,
    pub file_size: Option<String>,
    pub audio_quality: Option<String>,
    pub format: Option<String>,
    pub has_transcript: bool,
    pub transcript_url: Option<String>,
    pub show_notes_url: Option<String>,
    pub categories: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub guest_hosts: Option<Vec<String>>,
    pub content_warnings: Option<Vec<String>>,
    pub is_live: bool,
    pub is_rerun: bool,
    pub chapters: Option<Vec<Chapter>>,
    pub related_links: Option<Vec<String>>,
}

/// Output of the feed normalizer before it is cached or wrapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFeed {
    pub podcast: PodcastInfo,
    pub episodes: Vec<Episode>,
    pub parsing_issues: Vec<String>,
}

/// Response for an episodes request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodesResponse {
    pub podcast: PodcastInfo,
    pub episodes: Vec<Episode>,
    pub count: usize,
    pub feed_url: String,
    pub cached: bool,
    pub cache_timestamp: i64,
    pub parsing_issues: Option<Vec<String>>,
}

/// One podcast returned by the search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Podcast {
    pub podcast_name: String,
    pub feed_url: String,
    pub artwork: Option<String>,
    pub artist_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub podcasts: Vec<Podcast>,
    pub count: usize,
    pub search_term: String,
}

/// Per-entry cache diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryStatus {
    pub url: String,
    pub episode_count: usize,
    pub timestamp: i64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub cache_size: usize,
    pub entries: Vec<CacheEntryStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCleared {
    pub message: String,
    pub cleared_entries: usize,
}

/// Converts an accumulated list into the "null when empty" representation.
pub fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
