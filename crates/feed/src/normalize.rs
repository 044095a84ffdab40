// ABOUTME: Turns a parsed feed document into podcast info plus a capped list of normalized episodes.
// ABOUTME: Malformed documents and per-entry failures are reported as parsing issues, never aborting the batch.

use tracing::{debug, warn};

use crate::episode::{normalize_episode, DEFAULT_DESCRIPTION, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use crate::error::FeedError;
use crate::extract::get;
use crate::fields::{FeedDocument, Fields};
use crate::models::{NormalizedFeed, PodcastInfo};
use crate::sanitize::{sanitize, validate_url};

/// Entries considered per feed; later entries are ignored.
pub const MAX_EPISODES: usize = 20;

pub const DEFAULT_PODCAST_TITLE: &str = "Unknown Podcast";

/// Normalizes a parsed document.
///
/// Fails only when the document is unusable: no channel information or no
/// entries at all. A feed whose entries all lack audio is still a success,
/// with an empty episode list.
pub fn normalize_feed(
    document: &FeedDocument,
    feed_url: &str,
    max_episodes: usize,
) -> Result<NormalizedFeed, FeedError> {
    let mut parsing_issues = Vec::new();

    if let Some(problem) = &document.malformed {
        warn!(error = %problem, "feed parsed with warnings");
        parsing_issues.push(format!("Feed parsing warnings: {problem}"));
    }

    let Some(channel) = &document.channel else {
        return Err(FeedError::invalid("invalid RSS feed structure"));
    };
    if document.entries.is_empty() {
        return Err(FeedError::Empty);
    }

    let podcast = podcast_info(channel);

    let mut episodes = Vec::new();
    for (index, entry) in document.entries.iter().take(max_episodes).enumerate() {
        match normalize_episode(entry, index + 1, podcast.artwork.as_deref(), &mut parsing_issues) {
            Ok(Some(episode)) => episodes.push(episode),
            Ok(None) => {}
            Err(err) => {
                warn!(episode = index + 1, error = %err, "episode skipped");
                parsing_issues.push(format!("Episode parsing error: {err}"));
            }
        }
    }

    debug!(
        feed_host = host_of(feed_url),
        entries = document.entries.len(),
        episodes = episodes.len(),
        issues = parsing_issues.len(),
        "feed normalized"
    );

    Ok(NormalizedFeed {
        podcast,
        episodes,
        parsing_issues,
    })
}

/// Podcast-level title, description and artwork from the channel.
pub fn podcast_info(channel: &Fields) -> PodcastInfo {
    let title = Some(sanitize(&get(channel, "title").unwrap_or_default(), MAX_TITLE_LENGTH))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_PODCAST_TITLE.to_string());

    let description = Some(sanitize(
        &get(channel, "description").unwrap_or_default(),
        MAX_DESCRIPTION_LENGTH,
    ))
    .filter(|d| !d.is_empty())
    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let artwork = get(channel, "image")
        .or_else(|| get(channel, "itunes_image"))
        .filter(|url| validate_url(url));

    PodcastInfo {
        title,
        description,
        artwork,
    }
}

fn host_of(feed_url: &str) -> String {
    url::Url::parse(feed_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_default()
}
