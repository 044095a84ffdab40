// ABOUTME: Normalizes one raw feed entry into an Episode record.
// ABOUTME: Every field is extracted independently; shape problems become parsing issues, not failures.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::duration_parse::parse_duration_seconds;
use crate::extract::{
    get, get_or, try_get, try_get_bool, try_get_int, try_objects, FieldError,
};
use crate::fields::FieldValue;
use crate::models::{non_empty, Chapter, Episode};
use crate::sanitize::{sanitize, validate_url};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const DEFAULT_EPISODE_TITLE: &str = "Untitled";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

static URL_IN_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("valid url regex"));

/// Collects field-level problems for one entry and substitutes defaults.
struct StepLog<'a> {
    position: usize,
    issues: &'a mut Vec<String>,
}

impl StepLog<'_> {
    fn recover<T: Default>(&mut self, result: Result<T, FieldError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(episode = self.position, error = %err, "episode field skipped");
                self.issues
                    .push(format!("Episode {} field issue: {}", self.position, err));
                T::default()
            }
        }
    }
}

/// Normalizes one entry.
///
/// Returns `Ok(None)` when the entry has no usable audio enclosure; such
/// entries are dropped from results. `Err` means the entry itself is not an
/// attribute object and nothing could be read from it.
///
/// # Arguments
/// * `entry` - Raw entry from the feed document
/// * `position` - 1-based position of the entry, used in issue messages
/// * `fallback_artwork` - Validated podcast artwork used when the entry has no image
/// * `issues` - Sink for non-fatal parsing issues
pub fn normalize_episode(
    entry: &FieldValue,
    position: usize,
    fallback_artwork: Option<&str>,
    issues: &mut Vec<String>,
) -> Result<Option<Episode>, FieldError> {
    if entry.as_object().is_none() {
        return Err(FieldError::Shape {
            field: "entry".to_string(),
            found: entry.kind(),
        });
    }
    let mut log = StepLog { position, issues };

    // Audio: first audio/* enclosure, kept only if its URL validates
    let audio_enclosure = log.recover(first_audio_enclosure(entry));
    let Some(audio_url) = audio_enclosure
        .and_then(|enc| get(enc, "href"))
        .filter(|url| validate_url(url))
    else {
        debug!(episode = position, "episode dropped: no valid audio enclosure");
        return Ok(None);
    };

    let raw_title = log.recover(try_get(entry, "title"));
    let title = Some(sanitize(raw_title.as_deref().unwrap_or_default(), MAX_TITLE_LENGTH))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_EPISODE_TITLE.to_string());

    let description = sanitize(
        &log.recover(description_text(entry)).unwrap_or_default(),
        MAX_DESCRIPTION_LENGTH,
    );

    let pub_date = match log.recover(try_get(entry, "published")) {
        Some(published) => Some(published),
        None => log.recover(try_get(entry, "updated")),
    };

    let duration = log.recover(try_get(entry, "itunes_duration"));
    let duration_seconds = duration.as_deref().and_then(parse_duration_seconds);

    let episode_link = log
        .recover(try_get(entry, "link"))
        .filter(|url| validate_url(url));

    let image = log
        .recover(media_image(entry))
        .or_else(|| fallback_artwork.map(String::from))
        .filter(|url| validate_url(url));

    let episode_number = log.recover(try_get_int(entry, "itunes_episode"));
    let season = log.recover(try_get_int(entry, "itunes_season"));
    let explicit = log.recover(try_get_bool(entry, "itunes_explicit"));
    let language = log.recover(try_get(entry, "language"));

    // Size and format come from the same enclosure whether or not its URL validated
    let file_size = audio_enclosure.and_then(|enc| get(enc, "length"));
    let audio_format = audio_enclosure.and_then(|enc| get(enc, "type"));

    let rel_links = log.recover(rel_links(entry));
    let has_transcript = rel_links.transcript.is_some();
    let transcript_url = rel_links.transcript.filter(|url| validate_url(url));
    let show_notes_url = rel_links.show_notes.filter(|url| validate_url(url));

    let categories = log.recover(tag_terms(entry));
    let keywords = log
        .recover(try_get(entry, "itunes_keywords"))
        .map(|raw| split_keywords(&raw))
        .unwrap_or_default();
    let guest_hosts: Vec<String> = log
        .recover(try_get(entry, "itunes_author"))
        .into_iter()
        .collect();

    let content_warnings = if explicit == Some(true) {
        vec!["explicit".to_string()]
    } else {
        Vec::new()
    };

    let episode_type = log
        .recover(try_get(entry, "itunes_episodetype"))
        .unwrap_or_default()
        .to_lowercase();
    let (is_live, is_rerun) = classify_episode_type(&episode_type, raw_title.as_deref());

    let chapters = log.recover(chapters(entry));
    let related_links = related_links(&description);

    let description = if description.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        description
    };

    Ok(Some(Episode {
        title,
        description,
        pub_date,
        audio_url,
        duration,
        duration_seconds,
        episode_link,
        image,
        episode_number,
        season,
        explicit,
        language,
        file_size,
        audio_quality: audio_format.clone(),
        format: audio_format,
        has_transcript,
        transcript_url,
        show_notes_url,
        categories: non_empty(categories),
        keywords: non_empty(keywords),
        guest_hosts: non_empty(guest_hosts),
        content_warnings: non_empty(content_warnings),
        is_live,
        is_rerun,
        chapters: non_empty(chapters),
        related_links: non_empty(related_links),
    }))
}

/// First enclosure declaring an `audio/` type; later audio enclosures are
/// never considered, even when the first one's URL is unusable.
fn first_audio_enclosure(entry: &FieldValue) -> Result<Option<&FieldValue>, FieldError> {
    Ok(try_objects(entry, "enclosures")?.into_iter().find(|enc| {
        get(*enc, "type")
            .map(|t| t.starts_with("audio/"))
            .unwrap_or(false)
    }))
}

/// `content[0].value`, else `summary`, else `description`.
fn description_text(entry: &FieldValue) -> Result<Option<String>, FieldError> {
    if let Some(first) = try_objects(entry, "content")?.first() {
        if let Some(value) = try_get(*first, "value")? {
            return Ok(Some(value));
        }
    }
    if let Some(summary) = try_get(entry, "summary")? {
        return Ok(Some(summary));
    }
    try_get(entry, "description")
}

/// First `media:content` with `medium="image"` and a valid URL.
fn media_image(entry: &FieldValue) -> Result<Option<String>, FieldError> {
    Ok(try_objects(entry, "media_content")?
        .into_iter()
        .filter(|media| get(*media, "medium").as_deref() == Some("image"))
        .filter_map(|media| get(media, "url"))
        .find(|url| validate_url(url)))
}

#[derive(Debug, Default)]
struct RelLinks {
    transcript: Option<String>,
    show_notes: Option<String>,
}

/// Scans entry links for transcript and show-notes relations; the last
/// matching link of each kind wins.
fn rel_links(entry: &FieldValue) -> Result<RelLinks, FieldError> {
    let mut found = RelLinks::default();
    for link in try_objects(entry, "links")? {
        match get(link, "rel").as_deref() {
            Some("transcript") => {
                if let Some(href) = get(link, "href") {
                    found.transcript = Some(href);
                }
            }
            Some("show-notes") => {
                if let Some(href) = get(link, "href") {
                    found.show_notes = Some(href);
                }
            }
            _ => {}
        }
    }
    Ok(found)
}

fn tag_terms(entry: &FieldValue) -> Result<Vec<String>, FieldError> {
    Ok(try_objects(entry, "tags")?
        .into_iter()
        .filter_map(|tag| get(tag, "term"))
        .collect())
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(String::from)
        .collect()
}

/// Returns `(is_live, is_rerun)`.
///
/// Heuristic: "rerun" episode type marks a rerun; a "full" episode whose
/// title mentions "live" counts as live.
fn classify_episode_type(episode_type: &str, title: Option<&str>) -> (bool, bool) {
    if episode_type.is_empty() {
        return (false, false);
    }
    let title = title.unwrap_or_default().to_lowercase();
    let is_live = episode_type == "full" && title.contains("live");
    let is_rerun = episode_type == "rerun";
    (is_live, is_rerun)
}

fn chapters(entry: &FieldValue) -> Result<Vec<Chapter>, FieldError> {
    Ok(try_objects(entry, "psc_chapters")?
        .into_iter()
        .map(|chapter| Chapter {
            title: get_or(chapter, "title", ""),
            start: get_or(chapter, "start", ""),
            end: get_or(chapter, "end", ""),
        })
        .collect())
}

/// URLs mentioned in the text that pass validation, in order, duplicates kept.
fn related_links(text: &str) -> Vec<String> {
    URL_IN_TEXT_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|url| validate_url(url))
        .map(String::from)
        .collect()
}
