// ABOUTME: Integration tests for parsing and normalizing complete podcast feeds.
// ABOUTME: Covers iTunes/Podlove/Podcasting 2.0 metadata, Atom feeds, malformed XML and JSON Feed input.

use pretty_assertions::assert_eq;
use rewise_feed::{normalize_feed_bytes, Chapter, FeedError, MAX_EPISODES};

const FEED_URL: &str = "https://feeds.example.com/show.xml";

const PODCAST_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
     xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd"
     xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:atom="http://www.w3.org/2005/Atom"
     xmlns:psc="http://podlove.org/simple-chapters"
     xmlns:podcast="https://podcastindex.org/namespace/1.0"
     xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Systems &amp; Stories</title>
    <link>https://show.example.com</link>
    <description>Conversations about "systems".</description>
    <itunes:image href="https://show.example.com/cover.jpg"/>
    <item>
      <title>Live at RustConf</title>
      <link>https://show.example.com/ep/42</link>
      <guid>ep-42</guid>
      <pubDate>Tue, 10 Sep 2024 08:00:00 +0000</pubDate>
      <description>Short summary</description>
      <content:encoded><![CDATA[<p>Notes: https://rust-lang.org and https://show.example.com/ep/42/notes</p>]]></content:encoded>
      <enclosure url="https://cdn.example.com/42.mp3" length="52428800" type="audio/mpeg"/>
      <itunes:duration>1:02:03</itunes:duration>
      <itunes:episode>42</itunes:episode>
      <itunes:season>3</itunes:season>
      <itunes:explicit>yes</itunes:explicit>
      <itunes:episodeType>full</itunes:episodeType>
      <itunes:keywords>rust, conference</itunes:keywords>
      <itunes:author>Ada Guest</itunes:author>
      <category>Technology</category>
      <podcast:transcript url="https://show.example.com/ep/42.vtt" type="text/vtt"/>
      <atom:link rel="show-notes" href="https://show.example.com/ep/42/notes"/>
      <media:content url="https://show.example.com/ep/42.jpg" medium="image"/>
      <psc:chapters version="1.2">
        <psc:chapter start="00:00:00" title="Intro"/>
        <psc:chapter start="00:05:00" title="Talk"/>
      </psc:chapters>
    </item>
    <item>
      <title>Encore: First Episode</title>
      <description>From the archive</description>
      <enclosure url="https://cdn.example.com/1.m4a" length="1000" type="audio/x-m4a"/>
      <itunes:episodeType>RERUN</itunes:episodeType>
      <itunes:explicit>no</itunes:explicit>
    </item>
    <item>
      <title>Blog post only</title>
      <link>https://show.example.com/blog</link>
    </item>
  </channel>
</rss>"#;

#[test]
fn test_full_podcast_feed() {
    let feed = normalize_feed_bytes(PODCAST_RSS.as_bytes(), FEED_URL, MAX_EPISODES).unwrap();

    assert_eq!(feed.podcast.title, "Systems & Stories");
    assert_eq!(feed.podcast.description, "Conversations about systems.");
    assert_eq!(
        feed.podcast.artwork.as_deref(),
        Some("https://show.example.com/cover.jpg")
    );
    assert!(feed.parsing_issues.is_empty(), "{:?}", feed.parsing_issues);
    assert_eq!(feed.episodes.len(), 2);

    let live = &feed.episodes[0];
    assert_eq!(live.title, "Live at RustConf");
    assert_eq!(live.audio_url, "https://cdn.example.com/42.mp3");
    assert_eq!(
        live.pub_date.as_deref(),
        Some("Tue, 10 Sep 2024 08:00:00 +0000")
    );
    assert!(live.description.starts_with("pNotes: https://rust-lang.org"));
    assert_eq!(live.duration.as_deref(), Some("1:02:03"));
    assert_eq!(live.duration_seconds, Some(3723));
    assert_eq!(live.episode_link.as_deref(), Some("https://show.example.com/ep/42"));
    assert_eq!(live.image.as_deref(), Some("https://show.example.com/ep/42.jpg"));
    assert_eq!(live.episode_number, Some(42));
    assert_eq!(live.season, Some(3));
    assert_eq!(live.explicit, Some(true));
    assert_eq!(live.file_size.as_deref(), Some("52428800"));
    assert_eq!(live.format.as_deref(), Some("audio/mpeg"));
    assert!(live.has_transcript);
    assert_eq!(
        live.transcript_url.as_deref(),
        Some("https://show.example.com/ep/42.vtt")
    );
    assert_eq!(
        live.show_notes_url.as_deref(),
        Some("https://show.example.com/ep/42/notes")
    );
    assert_eq!(live.categories, Some(vec!["Technology".to_string()]));
    assert_eq!(
        live.keywords,
        Some(vec!["rust".to_string(), "conference".to_string()])
    );
    assert_eq!(live.guest_hosts, Some(vec!["Ada Guest".to_string()]));
    assert_eq!(live.content_warnings, Some(vec!["explicit".to_string()]));
    assert!(live.is_live);
    assert!(!live.is_rerun);
    assert_eq!(
        live.chapters,
        Some(vec![
            Chapter {
                title: "Intro".into(),
                start: "00:00:00".into(),
                end: String::new(),
            },
            Chapter {
                title: "Talk".into(),
                start: "00:05:00".into(),
                end: String::new(),
            },
        ])
    );
    assert_eq!(
        live.related_links,
        Some(vec![
            "https://rust-lang.org".to_string(),
            "https://show.example.com/ep/42/notes/p".to_string(),
        ])
    );

    let rerun = &feed.episodes[1];
    assert_eq!(rerun.title, "Encore: First Episode");
    assert!(rerun.is_rerun);
    assert!(!rerun.is_live);
    assert_eq!(rerun.explicit, None);
    assert_eq!(rerun.content_warnings, None);
    assert_eq!(rerun.description, "From the archive");
    // No episode image, so the podcast artwork is used
    assert_eq!(
        rerun.image.as_deref(),
        Some("https://show.example.com/cover.jpg")
    );
    assert_eq!(rerun.episode_link, None);
}

#[test]
fn test_atom_podcast_feed() {
    let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Cast</title>
  <subtitle>Audio in Atom</subtitle>
  <logo>https://atom.example.com/logo.png</logo>
  <entry>
    <title>Pilot</title>
    <id>urn:uuid:1</id>
    <updated>2024-05-01T12:00:00Z</updated>
    <summary>The first one</summary>
    <link rel="alternate" href="https://atom.example.com/pilot"/>
    <link rel="enclosure" type="audio/ogg" length="2048" href="https://atom.example.com/pilot.ogg"/>
    <category term="Science"/>
  </entry>
</feed>"#;

    let feed = normalize_feed_bytes(atom.as_bytes(), FEED_URL, MAX_EPISODES).unwrap();
    assert_eq!(feed.podcast.title, "Atom Cast");
    assert_eq!(feed.podcast.description, "Audio in Atom");
    assert_eq!(
        feed.podcast.artwork.as_deref(),
        Some("https://atom.example.com/logo.png")
    );

    let pilot = &feed.episodes[0];
    assert_eq!(pilot.audio_url, "https://atom.example.com/pilot.ogg");
    assert_eq!(pilot.format.as_deref(), Some("audio/ogg"));
    assert_eq!(pilot.file_size.as_deref(), Some("2048"));
    assert_eq!(pilot.pub_date.as_deref(), Some("2024-05-01T12:00:00Z"));
    assert_eq!(pilot.episode_link.as_deref(), Some("https://atom.example.com/pilot"));
    assert_eq!(pilot.description, "The first one");
    assert_eq!(pilot.categories, Some(vec!["Science".to_string()]));
}

#[test]
fn test_truncated_feed_keeps_recovered_episodes() {
    let truncated = r#"<rss version="2.0"><channel><title>Cut Off</title>
<item><title>Complete</title><enclosure url="https://cdn.example.com/a.mp3" type="audio/mpeg"/></item>
<item><title>Partial</title><enclosure url="https://cdn.example.com/b.mp3" type="audio/mpeg"/>"#;

    let feed = normalize_feed_bytes(truncated.as_bytes(), FEED_URL, MAX_EPISODES).unwrap();
    assert_eq!(feed.podcast.title, "Cut Off");
    assert!(!feed.episodes.is_empty());
    assert_eq!(feed.episodes[0].title, "Complete");
    assert!(feed.parsing_issues[0].starts_with("Feed parsing warnings: "));
}

#[test]
fn test_unusable_documents() {
    let empty_channel = r#"<rss version="2.0"><channel><title>Nothing</title></channel></rss>"#;
    assert_eq!(
        normalize_feed_bytes(empty_channel.as_bytes(), FEED_URL, MAX_EPISODES),
        Err(FeedError::Empty)
    );

    let html = "<html><body><p>not a feed</p></body></html>";
    assert_eq!(
        normalize_feed_bytes(html.as_bytes(), FEED_URL, MAX_EPISODES),
        Err(FeedError::invalid("invalid RSS feed structure"))
    );
}

#[test]
fn test_json_feed_with_attachments() {
    let json = r#"{
        "version": "https://jsonfeed.org/version/1.1",
        "title": "JSON Cast",
        "home_page_url": "https://json.example.com/",
        "description": "A JSON Feed podcast",
        "items": [
            {
                "id": "1",
                "title": "Episode One",
                "content_text": "Listen now",
                "url": "https://json.example.com/1",
                "date_published": "2024-02-01T10:00:00Z",
                "attachments": [
                    {
                        "url": "https://json.example.com/1.mp3",
                        "mime_type": "audio/mpeg",
                        "size_in_bytes": 4096
                    }
                ]
            }
        ]
    }"#;

    let feed = normalize_feed_bytes(json.as_bytes(), FEED_URL, MAX_EPISODES).unwrap();
    assert_eq!(feed.podcast.title, "JSON Cast");
    assert_eq!(feed.episodes.len(), 1);
    let episode = &feed.episodes[0];
    assert_eq!(episode.title, "Episode One");
    assert_eq!(episode.audio_url, "https://json.example.com/1.mp3");
    assert_eq!(episode.format.as_deref(), Some("audio/mpeg"));
}

#[test]
fn test_hostile_duration_does_not_stall_normalization() {
    let rss = r#"<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
<channel><title>Hostile</title>
<item>
  <title>Bomb</title>
  <enclosure url="https://cdn.example.com/bomb.mp3" type="audio/mpeg"/>
  <itunes:duration>1e10000000s</itunes:duration>
  <link>https://user:pw@show.example.com/ep</link>
</item>
</channel></rss>"#;

    let started = std::time::Instant::now();
    let feed = normalize_feed_bytes(rss.as_bytes(), FEED_URL, MAX_EPISODES).unwrap();
    assert!(started.elapsed() < std::time::Duration::from_secs(1));

    let episode = &feed.episodes[0];
    assert_eq!(episode.duration.as_deref(), Some("1e10000000s"));
    assert_eq!(episode.duration_seconds, None);
    assert_eq!(episode.episode_link, None);
}
