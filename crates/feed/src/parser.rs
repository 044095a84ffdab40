// ABOUTME: Builds the loosely-typed FeedDocument from raw feed bytes.
// ABOUTME: XML (RSS 0.9x/1.0/2.0, Atom) goes through the lenient reader, JSON Feed through feed-rs.

use feed_rs::model::{Entry, Feed as FeedRsFeed, Link};
use tracing::debug;

use crate::fields::{FeedDocument, FieldSource, FieldValue, Fields};
use crate::raw_xml::{parse_lenient, XmlElement};

/// Parses feed bytes into a FeedDocument.
///
/// Never fails: malformed input produces whatever structure could be
/// recovered, with `FeedDocument::malformed` describing the problem.
///
/// # Arguments
/// * `data` - Raw feed bytes (RSS, Atom, or JSON Feed)
pub fn parse_feed_bytes(data: &[u8]) -> FeedDocument {
    if looks_like_json(data) {
        return parse_json_feed(data);
    }

    let tree = parse_lenient(data);
    let mut document = match tree.root {
        Some(ref root) => document_from_xml(root),
        None => FeedDocument::default(),
    };
    if document.malformed.is_none() {
        document.malformed = tree.error;
    }
    document
}

fn looks_like_json(data: &[u8]) -> bool {
    let body = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'{')
        .unwrap_or(false)
}

// ----------------------------------------------------------------------------
// XML
// ----------------------------------------------------------------------------

/// Locates channel and entries for the three XML root shapes.
fn document_from_xml(root: &XmlElement) -> FeedDocument {
    let root_name = root.local_name();
    let (channel_el, entry_parent) = match root_name.as_str() {
        // RSS 2.0: entries live inside <channel>
        "rss" => {
            let channel = root.child("channel");
            (channel, channel)
        }
        // RSS 1.0 (RDF): <item> elements are siblings of <channel>
        "rdf" => (root.child("channel"), Some(root)),
        "feed" => (Some(root), Some(root)),
        other => {
            debug!(root = other, "document root is not a feed element");
            return FeedDocument {
                malformed: Some(format!("document root <{other}> is not a feed")),
                ..Default::default()
            };
        }
    };

    let channel = channel_el
        .map(channel_fields)
        .filter(|fields| !fields.is_empty());

    let entries = entry_parent
        .map(|parent| {
            parent
                .children
                .iter()
                .filter(|c| matches!(c.local_name().as_str(), "item" | "entry"))
                .map(|c| FieldValue::Object(entry_fields(c)))
                .collect()
        })
        .unwrap_or_default();

    FeedDocument {
        channel,
        entries,
        malformed: None,
    }
}

/// Attribute key for an element: `prefix_local`, lower-cased.
fn field_key(name: &str) -> String {
    name.to_lowercase().replace(':', "_")
}

/// Generic element conversion: bare text stays text, anything with
/// attributes or children becomes an object (text under `value`).
fn element_value(el: &XmlElement) -> FieldValue {
    if el.attrs.is_empty() && el.children.is_empty() {
        return FieldValue::Text(el.trimmed_text().to_string());
    }

    let mut fields = Fields::new();
    for (key, value) in &el.attrs {
        if key.starts_with("xmlns") {
            continue;
        }
        fields.insert(field_key(key), FieldValue::Text(value.clone()));
    }
    for child in &el.children {
        fields.append(field_key(&child.name), element_value(child));
    }
    let text = el.trimmed_text();
    if !text.is_empty() {
        fields.insert_if_absent("value", FieldValue::Text(text.to_string()));
    }
    FieldValue::Object(fields)
}

fn channel_fields(channel: &XmlElement) -> Fields {
    let mut fields = Fields::new();

    for child in &channel.children {
        let key = field_key(&child.name);
        match key.as_str() {
            // Entries are collected separately
            "item" | "entry" => {}
            // RSS <image><url>...</url></image>
            "image" => {
                let href = child
                    .child("url")
                    .map(|u| u.trimmed_text().to_string())
                    .or_else(|| child.attr("href").map(String::from))
                    .unwrap_or_else(|| child.trimmed_text().to_string());
                fields.insert_if_absent("image", href_object(href));
            }
            // Atom <logo> and <icon> carry the URL as text
            "logo" | "icon" => {
                fields.insert_if_absent("image", href_object(child.trimmed_text().to_string()));
            }
            "subtitle" => {
                fields.insert_if_absent("subtitle", element_value(child));
            }
            "link" | "atom_link" => {
                push_link(&mut fields, child);
            }
            _ => fields.append(key, element_value(child)),
        }
    }

    // Atom feeds describe themselves with <subtitle>
    if !fields.has_field("description") {
        if let Some(subtitle) = fields.remove("subtitle") {
            fields.insert("description", subtitle);
        }
    }

    fields
}

fn entry_fields(item: &XmlElement) -> Fields {
    let mut fields = Fields::new();

    for child in &item.children {
        let key = field_key(&child.name);
        match key.as_str() {
            "enclosure" => {
                fields.push("enclosures", enclosure_from_attrs(child));
            }
            "link" | "atom_link" => {
                push_link(&mut fields, child);
            }
            "category" => {
                let term = child
                    .attr("term")
                    .map(String::from)
                    .unwrap_or_else(|| child.trimmed_text().to_string());
                if !term.is_empty() {
                    let mut tag = Fields::new();
                    tag.insert("term", FieldValue::Text(term));
                    if let Some(scheme) = child.attr("scheme").or_else(|| child.attr("domain")) {
                        tag.insert("scheme", FieldValue::text(scheme));
                    }
                    fields.push("tags", FieldValue::Object(tag));
                }
            }
            "content_encoded" | "content" => {
                let mut content = Fields::new();
                content.insert("value", FieldValue::text(child.trimmed_text()));
                let kind = child.attr("type").unwrap_or("text/html");
                content.insert("type", FieldValue::text(kind));
                fields.push("content", FieldValue::Object(content));
            }
            "pubdate" => {
                fields.insert_if_absent("published", FieldValue::text(child.trimmed_text()));
            }
            "dc_date" => {
                fields.insert_if_absent("updated", FieldValue::text(child.trimmed_text()));
            }
            "dc_language" => {
                fields.insert_if_absent("language", FieldValue::text(child.trimmed_text()));
            }
            "guid" => {
                fields.insert_if_absent("id", FieldValue::text(child.trimmed_text()));
            }
            "media_content" => {
                fields.push("media_content", element_value(child));
            }
            // <media:group> wraps alternative renditions
            "media_group" => {
                for inner in &child.children {
                    if field_key(&inner.name) == "media_content" {
                        fields.push("media_content", element_value(inner));
                    }
                }
            }
            "psc_chapters" => {
                let chapters: Vec<FieldValue> = child
                    .children
                    .iter()
                    .filter(|c| c.local_name() == "chapter")
                    .map(element_value)
                    .collect();
                fields.insert("psc_chapters", FieldValue::List(chapters));
            }
            // Podcasting 2.0 transcripts behave like rel="transcript" links
            "podcast_transcript" => {
                if let Some(url) = child.attr("url") {
                    let mut link = Fields::new();
                    link.insert("rel", FieldValue::text("transcript"));
                    link.insert("href", FieldValue::text(url));
                    if let Some(kind) = child.attr("type") {
                        link.insert("type", FieldValue::text(kind));
                    }
                    fields.push("links", FieldValue::Object(link));
                }
            }
            _ => fields.append(key, element_value(child)),
        }
    }

    // RSS <description> doubles as the summary
    if !fields.has_field("summary") {
        if let Some(description) = fields.field("description").cloned() {
            fields.insert("summary", description);
        }
    }

    fields
}

fn href_object(href: String) -> FieldValue {
    let mut fields = Fields::new();
    fields.insert("href", FieldValue::Text(href));
    FieldValue::Object(fields)
}

fn enclosure_from_attrs(el: &XmlElement) -> FieldValue {
    let mut enclosure = Fields::new();
    if let Some(url) = el.attr("url").or_else(|| el.attr("href")) {
        enclosure.insert("href", FieldValue::text(url));
    }
    if let Some(kind) = el.attr("type") {
        enclosure.insert("type", FieldValue::text(kind));
    }
    if let Some(length) = el.attr("length") {
        enclosure.insert("length", FieldValue::text(length));
    }
    FieldValue::Object(enclosure)
}

/// Handles both RSS `<link>text</link>` and Atom `<link href rel type/>`.
///
/// Every link lands in `links`; `rel="enclosure"` links are also added to
/// `enclosures`, and the first alternate link becomes `link`.
fn push_link(fields: &mut Fields, el: &XmlElement) {
    let href = el
        .attr("href")
        .map(String::from)
        .unwrap_or_else(|| el.trimmed_text().to_string());
    if href.is_empty() {
        return;
    }
    let rel = el.attr("rel").unwrap_or("alternate").to_string();

    let mut link = Fields::new();
    link.insert("href", FieldValue::text(href.clone()));
    link.insert("rel", FieldValue::text(rel.clone()));
    if let Some(kind) = el.attr("type") {
        link.insert("type", FieldValue::text(kind));
    }
    if let Some(length) = el.attr("length") {
        link.insert("length", FieldValue::text(length));
    }
    if let Some(title) = el.attr("title") {
        link.insert("title", FieldValue::text(title));
    }
    let link = FieldValue::Object(link);

    if rel == "enclosure" {
        fields.push("enclosures", link.clone());
    } else if rel == "alternate" {
        fields.insert_if_absent("link", FieldValue::Text(href));
    }
    fields.push("links", link);
}

// ----------------------------------------------------------------------------
// JSON Feed
// ----------------------------------------------------------------------------

fn parse_json_feed(data: &[u8]) -> FeedDocument {
    match feed_rs::parser::parse(data) {
        Ok(feed) => document_from_feed_rs(&feed),
        Err(err) => FeedDocument {
            malformed: Some(err.to_string()),
            ..Default::default()
        },
    }
}

fn document_from_feed_rs(feed: &FeedRsFeed) -> FeedDocument {
    let mut channel = Fields::new();
    if let Some(ref title) = feed.title {
        channel.insert("title", FieldValue::text(title.content.clone()));
    }
    if let Some(ref description) = feed.description {
        channel.insert("description", FieldValue::text(description.content.clone()));
    }
    if let Some(image) = feed.logo.as_ref().or(feed.icon.as_ref()) {
        channel.insert("image", href_object(image.uri.clone()));
    }
    if let Some(ref language) = feed.language {
        channel.insert("language", FieldValue::text(language.clone()));
    }
    for link in &feed.links {
        channel.push("links", link_value(link));
    }
    if let Some(home) = extract_home_url(&feed.links) {
        channel.insert("link", FieldValue::Text(home));
    }

    let entries = feed
        .entries
        .iter()
        .map(|entry| FieldValue::Object(entry_from_feed_rs(entry)))
        .collect();

    FeedDocument {
        channel: Some(channel).filter(|c| !c.is_empty()),
        entries,
        malformed: None,
    }
}

fn entry_from_feed_rs(entry: &Entry) -> Fields {
    let mut fields = Fields::new();
    if !entry.id.is_empty() {
        fields.insert("id", FieldValue::text(entry.id.clone()));
    }
    if let Some(ref title) = entry.title {
        fields.insert("title", FieldValue::text(title.content.clone()));
    }
    if let Some(ref summary) = entry.summary {
        fields.insert("summary", FieldValue::text(summary.content.clone()));
    }
    if let Some(body) = entry.content.as_ref().and_then(|c| c.body.clone()) {
        fields.push("content", FieldValue::object([("value", body)]));
    }
    if let Some(published) = entry.published {
        fields.insert("published", FieldValue::text(published.to_rfc3339()));
    }
    if let Some(updated) = entry.updated {
        fields.insert("updated", FieldValue::text(updated.to_rfc3339()));
    }
    if let Some(ref language) = entry.language {
        fields.insert("language", FieldValue::text(language.clone()));
    }
    if let Some(home) = extract_home_url(&entry.links) {
        fields.insert("link", FieldValue::Text(home));
    }
    for link in &entry.links {
        let value = link_value(link);
        if is_enclosure_link(link) {
            fields.push("enclosures", value.clone());
        }
        fields.push("links", value);
    }
    for category in &entry.categories {
        fields.push("tags", FieldValue::object([("term", category.term.clone())]));
    }
    // JSON Feed attachments surface as media content
    for media in &entry.media {
        for content in &media.content {
            let Some(ref url) = content.url else {
                continue;
            };
            let mut enclosure = Fields::new();
            enclosure.insert("href", FieldValue::text(url.to_string()));
            if let Some(ref mime) = content.content_type {
                enclosure.insert("type", FieldValue::text(mime.to_string()));
            }
            if let Some(size) = content.size {
                enclosure.insert("length", FieldValue::text(size.to_string()));
            }
            fields.push("enclosures", FieldValue::Object(enclosure));
        }
    }
    fields
}

fn link_value(link: &Link) -> FieldValue {
    let mut fields = Fields::new();
    fields.insert("href", FieldValue::text(link.href.clone()));
    fields.insert(
        "rel",
        FieldValue::text(link.rel.clone().unwrap_or_else(|| "alternate".to_string())),
    );
    if let Some(ref media_type) = link.media_type {
        fields.insert("type", FieldValue::text(media_type.clone()));
    }
    if let Some(length) = link.length {
        fields.insert("length", FieldValue::text(length.to_string()));
    }
    FieldValue::Object(fields)
}

/// Checks if a link is an enclosure link (rel == "enclosure").
fn is_enclosure_link(link: &Link) -> bool {
    link.rel.as_deref() == Some("enclosure")
}

/// Prefers link with rel="alternate", otherwise the first non-enclosure link.
fn extract_home_url(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref() == Some("alternate"))
        .or_else(|| links.iter().find(|l| !is_enclosure_link(l)))
        .map(|l| l.href.clone())
}
