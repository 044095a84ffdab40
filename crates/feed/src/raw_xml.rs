// ABOUTME: Lenient raw XML reader building a plain element tree with quick-xml.
// ABOUTME: Stops at the first syntax error and keeps everything read so far, reporting the error.

use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::reader::Reader;

/// One XML element with its attributes, accumulated text and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `itunes:duration`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Concatenated text and CDATA content, untrimmed.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Name without namespace prefix, lower-cased.
    pub fn local_name(&self) -> String {
        let local = self.name.rsplit(':').next().unwrap_or(&self.name);
        local.to_lowercase()
    }

    /// Attribute value by qualified name (case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// First direct child with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name() == local)
    }
}

/// Result of a lenient parse: the (possibly partial) root and the first error.
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    pub root: Option<XmlElement>,
    pub error: Option<String>,
}

/// Reads `data` into an element tree.
///
/// Mismatched end tags are tolerated. On a syntax error or premature end of
/// input, open elements are closed in place and the problem is reported in
/// `XmlTree::error`.
pub fn parse_lenient(data: &[u8]) -> XmlTree {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().check_end_names = false;

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut error: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                stack.push(start_element(e));
            }
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e);
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let raw = lossy(e);
                    let text = unescape(&raw).map(|t| t.into_owned()).unwrap_or(raw);
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&lossy(e));
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&resolve_reference(&lossy(e)));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                error = Some(format!("{} at position {}", e, reader.buffer_position()));
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() && error.is_none() {
        let open = stack
            .last()
            .map(|e| e.name.clone())
            .unwrap_or_default();
        error = Some(format!("unexpected end of document inside <{open}>"));
    }

    while let Some(element) = stack.pop() {
        attach(&mut stack, &mut root, element);
    }

    XmlTree { root, error }
}

fn start_element(e: &BytesStart) -> XmlElement {
    let name = lossy(e.name().as_ref());
    let attrs = e
        .attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = lossy(attr.key.as_ref());
            let raw = lossy(&attr.value);
            let value = unescape(&raw).map(|v| v.into_owned()).unwrap_or(raw);
            (key, value)
        })
        .collect();

    XmlElement {
        name,
        attrs,
        ..Default::default()
    }
}

/// Attaches a finished element to its parent, or makes it the root.
fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Resolves `&name;` references: character references and the XML predefined
/// entities. Unknown entities are kept verbatim.
fn resolve_reference(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(c) = parsed.and_then(char::from_u32) {
            return c.to_string();
        }
    } else if let Some(resolved) = resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{name};")
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
    <channel>
        <title>Show</title>
        <itunes:image href="https://example.com/a.jpg"/>
    </channel>
</rss>"#;
        let tree = parse_lenient(xml.as_bytes());
        assert!(tree.error.is_none());
        let root = tree.root.unwrap();
        assert_eq!(root.local_name(), "rss");
        let channel = root.child("channel").unwrap();
        assert_eq!(channel.child("title").unwrap().trimmed_text(), "Show");
        let image = channel.child("image").unwrap();
        assert_eq!(image.name, "itunes:image");
        assert_eq!(image.attr("href"), Some("https://example.com/a.jpg"));
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = r#"<item><title>Tom &amp; Jerry &#169;</title><d><![CDATA[<p>Hi</p>]]></d></item>"#;
        let root = parse_lenient(xml.as_bytes()).root.unwrap();
        assert_eq!(root.child("title").unwrap().trimmed_text(), "Tom & Jerry ©");
        assert_eq!(root.child("d").unwrap().trimmed_text(), "<p>Hi</p>");
    }

    #[test]
    fn test_unclosed_document_keeps_partial_tree() {
        let xml = r#"<rss><channel><title>Partial</title><item><title>One</title>"#;
        let tree = parse_lenient(xml.as_bytes());
        assert!(tree.error.is_some());
        let root = tree.root.unwrap();
        let channel = root.child("channel").unwrap();
        assert_eq!(channel.child("title").unwrap().trimmed_text(), "Partial");
        assert_eq!(
            channel.child("item").unwrap().child("title").unwrap().trimmed_text(),
            "One"
        );
    }

    #[test]
    fn test_mismatched_end_tag_tolerated() {
        let xml = r#"<rss><channel><title>T</titel><item><title>A</title></item></channel></rss>"#;
        let tree = parse_lenient(xml.as_bytes());
        let root = tree.root.unwrap();
        assert_eq!(root.local_name(), "rss");
        assert!(root.child("channel").is_some());
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(resolve_reference("nbsp"), "&nbsp;");
        assert_eq!(resolve_reference("lt"), "<");
        assert_eq!(resolve_reference("#x26"), "&");
    }
}
