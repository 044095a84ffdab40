// ABOUTME: Loosely-typed feed document model shared by the XML and JSON parsers.
// ABOUTME: Values are scalars, attribute maps or ordered lists, queried through the FieldSource trait.

use std::collections::BTreeMap;

/// A single attribute value as it appeared in the source document.
///
/// The same logical field can arrive in any of these shapes depending on the
/// dialect (RSS, Atom, iTunes, Podcasting 2.0, JSON Feed).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Object(Fields),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Builds an object from `(name, text)` pairs.
    pub fn object<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> Self {
        let mut fields = Fields::new();
        for (name, value) in pairs {
            fields.insert(name, FieldValue::Text(value));
        }
        FieldValue::Object(fields)
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            FieldValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Short name of the shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Object(_) => "object",
            FieldValue::List(_) => "list",
        }
    }
}

/// Attribute map for a channel, an entry or any nested element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: BTreeMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.entries.insert(name.into(), value);
    }

    /// Sets `name` only when it is not present yet.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: FieldValue) {
        self.entries.entry(name.into()).or_insert(value);
    }

    /// Adds `value` under `name`, turning a repeated name into a list.
    pub fn append(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.entries.remove(&name) {
            None => {
                self.entries.insert(name, value);
            }
            Some(FieldValue::List(mut items)) => {
                items.push(value);
                self.entries.insert(name, FieldValue::List(items));
            }
            Some(existing) => {
                self.entries.insert(name, FieldValue::List(vec![existing, value]));
            }
        }
    }

    /// Appends to a list-valued field, creating the list on first use.
    pub fn push(&mut self, name: &str, value: FieldValue) {
        match self.entries.get_mut(name) {
            Some(FieldValue::List(items)) => items.push(value),
            Some(existing) => {
                let previous = std::mem::replace(existing, FieldValue::List(Vec::new()));
                *existing = FieldValue::List(vec![previous, value]);
            }
            None => {
                self.entries
                    .insert(name.to_string(), FieldValue::List(vec![value]));
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.entries.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Capability interface over a document node: "does it have this attribute,
/// and what is its value".
///
/// The extractor only ever talks to this trait, so it does not care whether
/// the node came from raw XML, from feed-rs or from a test fixture.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&FieldValue>;

    fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

impl FieldSource for Fields {
    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }
}

impl FieldSource for FieldValue {
    fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Object(fields) => fields.field(name),
            _ => None,
        }
    }
}

/// A parsed feed document: channel-level attributes plus ordered entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    /// Channel-level attributes; `None` when no channel/feed element was found.
    pub channel: Option<Fields>,
    /// Entries in document order. Normally objects, but kept loosely typed.
    pub entries: Vec<FieldValue>,
    /// Set when the parser hit malformed input and returned partial structure.
    pub malformed: Option<String>,
}
