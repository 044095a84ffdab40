// ABOUTME: Safe field extraction over loosely-typed feed attributes.
// ABOUTME: Reconciles href/term/value containers, lists and scalars into plain strings, ints and bools.

use thiserror::Error;

use crate::fields::{FieldSource, FieldValue};

/// Accessors tried, in order, on an object-shaped value.
const SCALAR_ACCESSORS: [&str; 3] = ["href", "term", "value"];

/// Unexpected shape found while extracting a field.
///
/// Absent or empty fields are not errors; they surface as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// An object carried none of the scalar accessors.
    #[error("field `{field}` is an object without href, term or value")]
    NoScalar { field: String },

    /// A field expected to hold objects held something else.
    #[error("field `{field}` holds {found} where objects were expected")]
    Shape { field: String, found: &'static str },
}

impl FieldError {
    fn no_scalar(field: &str) -> Self {
        FieldError::NoScalar {
            field: field.to_string(),
        }
    }
}

/// Extracts a string, distinguishing "absent" from an unexpected shape.
pub fn try_get<S: FieldSource + ?Sized>(
    source: &S,
    name: &str,
) -> Result<Option<String>, FieldError> {
    match source.field(name) {
        Some(value) => scalar(value, name),
        None => Ok(None),
    }
}

/// Best-effort string extraction; any problem yields `None`.
pub fn get<S: FieldSource + ?Sized>(source: &S, name: &str) -> Option<String> {
    try_get(source, name).ok().flatten()
}

/// Best-effort string extraction with a default.
pub fn get_or<S: FieldSource + ?Sized>(source: &S, name: &str, default: &str) -> String {
    get(source, name).unwrap_or_else(|| default.to_string())
}

/// Extracts an integer. Non-numeric values count as absent.
pub fn try_get_int<S: FieldSource + ?Sized>(
    source: &S,
    name: &str,
) -> Result<Option<i64>, FieldError> {
    Ok(try_get(source, name)?.and_then(|v| v.trim().parse::<i64>().ok()))
}

pub fn get_int<S: FieldSource + ?Sized>(source: &S, name: &str, default: Option<i64>) -> Option<i64> {
    try_get_int(source, name).ok().flatten().or(default)
}

/// Extracts a flag: `Some(true)` for yes/true/1 in any case, `None` otherwise.
pub fn try_get_bool<S: FieldSource + ?Sized>(
    source: &S,
    name: &str,
) -> Result<Option<bool>, FieldError> {
    Ok(try_get(source, name)?.and_then(|v| is_truthy(&v).then_some(true)))
}

pub fn get_bool<S: FieldSource + ?Sized>(
    source: &S,
    name: &str,
    default: Option<bool>,
) -> Option<bool> {
    try_get_bool(source, name).ok().flatten().or(default)
}

/// Returns the object items held by a list-like field, in document order.
///
/// A lone object is treated as a one-element list; scalars are a shape error.
pub fn try_objects<'a, S: FieldSource + ?Sized>(
    source: &'a S,
    name: &str,
) -> Result<Vec<&'a FieldValue>, FieldError> {
    let Some(value) = source.field(name) else {
        return Ok(Vec::new());
    };

    match value {
        FieldValue::Object(_) => Ok(vec![value]),
        FieldValue::List(items) => {
            if let Some(bad) = items.iter().find(|v| !matches!(v, FieldValue::Object(_))) {
                return Err(FieldError::Shape {
                    field: name.to_string(),
                    found: bad.kind(),
                });
            }
            Ok(items.iter().collect())
        }
        FieldValue::Text(_) => Err(FieldError::Shape {
            field: name.to_string(),
            found: value.kind(),
        }),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "yes" | "true" | "1")
}

/// Resolves a value to a non-empty scalar string.
fn scalar(value: &FieldValue, name: &str) -> Result<Option<String>, FieldError> {
    match value {
        FieldValue::Text(s) => Ok(non_empty(s)),
        FieldValue::Object(fields) => {
            for accessor in SCALAR_ACCESSORS {
                if let Some(inner) = fields.field(accessor) {
                    return match inner {
                        FieldValue::Text(s) => Ok(non_empty(s)),
                        nested => scalar(nested, name),
                    };
                }
            }
            Err(FieldError::no_scalar(name))
        }
        FieldValue::List(items) => match items.first() {
            Some(first) => scalar(first, name),
            None => Ok(None),
        },
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
