// ABOUTME: Input sanitization and URL validation applied to every value taken from a feed.
// ABOUTME: Strips the minimal unsafe character set and checks http(s) URLs for a plausible domain.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Longest host accepted by `validate_url`.
pub const MAX_HOST_LENGTH: usize = 253;

static DOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid domain regex"));

/// Removes `<`, `>`, `"` and `'`, trims surrounding whitespace and truncates
/// to `max_len` characters.
///
/// Trailing whitespace exposed by the truncation is trimmed as well, so
/// `sanitize(sanitize(x, n), n) == sanitize(x, n)`.
pub fn sanitize(text: &str, max_len: usize) -> String {
    if text.is_empty() {
        return String::new();
    }

    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect();

    let truncated: String = stripped.trim().chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

/// Returns true if `s` is an absolute http(s) URL whose host looks like a domain name.
///
/// The string must already be in canonical form: it starts with `http://` or
/// `https://`, carries no whitespace, control characters or credentials.
/// IP literals, single-label hosts and hosts over 253 characters are rejected.
pub fn validate_url(s: &str) -> bool {
    let lower_prefix: String = s.chars().take(8).collect::<String>().to_ascii_lowercase();
    if !lower_prefix.starts_with("http://") && !lower_prefix.starts_with("https://") {
        return false;
    }
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let Ok(parsed) = Url::parse(s) else {
        return false;
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return false;
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() && host.len() <= MAX_HOST_LENGTH => DOMAIN_RE.is_match(host),
        _ => false,
    }
}
