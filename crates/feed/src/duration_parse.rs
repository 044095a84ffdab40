// ABOUTME: Converts iTunes episode durations into whole seconds.
// ABOUTME: Accepts plain seconds, clock notation (H:MM:SS, MM:SS) and unit strings such as "1h30m".

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest duration string considered at all.
const MAX_DURATION_INPUT: usize = 64;

/// Up to three `<digits><unit>` groups; anything else never reaches
/// `parse_duration`, whose cost grows with exponents and digit counts.
static UNIT_DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d{1,6}\s*(h|hrs?|hours?|m|mins?|minutes?|s|secs?|seconds?)\s*){1,3}$",
    )
    .expect("valid duration regex")
});

/// Parses an `itunes:duration` value into seconds.
///
/// Fractional seconds are truncated ("1830.6" and "30:30.6" are 1830).
/// Returns `None` for anything else, including values that overflow `u32`.
pub fn parse_duration_seconds(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() || s.len() > MAX_DURATION_INPUT {
        return None;
    }

    if s.contains(':') {
        return parse_clock(s);
    }

    if let Some(secs) = parse_seconds(s) {
        return u32::try_from(secs).ok();
    }

    if !UNIT_DURATION_RE.is_match(s) {
        return None;
    }
    let duration = parse_duration::parse(s).ok()?;
    u32::try_from(duration.as_secs()).ok()
}

/// `[[H:]M:]S`, at most three components, every component numeric.
fn parse_clock(s: &str) -> Option<u32> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    if parts.len() > 3 {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let mut total: u64 = 0;
    for part in leading {
        let value: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    total = total.checked_mul(60)?.checked_add(parse_seconds(last)?)?;
    u32::try_from(total).ok()
}

/// Non-negative seconds, optionally with a fractional part.
fn parse_seconds(s: &str) -> Option<u64> {
    let whole = match s.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c.is_ascii_digit()) => whole,
        Some(_) => return None,
        None => s,
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    whole.parse().ok()
}
