//! Count and date text normalization.
//!
//! List and detail pages hand us display text ("12.3K views", "5 hours
//! ago", "Premiered Jan 2, 2024"). Everything here degrades gracefully:
//! unparseable counts become 0 and unparseable dates become `None`.
//! A parse failure is never an error the caller has to handle.

use chrono::{Duration, NaiveDate};
use regex::Regex;

/// Parse an abbreviated count like "1,234", "2.5K" or "3M" into an
/// integer. Trailing labels ("views") are ignored; suffixes are
/// case-insensitive. Empty or unrecognizable input yields 0.
pub fn parse_abbreviated_count(text: &str) -> u64 {
    let cleaned = text.replace(',', "");
    let cleaned = cleaned.trim();

    let re = Regex::new(r"^([0-9]+(?:\.[0-9]+)?)\s*([KkMm])?").expect("valid regex");
    let Some(caps) = re.captures(cleaned) else {
        return 0;
    };
    let number: f64 = match caps[1].parse() {
        Ok(n) => n,
        Err(_) => return 0,
    };
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("K") | Some("k") => 1_000.0,
        Some("M") | Some("m") => 1_000_000.0,
        _ => 1.0,
    };
    (number * multiplier) as u64
}

/// Parse a relative recency phrase of the shape `<n> <minute|hour|day>(s) ago`.
/// Any other shape ("yesterday", "Streamed 2 weeks ago") is `None`, as
/// is a magnitude too large to represent as a duration.
pub fn parse_relative_recency(text: &str) -> Option<Duration> {
    let re = Regex::new(r"^(\d+)\s+(minute|hour|day)s?\s+ago$").expect("valid regex");
    let caps = re.captures(text.trim())?;
    let value: i64 = caps[1].parse().ok()?;
    match &caps[2] {
        "minute" => Duration::try_minutes(value),
        "hour" => Duration::try_hours(value),
        "day" => Duration::try_days(value),
        _ => None,
    }
}

/// Lead-in phrases that detail pages prepend to an otherwise plain date.
const DATE_LEAD_INS: &[&str] = &[
    "Premiered ",
    "Premieres ",
    "Streamed live on ",
    "Started streaming on ",
    "Published on ",
];

/// Parse an absolute date string into a calendar date.
///
/// ISO-prefixed strings ("2024-05-01T00:00:00Z") are truncated to their
/// date component; otherwise a handful of natural-language forms are
/// tried after stripping known lead-ins. Returns `None` on failure.
pub fn parse_absolute_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let iso = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").expect("valid regex");
    if let Some(caps) = iso.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let mut candidate = text;
    for lead_in in DATE_LEAD_INS {
        if let Some(rest) = candidate.strip_prefix(lead_in) {
            candidate = rest;
            break;
        }
    }
    let candidate = candidate.trim();

    for format in ["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return Some(date);
        }
    }
    None
}

/// Collapse newlines, tabs and slash runs into single spaces so post
/// text survives as one display line.
pub fn clean_text(text: &str) -> String {
    let text = text.replace(['\n', '\r', '\t'], " ");
    let text = Regex::new(r"[\\/]+")
        .expect("valid regex")
        .replace_all(&text, " ");
    let text = Regex::new(r"\s+")
        .expect("valid regex")
        .replace_all(&text, " ");
    text.trim().to_string()
}
