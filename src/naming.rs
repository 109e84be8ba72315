//! Filename parsing for the `YYYY-MM-DD-slug` post convention.
//!
//! Post files are named after the day they were published followed by a
//! slug, e.g. `2024-10-12-first-light.md`. Front matter may override either
//! part; the filename is only the fallback.
//!
//! ## Display Titles
//!
//! Dashes in the slug portion become spaces for display, which is what a
//! post without a `title` field is called:
//! - `2024-10-12-first-light` → "first light"
//! - `notes` → "notes"

use chrono::NaiveDate;

/// Result of parsing a post file stem like `2024-10-12-first-light`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and a real calendar date.
    pub date: Option<NaiveDate>,
    /// Raw slug part after the date, dashes preserved. Empty if date-only.
    /// For undated stems, this is the full input.
    pub slug: String,
    /// Display title: slug with dashes converted to spaces.
    pub display_title: String,
}

/// Length of the `YYYY-MM-DD` prefix.
const DATE_PREFIX_LEN: usize = 10;

/// Parse a post file stem following the `YYYY-MM-DD-slug` convention.
///
/// Handles these patterns:
/// - `"2024-10-12-a"` → date=2024-10-12, slug="a"
/// - `"2024-10-12-first-light"` → date=2024-10-12, slug="first-light", display_title="first light"
/// - `"2024-10-12"` → date=2024-10-12, slug=""
/// - `"2024-13-45-bad"` → date=None, slug="2024-13-45-bad"
/// - `"notes"` → date=None, slug="notes"
pub fn parse_post_filename(stem: &str) -> ParsedName {
    if let Some(prefix) = stem.get(..DATE_PREFIX_LEN)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let rest = &stem[DATE_PREFIX_LEN..];
        let slug = match rest.strip_prefix('-') {
            Some(slug) => slug,
            None if rest.is_empty() => "",
            // `2024-10-123` is not a dated name
            None => return undated(stem),
        };
        return ParsedName {
            date: Some(date),
            slug: slug.to_string(),
            display_title: slug.replace('-', " "),
        };
    }
    undated(stem)
}

fn undated(stem: &str) -> ParsedName {
    ParsedName {
        date: None,
        slug: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}
