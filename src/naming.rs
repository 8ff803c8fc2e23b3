//! Filename parsing for the `YYYY-MM-DD-slug` dating convention.
//!
//! A Markdown file may carry a calendar-date prefix. The prefix dates the
//! entry (feed `pubDate`, `{{date}}`, listing order) and is stripped from the
//! output name:
//!
//! - `2024-01-01-new-year.md` → date 2024-01-01, output `new-year.html`
//! - `about.md` → undated, output `about.html`
//! - `2024-13-01-typo.md` → not a real date, so undated and kept verbatim
//!
//! Display titles convert dashes to spaces, same as the slug convention used
//! for page names elsewhere on the site.

use chrono::NaiveDate;

/// Result of parsing a file stem like `2024-01-01-new-year`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and a valid calendar date.
    pub date: Option<NaiveDate>,
    /// Name part after the date prefix, or the full stem when undated.
    pub slug: String,
    /// Slug with dashes converted to spaces.
    pub display_title: String,
}

impl ParsedName {
    /// Output HTML filename for this entry (`slug.html`).
    pub fn output_filename(&self) -> String {
        format!("{}.html", self.slug)
    }
}

/// Parse a file stem following the `YYYY-MM-DD-slug` convention.
///
/// - `"2024-01-01-new-year"` → date=Some(2024-01-01), slug="new-year"
/// - `"index"` → date=None, slug="index"
/// - `"2024-01-01"` → date=None (a prefix needs a name after it)
/// - `"2024-02-30-nope"` → date=None, slug="2024-02-30-nope"
pub fn parse_entry_name(stem: &str) -> ParsedName {
    if let Some((date, rest)) = split_date_prefix(stem) {
        return ParsedName {
            date: Some(date),
            slug: rest.to_string(),
            display_title: rest.replace('-', " "),
        };
    }
    ParsedName {
        date: None,
        slug: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}

fn split_date_prefix(stem: &str) -> Option<(NaiveDate, &str)> {
    let bytes = stem.as_bytes();
    if bytes.len() < 12 {
        return None;
    }
    let shape_ok = bytes[..10].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    }) && bytes[10] == b'-';
    if !shape_ok {
        return None;
    }
    let date = NaiveDate::parse_from_str(&stem[..10], "%Y-%m-%d").ok()?;
    Some((date, &stem[11..]))
}

/// Format a date as `Mon YYYY`, e.g. `Jan 2024`.
pub fn month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// The emphasised `*Mon YYYY*` label used by `{{date}}` and the writing list.
pub fn date_label(date: NaiveDate) -> String {
    format!("*{}*", month_year(date))
}

/// Turn a free-text title into a filename slug.
///
/// Lower-cases, collapses every run of characters outside `[a-z0-9]` into a
/// single dash, and trims leading and trailing dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}
