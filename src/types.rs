//! Shared types passed from scan to generate and feed.

use chrono::NaiveDate;
use std::path::PathBuf;

/// A Markdown source file discovered under the content root.
///
/// Every page is compiled to `output_filename`. Pages in the writing
/// directory are additionally listed on the index and in the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub source: PathBuf,
    /// Title from the first `# heading`, or the filename with dashes as spaces.
    pub title: String,
    /// First `> ` quoted line, used for the listing and meta description.
    pub description: Option<String>,
    /// Date from a `YYYY-MM-DD-` filename prefix.
    pub date: Option<NaiveDate>,
    /// Flat output name, date prefix stripped (`new-year.html`).
    pub output_filename: String,
    /// The site root page; receives `{{writing}}` and no back-link.
    pub is_index: bool,
    /// Raw Markdown.
    pub body: String,
}

/// A compiled writing entry, ready for the index listing and the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct WritingEntry {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub output_filename: String,
    /// Entry body as HTML, without page chrome.
    pub rendered_html: String,
}
