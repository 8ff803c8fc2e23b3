//! RSS 2.0 feed for dated writing entries.
//!
//! Feed readers resolve nothing against the page they found a link on, so
//! every `src` and `href` in an entry body is rewritten to an absolute URL
//! under `site.url`. Fragment-only links (`#notes`) resolve against the
//! entry's own URL. Undated entries are listed on the index but left out of
//! the feed: an item without a `pubDate` sorts unpredictably in most readers.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use maud::html;
use regex::{Captures, Regex};

use crate::config::SiteInfo;
use crate::types::WritingEntry;

pub const FEED_FILENAME: &str = "rss.xml";

const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

static LINK_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(src|href)="([^"]*)""#).expect("valid regex"));

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("valid regex"));

/// Render the complete feed document.
pub fn render_feed(site: &SiteInfo, entries: &[WritingEntry]) -> String {
    let dated: Vec<(&WritingEntry, NaiveDate)> = entries
        .iter()
        .filter_map(|e| e.date.map(|d| (e, d)))
        .collect();
    let last_build = dated.iter().map(|(_, d)| *d).max();
    let base = site.base_url();

    let markup = html! {
        rss version="2.0" xmlns:content=(CONTENT_NS) {
            channel {
                title { (site.title) }
                link { (base.unwrap_or_default()) }
                description { (site.description) }
                @if let Some(date) = last_build {
                    lastBuildDate { (rfc2822(date)) }
                }
                @for (entry, date) in &dated {
                    @let url = site
                        .page_url(&entry.output_filename)
                        .unwrap_or_else(|| entry.output_filename.clone());
                    item {
                        title { (entry.title) }
                        link { (url) }
                        guid isPermaLink="true" { (url) }
                        pubDate { (rfc2822(*date)) }
                        @if let Some(description) = &entry.description {
                            description { (description) }
                        }
                        content:encoded { (absolutize(&entry.rendered_html, base, &url)) }
                    }
                }
            }
        }
    };

    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(&markup.into_string());
    out.push('\n');
    out
}

/// RFC 2822 timestamp at midnight UTC, e.g. `Mon, 1 Jan 2024 00:00:00 +0000`.
pub fn rfc2822(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).and_utc().to_rfc2822()
}

/// Rewrite relative `src`/`href` attribute values in `html` to absolute URLs.
///
/// Without a base URL the markup is returned unchanged.
pub fn absolutize(html: &str, base: Option<&str>, entry_url: &str) -> String {
    let Some(base) = base else {
        return html.to_string();
    };
    LINK_ATTR
        .replace_all(html, |caps: &Captures| {
            format!(r#"{}="{}""#, &caps[1], resolve(&caps[2], base, entry_url))
        })
        .into_owned()
}

fn resolve(value: &str, base: &str, entry_url: &str) -> String {
    if value.is_empty() || value.starts_with("//") || SCHEME.is_match(value) {
        value.to_string()
    } else if value.starts_with('#') {
        format!("{entry_url}{value}")
    } else if value.starts_with('/') {
        format!("{base}{value}")
    } else {
        format!("{base}/{}", value.trim_start_matches("./"))
    }
}
