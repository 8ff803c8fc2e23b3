//! HTML site compilation.
//!
//! Every build is a full rebuild: scan the source tree, empty the output
//! directory, copy static files, render every page, write the feed.
//!
//! ## Generated Files
//!
//! ```text
//! dist/
//! ├── index.html          # Site root, {{writing}} expanded to the listing
//! ├── about.html          # Every other page gets a back-link and footer
//! ├── new-year.html       # Date prefix stripped from writing entries
//! ├── rss.xml             # Dated writing entries
//! ├── styles.css          # Copied style sheet
//! └── assets/             # Copied verbatim
//! ```
//!
//! ## Placeholders
//!
//! Expanded in the Markdown source before rendering:
//!
//! - `{{date}}` → `*Jan 2024*` for dated files, left alone otherwise
//! - `{{YEAR}}` → the build year
//! - `{{writing}}` → the writing listing, in `index.md` only
//!
//! ## Determinism
//!
//! Output depends only on the source tree, the config and the
//! [`BuildContext`]. The style sheet link carries a content hash rather than
//! a timestamp, so two builds of the same inputs are byte-identical.
//!
//! ## HTML Generation
//!
//! The page shell uses [maud](https://maud.lambda.xyz/). Page bodies come
//! from the [`Markdown`] engine and are inserted pre-escaped.

use crate::config::{SiteConfig, SiteInfo, SitePaths};
use crate::feed::{self, FEED_FILENAME};
use crate::markdown::Markdown;
use crate::naming;
use crate::scan::{self, ScanError};
use crate::types::{Page, WritingEntry};
use chrono::{Datelike, Local};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Cannot copy assets: {0}")]
    Walk(#[from] walkdir::Error),
}

pub const STYLESHEET_FILENAME: &str = "styles.css";
const ASSETS_DIRNAME: &str = "assets";
const HOME_LINK: &str = "[← Home](index.html)\n\n";
const UNDATED_LABEL: &str = "*Undated*";

/// Inputs to a build that do not come from the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildContext {
    /// Substituted for `{{YEAR}}` and used in the footer.
    pub year: i32,
}

impl BuildContext {
    pub fn now() -> Self {
        Self {
            year: Local::now().year(),
        }
    }
}

/// What a build produced.
#[derive(Debug)]
pub struct CompileReport {
    pub output_dir: PathBuf,
    pub pages: Vec<GeneratedPage>,
    /// Listed entries in listing order.
    pub writing: Vec<WritingEntry>,
    pub assets_copied: usize,
    pub stylesheet_copied: bool,
    pub feed_items: usize,
}

#[derive(Debug, Clone)]
pub struct GeneratedPage {
    pub title: String,
    pub output_filename: String,
    pub source: PathBuf,
}

/// Compile the whole site into `paths.output`.
pub fn compile(
    config: &SiteConfig,
    paths: &SitePaths,
    ctx: &BuildContext,
) -> Result<CompileReport, GenerateError> {
    // Scan before touching the output so a broken tree leaves the last
    // good build in place.
    let site = scan::scan(paths)?;

    clean_dir(&paths.output)?;
    let assets_copied = copy_assets(&paths.assets, &paths.output.join(ASSETS_DIRNAME))?;
    let stylesheet_version = copy_stylesheet(&paths.stylesheet, &paths.output)?;

    let engine = Markdown::standard(&config.markdown);

    let writing: Vec<WritingEntry> = site
        .writing
        .iter()
        .map(|page| render_entry(&engine, page, ctx))
        .collect();
    let listing = writing_listing(&writing);

    let mut pages = Vec::with_capacity(site.pages.len());
    for page in &site.pages {
        let markdown = page_markdown(page, &config.site.author, &listing, ctx);
        let body = engine.render(&markdown);
        let document = render_page(page, &body, &config.site, stylesheet_version.as_deref());
        fs::write(
            paths.output.join(&page.output_filename),
            document.into_string(),
        )?;
        tracing::debug!(source = %page.source.display(), output = %page.output_filename, "wrote page");
        pages.push(GeneratedPage {
            title: page.title.clone(),
            output_filename: page.output_filename.clone(),
            source: page.source.clone(),
        });
    }

    let feed_items = writing.iter().filter(|e| e.date.is_some()).count();
    if feed_items > 0 && config.site.base_url().is_none() {
        tracing::warn!("site.url is not set; feed links will be relative");
    }
    fs::write(
        paths.output.join(FEED_FILENAME),
        feed::render_feed(&config.site, &writing),
    )?;

    tracing::info!(pages = pages.len(), feed_items, "compiled site");
    Ok(CompileReport {
        output_dir: paths.output.clone(),
        pages,
        writing,
        assets_copied,
        stylesheet_copied: stylesheet_version.is_some(),
        feed_items,
    })
}

/// Create `dir` if missing, otherwise remove everything inside it.
fn clean_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Recursively copy `src` to `dst`. Returns the number of files copied.
fn copy_assets(src: &Path, dst: &Path) -> Result<usize, GenerateError> {
    if !src.is_dir() {
        tracing::warn!(path = %src.display(), "assets directory not found, skipping");
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy the style sheet into the output root. Returns a short content hash
/// for cache-busting, or `None` when there is no style sheet.
fn copy_stylesheet(src: &Path, out_dir: &Path) -> Result<Option<String>, GenerateError> {
    if !src.is_file() {
        tracing::warn!(path = %src.display(), "style sheet not found, skipping");
        return Ok(None);
    }
    let bytes = fs::read(src)?;
    fs::write(out_dir.join(STYLESHEET_FILENAME), &bytes)?;
    let digest = format!("{:x}", Sha256::digest(&bytes));
    Ok(Some(digest[..10].to_string()))
}

fn render_entry(engine: &Markdown, page: &Page, ctx: &BuildContext) -> WritingEntry {
    let markdown = expand_placeholders(&page.body, page.date, ctx.year, None);
    WritingEntry {
        title: page.title.clone(),
        date: page.date,
        description: page.description.clone(),
        output_filename: page.output_filename.clone(),
        rendered_html: engine.render(&markdown),
    }
}

/// Replace `{{YEAR}}`, `{{date}}` (when dated) and `{{writing}}` (when a
/// listing is given). The listing goes in last so its text is never
/// expanded again.
pub fn expand_placeholders(
    body: &str,
    date: Option<chrono::NaiveDate>,
    year: i32,
    listing: Option<&str>,
) -> String {
    let mut text = body.replace("{{YEAR}}", &year.to_string());
    if let Some(date) = date {
        text = text.replace("{{date}}", &naming::date_label(date));
    }
    if let Some(listing) = listing {
        text = text.replace("{{writing}}", listing);
    }
    text
}

/// Markdown list of writing entries:
///
/// ```text
/// - [New Year](new-year.html) · *Jan 2024*
///   Plans for the year.
/// - [Colophon](colophon.html) · *Undated*
/// ```
pub fn writing_listing(entries: &[WritingEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let when = entry
                .date
                .map(naming::date_label)
                .unwrap_or_else(|| UNDATED_LABEL.to_string());
            let mut item = format!("- [{}]({}) · {}", entry.title, entry.output_filename, when);
            if let Some(description) = &entry.description {
                item.push_str("\n  ");
                item.push_str(description);
            }
            item
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full Markdown for a page: placeholders expanded, plus back-link and
/// footer on everything but the index.
fn page_markdown(page: &Page, author: &str, listing: &str, ctx: &BuildContext) -> String {
    let listing = page.is_index.then_some(listing);
    let text = expand_placeholders(&page.body, page.date, ctx.year, listing);
    if page.is_index {
        return text;
    }
    format!("{HOME_LINK}{text}\n\n{}", footer(author, ctx.year))
}

fn footer(author: &str, year: i32) -> String {
    let author = html! { (author.trim()) }.into_string();
    let credit = if author.is_empty() {
        year.to_string()
    } else {
        format!("{author} {year}")
    };
    format!("<div class=\"footnotes\">\n<p>© {credit}</p>\n</div>")
}

/// Wrap a rendered body in the HTML document shell.
fn render_page(page: &Page, body: &str, site: &SiteInfo, css_version: Option<&str>) -> Markup {
    let description = page
        .description
        .as_deref()
        .or_else(|| (!site.description.is_empty()).then_some(site.description.as_str()));
    let url = site.page_url(&page.output_filename);
    let og_type = if page.date.is_some() {
        "article"
    } else {
        "website"
    };
    let stylesheet = match css_version {
        Some(v) => format!("{STYLESHEET_FILENAME}?v={v}"),
        None => STYLESHEET_FILENAME.to_string(),
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title) }
                @if let Some(description) = description {
                    meta name="description" content=(description);
                }
                meta property="og:site_name" content=(site.title);
                meta property="og:title" content=(page.title);
                meta property="og:type" content=(og_type);
                @if let Some(description) = description {
                    meta property="og:description" content=(description);
                }
                @if let Some(url) = &url {
                    meta property="og:url" content=(url);
                    link rel="canonical" href=(url);
                }
                meta name="twitter:card" content="summary";
                meta name="twitter:title" content=(page.title);
                @if let Some(description) = description {
                    meta name="twitter:description" content=(description);
                }
                link rel="stylesheet" href=(stylesheet);
                link rel="alternate" type="application/rss+xml" title=(site.title) href=(FEED_FILENAME);
            }
            body {
                (PreEscaped(body))
            }
        }
    }
}
