//! Filesystem scanning.
//!
//! First step of every build. Walks the content root for Markdown files and
//! reads the writing directory for listed entries. Scanning does not render
//! anything; it only inspects text (first heading, first quote line) and
//! filenames.
//!
//! ## Directory Structure
//!
//! ```text
//! pages/                             # Content root, every *.md compiled
//! ├── index.md                       # Site root, may contain {{writing}}
//! ├── about.md                       # → about.html
//! ├── writing/                       # Listed on the index and in the feed
//! │   ├── 2024-01-01-new-year.md     # → new-year.html, dated Jan 2024
//! │   └── colophon.md                # → colophon.html, undated
//! └── drafts/                        # Compiled but never listed
//!     └── 2025-02-02-someday.md
//! ```
//!
//! ## Validation
//!
//! Output is flat: every page lands directly in the output directory under
//! its basename. Two sources that map to the same output name are rejected
//! with [`ScanError::DuplicateOutput`].

use crate::config::SitePaths;
use crate::naming::parse_entry_name;
use crate::types::Page;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{first} and {second} both compile to {output}")]
    DuplicateOutput {
        output: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Everything a build needs to know about the source tree.
#[derive(Debug)]
pub struct SiteContent {
    /// All pages in walk order (sorted by path).
    pub pages: Vec<Page>,
    /// Writing entries, newest first, undated last.
    pub writing: Vec<Page>,
}

pub fn scan(paths: &SitePaths) -> Result<SiteContent, ScanError> {
    let pages = parse_pages(&paths.content)?;
    check_duplicates(&pages)?;
    let writing = parse_writing(&paths.writing)?;
    Ok(SiteContent { pages, writing })
}

/// Walk the content root and parse every `.md` file into a page.
fn parse_pages(root: &Path) -> Result<Vec<Page>, ScanError> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            pages.push(parse_page(entry.path())?);
        }
    }
    Ok(pages)
}

/// Parse the direct `.md` children of the writing directory, sorted by date
/// descending. Undated entries go last, keeping filename order.
///
/// A missing writing directory is not an error: the listing is just empty.
fn parse_writing(dir: &Path) -> Result<Vec<Page>, ScanError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %dir.display(), "writing directory not found, listing is empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut files: Vec<PathBuf> = read
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_markdown(p))
        .collect();
    files.sort();

    let mut entries = files
        .iter()
        .map(|p| parse_page(p))
        .collect::<Result<Vec<_>, _>>()?;
    sort_writing(&mut entries);
    Ok(entries)
}

/// Newest first; `None` sorts after every date. Stable.
pub fn sort_writing(entries: &mut [Page]) {
    entries.sort_by_key(|p| Reverse(p.date));
}

/// Read one Markdown file into a [`Page`].
pub fn parse_page(path: &Path) -> Result<Page, ScanError> {
    let body = fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = parse_entry_name(&stem);
    let output_filename = name.output_filename();

    let title = first_heading(&body).unwrap_or_else(|| name.display_title.clone());
    let description = first_quote(&body);

    Ok(Page {
        source: path.to_path_buf(),
        title,
        description,
        date: name.date,
        is_index: output_filename.eq_ignore_ascii_case("index.html"),
        output_filename,
        body,
    })
}

fn check_duplicates(pages: &[Page]) -> Result<(), ScanError> {
    let mut seen: BTreeMap<&str, &Path> = BTreeMap::new();
    for page in pages {
        if let Some(first) = seen.insert(&page.output_filename, &page.source) {
            return Err(ScanError::DuplicateOutput {
                output: page.output_filename.clone(),
                first: first.to_path_buf(),
                second: page.source.clone(),
            });
        }
    }
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Text of the first `# ` heading line.
fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find(|line| line.starts_with("# "))
        .map(|line| line.trim_start_matches("# ").trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Text of the first `> ` quoted line.
fn first_quote(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("> "))
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
}
