//! Scaffolding for new dated entries (`quill new`).

use crate::naming::slugify;
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Entry title must contain at least one letter or digit")]
    EmptyTitle,
    #[error("Entry already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Create `{drafts_dir}/{YYYY-MM-DD}-{slug}.md` from the entry template.
///
/// The drafts directory is created if needed. An existing file is never
/// overwritten.
pub fn create(drafts_dir: &Path, title: &str, today: NaiveDate) -> Result<PathBuf, EntryError> {
    let title = title.trim();
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(EntryError::EmptyTitle);
    }

    fs::create_dir_all(drafts_dir)?;
    let path = drafts_dir.join(format!("{}-{slug}.md", today.format("%Y-%m-%d")));

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(EntryError::AlreadyExists(path));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(template(title).as_bytes())?;

    tracing::info!(path = %path.display(), "created entry");
    Ok(path)
}

fn template(title: &str) -> String {
    format!(
        r#"# {title}

> Summary

{{{{date}}}}

Write here.

<!--
Embed a tweet on its own line, by URL or by id:

::tweet(https://x.com/username/status/1909231499448401946)
::tweet(1909231499448401946)

An optional second argument (light or dark) is accepted.
-->
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
    }

    #[test]
    fn creates_dated_file_from_title() {
        let tmp = TempDir::new().unwrap();
        let drafts = tmp.path().join("pages/drafts");

        let path = create(&drafts, "Hello, World: Part 2!", today()).unwrap();

        assert_eq!(path, drafts.join("2025-03-09-hello-world-part-2.md"));
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("# Hello, World: Part 2!\n\n> Summary\n\n{{date}}\n"));
        assert!(body.contains("::tweet("));
    }

    #[test]
    fn refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let first = create(tmp.path(), "Same", today()).unwrap();
        fs::write(&first, "edited").unwrap();

        let err = create(tmp.path(), "Same", today()).unwrap_err();
        assert!(matches!(err, EntryError::AlreadyExists(p) if p == first));
        assert_eq!(fs::read_to_string(&first).unwrap(), "edited");
    }

    #[test]
    fn empty_title_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(create(tmp.path(), "   ", today()), Err(EntryError::EmptyTitle)));
        assert!(matches!(create(tmp.path(), "!!!", today()), Err(EntryError::EmptyTitle)));
    }

    #[test]
    fn created_entry_parses_as_dated() {
        let tmp = TempDir::new().unwrap();
        let path = create(tmp.path(), "Notes on Rust", today()).unwrap();
        let page = crate::scan::parse_page(&path).unwrap();
        assert_eq!(page.date, Some(today()));
        assert_eq!(page.title, "Notes on Rust");
        assert_eq!(page.output_filename, "notes-on-rust.html");
    }
}
