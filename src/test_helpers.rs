//! Shared test utilities for the quill test suite.
//!
//! Provides fixture setup, page lookups, and output-tree snapshots that work
//! with scan-phase data ([`Page`]) and compiled output directories.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let site = scan(&paths).unwrap();
//!
//! let page = find_page(&site.pages, "about.html");
//! assert_eq!(page.title, "About");
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::{self, SiteConfig, SitePaths};
use crate::types::Page;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Load the fixture's `site.toml` and resolve its paths.
pub fn load_fixture(root: &Path) -> (SiteConfig, SitePaths) {
    let config = config::load_config(&root.join(config::CONFIG_FILENAME)).unwrap();
    let paths = config.resolve_paths(root);
    (config, paths)
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a page by output filename. Panics if not found.
pub fn find_page<'a>(pages: &'a [Page], output_filename: &str) -> &'a Page {
    pages
        .iter()
        .find(|p| p.output_filename == output_filename)
        .unwrap_or_else(|| {
            let names = output_names(pages);
            panic!("page '{output_filename}' not found. Available: {names:?}")
        })
}

/// All output filenames in order.
pub fn output_names(pages: &[Page]) -> Vec<&str> {
    pages.iter().map(|p| p.output_filename.as_str()).collect()
}

// =========================================================================
// Output tree helpers
// =========================================================================

/// Read a generated file as text. Panics if missing.
pub fn read_output(output: &Path, name: &str) -> String {
    std::fs::read_to_string(output.join(name))
        .unwrap_or_else(|e| panic!("cannot read output file {name}: {e}"))
}

/// Relative path → bytes for every file under `dir`.
pub fn snapshot_tree(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect()
}
