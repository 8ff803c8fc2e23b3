//! Content-based change detection for watched files.
//!
//! Editors and sync tools often re-announce a file without changing it
//! (atomic save, touch, metadata updates). The detector remembers a SHA-256
//! digest of each file's bytes and only reports a change when the digest
//! moves.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::router::is_markdown;

/// Last observed state of a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Snapshot {
    /// SHA-256 of the file's bytes.
    Content(Vec<u8>),
    /// Missing or unreadable. Distinct from "never seen".
    Unreadable,
}

/// Tracks last-seen content per path.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    seen: HashMap<PathBuf, Snapshot>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` and report whether its content differs from the last
    /// observation. The first observation of a path is always a change.
    pub fn has_changed(&mut self, path: &Path) -> bool {
        let current = snapshot(path);
        match self.seen.insert(path.to_path_buf(), current.clone()) {
            None => true,
            Some(previous) => previous != current,
        }
    }

    /// Record a baseline without reporting anything.
    ///
    /// Used for files that already existed when watching started, so that a
    /// later no-op save compares against what the initial build saw.
    pub fn prime(&mut self, path: &Path) {
        self.seen.insert(path.to_path_buf(), snapshot(path));
    }

    /// Drop the record for a removed path. A later re-creation counts as a
    /// first observation again.
    pub fn forget(&mut self, path: &Path) -> bool {
        self.seen.remove(path).is_some()
    }

    /// Drop every record at or below `prefix`. Returns how many went.
    pub fn forget_under(&mut self, prefix: &Path) -> usize {
        let before = self.seen.len();
        self.seen.retain(|path, _| !path.starts_with(prefix));
        before - self.seen.len()
    }

    /// Observe every Markdown file below `dir`. Returns how many changed.
    pub fn observe_tree(&mut self, dir: &Path) -> usize {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
            .filter(|e| self.has_changed(e.path()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

fn snapshot(path: &Path) -> Snapshot {
    match std::fs::read(path) {
        Ok(bytes) => Snapshot::Content(Sha256::digest(&bytes).to_vec()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Snapshot::Unreadable,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read watched file");
            Snapshot::Unreadable
        }
    }
}
