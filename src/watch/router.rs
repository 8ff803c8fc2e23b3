//! Turns raw filesystem notifications into rebuild triggers.
//!
//! Paths fall into two buckets. Markdown files under a content root and the
//! stylesheet are *content*: a change there means recompile. The running
//! executable and the config file are *logic*: a change there means the
//! running process is stale and must be replaced.
//!
//! Directories under a content root that appear or disappear are reported as
//! *tree* changes. Backends usually announce a moved or deleted directory
//! once, without an event for each Markdown file it held. Everything else
//! is noise.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A classified filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Content { path: PathBuf, change: ChangeKind },
    /// A path under a content root other than a Markdown file was added or
    /// removed; possibly a whole directory of pages.
    Tree { path: PathBuf, change: ChangeKind },
    Logic { path: PathBuf },
}

/// Path classifier. All paths are stored normalized; see [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Router {
    content_roots: Vec<PathBuf>,
    stylesheet: Option<PathBuf>,
    logic_files: Vec<PathBuf>,
}

impl Router {
    pub fn new(content_roots: &[PathBuf], stylesheet: Option<&Path>, logic_files: &[PathBuf]) -> Self {
        Self {
            content_roots: content_roots.iter().map(|p| normalize(p)).collect(),
            stylesheet: stylesheet.map(normalize),
            logic_files: logic_files.iter().map(|p| normalize(p)).collect(),
        }
    }

    /// Classify one notify event. A rename with both ends reported yields a
    /// removal of the old path followed by an addition of the new one. A
    /// rename reported without direction is an addition when the path still
    /// exists.
    pub fn classify(&self, event: &Event) -> Vec<Trigger> {
        let kinds: Vec<(usize, ChangeKind)> = match event.kind {
            EventKind::Create(_) => all(event, ChangeKind::Added),
            EventKind::Remove(_) => all(event, ChangeKind::Removed),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                all(event, ChangeKind::Removed)
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(event, ChangeKind::Added),
            EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Other)) => event
                .paths
                .iter()
                .enumerate()
                .map(|(i, path)| {
                    let change = if path.exists() {
                        ChangeKind::Added
                    } else {
                        ChangeKind::Removed
                    };
                    (i, change)
                })
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
                .paths
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    let change = if i == 0 {
                        ChangeKind::Removed
                    } else {
                        ChangeKind::Added
                    };
                    (i, change)
                })
                .collect(),
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
                all(event, ChangeKind::Modified)
            }
            EventKind::Access(_) => Vec::new(),
        };

        kinds
            .into_iter()
            .filter_map(|(i, change)| self.route(&event.paths[i], change))
            .collect()
    }

    /// Route a single path. Returns `None` for paths nobody cares about.
    pub fn route(&self, path: &Path, change: ChangeKind) -> Option<Trigger> {
        let path = normalize(path);
        if self.logic_files.iter().any(|l| *l == path) {
            return Some(Trigger::Logic { path });
        }
        if self.stylesheet.as_deref() == Some(path.as_path()) || self.is_content_markdown(&path) {
            return Some(Trigger::Content { path, change });
        }
        if self.is_tree_change(&path, change) {
            return Some(Trigger::Tree { path, change });
        }
        None
    }

    fn under_content_root(&self, path: &Path) -> bool {
        self.content_roots.iter().any(|root| path.starts_with(root))
    }

    fn is_content_markdown(&self, path: &Path) -> bool {
        is_markdown(path) && self.under_content_root(path)
    }

    /// A removed path cannot be inspected any more, so every removal under a
    /// root counts; additions only when a directory arrived.
    fn is_tree_change(&self, path: &Path, change: ChangeKind) -> bool {
        if !self.under_content_root(path) {
            return false;
        }
        match change {
            ChangeKind::Removed => true,
            ChangeKind::Added => path.is_dir(),
            ChangeKind::Modified => false,
        }
    }
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

fn all(event: &Event, change: ChangeKind) -> Vec<(usize, ChangeKind)> {
    (0..event.paths.len()).map(|i| (i, change)).collect()
}

/// Canonicalize a path so watcher-reported paths compare equal to configured
/// ones. Removed files cannot be canonicalized, so fall back to the
/// canonical parent joined with the file name.
pub fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
