//! Watch mode: rebuild on content changes, restart on logic changes.
//!
//! ```text
//! notify thread ──blocking_send──▶ mpsc ──▶ Scheduler::run ──▶ rebuild()
//!                                               │
//!                                               └──▶ Outcome ──▶ exit / re-exec
//! ```
//!
//! The notify callback runs on the watcher's own thread and forwards raw
//! events into a bounded Tokio channel. Everything else (classification,
//! change detection, debounce timer, signal handling) lives on a single
//! current-thread runtime, so the scheduler never needs locks.
//!
//! A [`Session`] is started before the initial build: the OS watch is
//! registered and existing files are hashed first, so an edit saved while
//! the initial build runs is queued and rebuilt rather than lost.

mod detector;
mod error;
mod restart;
mod router;
mod scheduler;

pub use detector::ChangeDetector;
pub use error::WatchError;
pub use router::{ChangeKind, Router, Trigger, is_markdown, normalize};
pub use scheduler::{Outcome, Scheduler, State};

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use walkdir::WalkDir;

const EVENT_BUFFER: usize = 256;

/// What to watch and how.
#[derive(Debug, Clone)]
pub struct WatchPlan {
    /// Directories whose `.md` files are content.
    pub content_roots: Vec<PathBuf>,
    pub stylesheet: Option<PathBuf>,
    /// Files whose change makes the running process stale.
    pub logic_files: Vec<PathBuf>,
    /// Program to re-exec on a logic change.
    pub executable: PathBuf,
    pub debounce: Duration,
}

impl WatchPlan {
    /// Directories to register with the OS watcher, deduplicated.
    ///
    /// Existing content roots are watched recursively. Standalone files are
    /// watched through their parent directory, non-recursively, unless a
    /// recursive root already covers it.
    pub fn watch_dirs(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let mut dirs: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();
        for root in &self.content_roots {
            if root.is_dir() {
                dirs.insert(normalize(root), RecursiveMode::Recursive);
            }
        }
        let roots: Vec<PathBuf> = dirs.keys().cloned().collect();
        dirs.retain(|dir, _| !roots.iter().any(|r| r != dir && dir.starts_with(r)));
        let recursive: Vec<PathBuf> = dirs.keys().cloned().collect();
        let files = self
            .stylesheet
            .iter()
            .chain(self.logic_files.iter())
            .chain(std::iter::once(&self.executable));
        for file in files {
            let Some(parent) = normalize(file).parent().map(Path::to_path_buf) else {
                continue;
            };
            if !parent.is_dir() || recursive.iter().any(|r| parent.starts_with(r)) {
                continue;
            }
            dirs.entry(parent).or_insert(RecursiveMode::NonRecursive);
        }
        dirs.into_iter().collect()
    }

    fn router(&self) -> Router {
        let mut logic = self.logic_files.clone();
        if !logic.contains(&self.executable) {
            logic.push(self.executable.clone());
        }
        Router::new(&self.content_roots, self.stylesheet.as_deref(), &logic)
    }
}

/// A registered watch that has not started handling events yet.
pub struct Session {
    runtime: tokio::runtime::Runtime,
    watcher: RecommendedWatcher,
    events: mpsc::Receiver<notify::Result<notify::Event>>,
    scheduler: Scheduler,
    executable: PathBuf,
}

impl Session {
    /// Register the OS watch and record baselines for existing files.
    ///
    /// Events from here on are queued until [`Session::run`].
    pub fn start(plan: &WatchPlan) -> Result<Self, WatchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = tx.blocking_send(res);
        })?;
        for (dir, mode) in plan.watch_dirs() {
            watcher
                .watch(&dir, mode)
                .map_err(|e| WatchError::PathWatchFailed {
                    path: dir.clone(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(path = %dir.display(), ?mode, "watching");
        }

        let mut scheduler = Scheduler::new(plan.router(), plan.debounce);
        let primed = prime(&mut scheduler, plan);
        tracing::debug!(files = primed, "recorded baselines");

        Ok(Self {
            runtime,
            watcher,
            events,
            scheduler,
            executable: plan.executable.clone(),
        })
    }

    /// Handle events until interrupted. Blocks the calling thread.
    ///
    /// Returns `Ok(())` on Ctrl-C. On a logic change the process is replaced
    /// and this function does not return unless the replacement fails.
    pub fn run<F, E>(self, rebuild: F) -> Result<(), WatchError>
    where
        F: FnMut() -> Result<(), E>,
        E: Display,
    {
        let Self {
            runtime,
            watcher,
            mut events,
            scheduler,
            executable,
        } = self;

        tracing::info!("watching for changes (Ctrl-C to stop)");
        let outcome = runtime.block_on(scheduler.run(&mut events, shutdown_signal(), rebuild));
        drop(watcher);

        match outcome {
            Outcome::Interrupted => {
                tracing::info!("stopped");
                Ok(())
            }
            Outcome::Closed => {
                tracing::warn!("event source closed, stopping");
                Ok(())
            }
            Outcome::Restart { path } => {
                tracing::debug!(path = %path.display(), "restart requested");
                match restart::reexec(&executable)? {}
            }
        }
    }
}

/// Record baselines for files present at startup. Returns how many.
fn prime(scheduler: &mut Scheduler, plan: &WatchPlan) -> usize {
    let detector = scheduler.detector_mut();
    for root in &plan.content_roots {
        let markdown = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()));
        for entry in markdown {
            detector.prime(&normalize(entry.path()));
        }
    }
    if let Some(stylesheet) = plan.stylesheet.as_deref().filter(|p| p.is_file()) {
        detector.prime(&normalize(stylesheet));
    }
    detector.len()
}

/// Resolves on Ctrl-C, or SIGTERM on Unix. A handler that cannot be
/// installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("received interrupt");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site_plan(root: &Path) -> WatchPlan {
        WatchPlan {
            content_roots: vec![root.join("pages"), root.join("pages/writing")],
            stylesheet: Some(root.join("styles.css")),
            logic_files: vec![root.join("site.toml")],
            executable: root.join("bin/quill"),
            debounce: Duration::from_millis(250),
        }
    }

    #[test]
    fn watch_dirs_dedupes_and_skips_missing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pages/writing")).unwrap();
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::write(root.join("styles.css"), "").unwrap();
        fs::write(root.join("site.toml"), "").unwrap();

        let dirs = site_plan(&root).watch_dirs();

        assert!(dirs.contains(&(root.join("pages"), RecursiveMode::Recursive)));
        // pages/writing is covered by pages.
        assert!(!dirs.iter().any(|(d, _)| *d == root.join("pages/writing")));
        assert!(dirs.contains(&(root.clone(), RecursiveMode::NonRecursive)));
        // Site root appears once even though two files live there.
        assert_eq!(dirs.iter().filter(|(d, _)| *d == root).count(), 1);
        // The executable is watched through its own directory.
        assert!(dirs.contains(&(root.join("bin"), RecursiveMode::NonRecursive)));
    }

    #[test]
    fn watch_dirs_skips_absent_content_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let dirs = site_plan(&root).watch_dirs();
        assert!(!dirs.iter().any(|(d, _)| d.starts_with(root.join("pages"))));
    }

    #[test]
    fn router_treats_executable_as_logic() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("bin")).unwrap();
        let exe = root.join("bin/quill");
        let router = site_plan(&root).router();
        assert_eq!(
            router.route(&exe, ChangeKind::Modified),
            Some(Trigger::Logic { path: exe })
        );
    }

    #[test]
    fn prime_counts_nested_roots_once() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pages/writing")).unwrap();
        fs::write(root.join("pages/writing/post.md"), "# Post").unwrap();

        let plan = site_plan(&root);
        let mut scheduler = Scheduler::new(plan.router(), plan.debounce);
        assert_eq!(prime(&mut scheduler, &plan), 1);
    }

    #[test]
    fn session_records_baselines_before_the_first_build() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("pages/index.md"), "# Home").unwrap();
        fs::write(root.join("pages/about.md"), "# About").unwrap();

        let mut session = Session::start(&site_plan(&root)).unwrap();

        // Saved while the initial build would be running.
        fs::write(root.join("pages/index.md"), "# Home, edited").unwrap();

        let detector = session.scheduler.detector_mut();
        assert!(detector.has_changed(&root.join("pages/index.md")));
        assert!(!detector.has_changed(&root.join("pages/about.md")));
    }

    #[test]
    fn prime_counts_existing_markdown_and_stylesheet() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("pages/index.md"), "# Home").unwrap();
        fs::write(root.join("pages/notes.txt"), "skip").unwrap();
        fs::write(root.join("styles.css"), "body{}").unwrap();

        let plan = WatchPlan {
            content_roots: vec![root.join("pages")],
            ..site_plan(&root)
        };
        let mut scheduler = Scheduler::new(plan.router(), plan.debounce);
        assert_eq!(prime(&mut scheduler, &plan), 2);
        assert!(!scheduler.detector_mut().has_changed(&root.join("pages/index.md")));
    }
}
