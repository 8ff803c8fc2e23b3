//! Debounced rebuild scheduling.
//!
//! State machine:
//!
//! ```text
//!   Idle ──qualifying change──▶ Debouncing ──deadline──▶ (rebuild) ──▶ Idle
//!                                   │  ▲
//!                                   └──┘ qualifying change resets deadline
//!   any ──logic change──▶ Restarting (terminal)
//!   any ──shutdown──▶ return, pending rebuild dropped
//! ```
//!
//! A change *qualifies* when the detector reports new content, or when the
//! path was removed. A directory qualifies when it takes tracked pages away
//! or brings new ones in. Rebuild failures are logged and the loop keeps
//! going.

use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use super::detector::ChangeDetector;
use super::router::{ChangeKind, Router, Trigger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Idle,
    Debouncing { deadline: Instant },
    Restarting { path: PathBuf },
}

/// Why the event loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Shutdown signal received.
    Interrupted,
    /// A logic file changed; the process should replace itself.
    Restart { path: PathBuf },
    /// The event source went away.
    Closed,
}

#[derive(Debug)]
pub struct Scheduler {
    state: State,
    debounce: Duration,
    detector: ChangeDetector,
    router: Router,
}

impl Scheduler {
    pub fn new(router: Router, debounce: Duration) -> Self {
        Self {
            state: State::Idle,
            debounce,
            detector: ChangeDetector::new(),
            router,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn detector_mut(&mut self) -> &mut ChangeDetector {
        &mut self.detector
    }

    /// Pending rebuild deadline, if debouncing.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Feed one trigger. Returns whether it changed the schedule.
    pub fn on_trigger(&mut self, trigger: Trigger, now: Instant) -> bool {
        if matches!(self.state, State::Restarting { .. }) {
            return false;
        }
        match trigger {
            Trigger::Logic { path } => {
                tracing::info!(path = %path.display(), "logic file changed, restarting");
                self.state = State::Restarting { path };
                true
            }
            Trigger::Content { path, change } => {
                let qualifies = match change {
                    ChangeKind::Removed => {
                        self.detector.forget(&path);
                        true
                    }
                    ChangeKind::Added | ChangeKind::Modified => self.detector.has_changed(&path),
                };
                self.schedule(&path, change, qualifies, now)
            }
            Trigger::Tree { path, change } => {
                let pages = match change {
                    ChangeKind::Removed => self.detector.forget_under(&path),
                    ChangeKind::Added | ChangeKind::Modified => self.detector.observe_tree(&path),
                };
                if pages > 0 {
                    tracing::debug!(path = %path.display(), pages, "directory of pages moved");
                }
                self.schedule(&path, change, pages > 0, now)
            }
        }
    }

    fn schedule(&mut self, path: &Path, change: ChangeKind, qualifies: bool, now: Instant) -> bool {
        if !qualifies {
            tracing::debug!(path = %path.display(), "content unchanged, skipping");
            return false;
        }
        tracing::debug!(path = %path.display(), ?change, "change detected");
        self.state = State::Debouncing {
            deadline: now + self.debounce,
        };
        true
    }

    fn fire<F, E>(&mut self, rebuild: &mut F)
    where
        F: FnMut() -> Result<(), E>,
        E: Display,
    {
        self.state = State::Idle;
        match rebuild() {
            Ok(()) => tracing::info!("rebuild complete"),
            Err(e) => tracing::error!(error = %e, "rebuild failed"),
        }
    }

    /// Drive the state machine until shutdown, restart, or the event source
    /// closes.
    pub async fn run<S, F, E>(
        mut self,
        events: &mut mpsc::Receiver<notify::Result<notify::Event>>,
        shutdown: S,
        mut rebuild: F,
    ) -> Outcome
    where
        S: Future<Output = ()>,
        F: FnMut() -> Result<(), E>,
        E: Display,
    {
        tokio::pin!(shutdown);

        loop {
            if let State::Restarting { path } = &self.state {
                return Outcome::Restart { path: path.clone() };
            }
            let deadline = self.deadline();

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    if deadline.is_some() {
                        tracing::debug!("pending rebuild cancelled");
                    }
                    return Outcome::Interrupted;
                }

                received = events.recv() => match received {
                    Some(Ok(event)) => {
                        for trigger in self.router.classify(&event) {
                            self.on_trigger(trigger, Instant::now());
                        }
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "watch error"),
                    None => return Outcome::Closed,
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire(&mut rebuild);
                }
            }
        }
    }
}
