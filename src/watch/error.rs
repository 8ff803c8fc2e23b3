//! Error types for watch mode.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Failed to start event loop: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Failed to restart {executable}: {reason}")]
    RestartFailed { executable: PathBuf, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
