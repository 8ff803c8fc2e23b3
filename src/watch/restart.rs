//! Replace the running process with a fresh copy of itself.

use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;

use super::error::WatchError;

/// Pause before re-exec so a build tool has finished writing the new binary.
const SETTLE: Duration = Duration::from_millis(300);

/// Re-run `executable` with the current arguments. Only returns on failure.
#[cfg(unix)]
pub fn reexec(executable: &Path) -> Result<Infallible, WatchError> {
    use std::os::unix::process::CommandExt;

    std::thread::sleep(SETTLE);
    tracing::info!(executable = %executable.display(), "re-executing");
    let err = std::process::Command::new(executable)
        .args(std::env::args_os().skip(1))
        .exec();
    Err(WatchError::RestartFailed {
        executable: executable.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Spawn a replacement with inherited stdio, then exit this process.
#[cfg(not(unix))]
pub fn reexec(executable: &Path) -> Result<Infallible, WatchError> {
    std::thread::sleep(SETTLE);
    tracing::info!(executable = %executable.display(), "spawning replacement");
    std::process::Command::new(executable)
        .args(std::env::args_os().skip(1))
        .spawn()
        .map_err(|e| WatchError::RestartFailed {
            executable: executable.to_path_buf(),
            reason: e.to_string(),
        })?;
    std::process::exit(0)
}
