//! Waiting for a writer to let go of a freshly created file.
//!
//! A file counts as released once it can be opened for reading and writing
//! and an exclusive advisory lock can be taken on it (`fs2`: `flock` on Unix,
//! `LockFileEx` on Windows). The lock is dropped again immediately; it only
//! proves nobody else holds one.
//!
//! Read-only files on Unix are checked with a shared lock on a read-only
//! handle instead, since the read/write open can never succeed for them.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::LockRetryPolicy;

/// Errors from waiting on a locked file.
#[derive(Debug, Error)]
pub enum LockWaitError {
    #[error("file disappeared before it was released: {}", .path.display())]
    Vanished {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file still in use after {attempts} attempts: {}", .path.display())]
    GaveUp { path: PathBuf, attempts: u32 },

    #[error("file cannot be opened for reading: {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

enum Probe {
    Released,
    Held(io::Error),
}

fn vanished(path: &Path, source: io::Error) -> LockWaitError {
    LockWaitError::Vanished {
        path: path.to_path_buf(),
        source,
    }
}

/// Try once to get exclusive read/write access to `path`.
fn probe(path: &Path) -> Result<Probe, LockWaitError> {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(vanished(path, e)),
        Err(e) if cfg!(unix) && e.kind() == io::ErrorKind::PermissionDenied => {
            return probe_read_only(path);
        }
        // Sharing violations while the writer is busy.
        Err(e) => return Ok(Probe::Held(e)),
    };

    // Fully qualified: std::fs::File grew inherent lock methods with other signatures.
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            Ok(Probe::Released)
        }
        Err(e) => Ok(Probe::Held(e)),
    }
}

/// A shared lock conflicts with a writer's exclusive one, which is all a
/// reader needs to know.
fn probe_read_only(path: &Path) -> Result<Probe, LockWaitError> {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(vanished(path, e)),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(LockWaitError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Err(e) => return Ok(Probe::Held(e)),
    };

    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            Ok(Probe::Released)
        }
        Err(e) => Ok(Probe::Held(e)),
    }
}

/// Poll `path` until no other handle holds it, following `policy`.
///
/// Returns the number of attempts it took.
pub async fn wait_until_released(path: &Path, policy: &LockRetryPolicy) -> Result<u32, LockWaitError> {
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);

        let reason = match probe(path)? {
            Probe::Released => {
                debug!(path = %path.display(), attempts, "file released by writer");
                return Ok(attempts);
            }
            Probe::Held(reason) => reason,
        };

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(LockWaitError::GaveUp {
                path: path.to_path_buf(),
                attempts,
            });
        }

        info!(
            path = %path.display(),
            attempts,
            reason = %reason,
            "file in use; retrying in {:?}",
            policy.interval
        );
        tokio::time::sleep(policy.interval).await;
    }
}
