//! Deciding when a file in the watched folder is complete enough to ingest.
//!
//! Files arrive in one of three ways:
//!
//! - moved in from elsewhere (`rename`): complete on arrival
//! - hard-linked in: complete on arrival, the data was written under another name
//! - created and written in place: complete once its writer closes it
//!
//! Only Linux reports write-closes (`IN_CLOSE_WRITE`). Elsewhere a created file
//! is dispatched straight away and the lock wait is the only guard.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// One folder event, reduced to what matters for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FolderEvent {
    Created(PathBuf),
    WriteClosed(PathBuf),
    MovedIn {
        path: PathBuf,
        tracker: Option<usize>,
    },
    Gone(PathBuf),
}

impl FolderEvent {
    /// Map a raw `notify` event; events that never start an ingestion map to nothing.
    pub(crate) fn from_notify(event: Event) -> Vec<FolderEvent> {
        let tracker = event.attrs.tracker();
        match event.kind {
            EventKind::Create(CreateKind::Folder) => Vec::new(),
            EventKind::Create(_) => event.paths.into_iter().map(FolderEvent::Created).collect(),
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
                event.paths.into_iter().map(FolderEvent::WriteClosed).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
                .paths
                .into_iter()
                .map(|path| FolderEvent::MovedIn { path, tracker })
                .collect(),
            // `paths` is `[from, to]`; `from` is missing when it lies outside the folder.
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
                .paths
                .into_iter()
                .last()
                .map(|path| FolderEvent::MovedIn { path, tracker })
                .into_iter()
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
                event.paths.into_iter().map(FolderEvent::Gone).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Per-path arrival state for the watch loop.
///
/// Each arrival yields at most one dispatch: later closes of an already
/// dispatched file are ignored until the path arrives again.
#[derive(Debug, Default)]
pub(crate) struct ArrivalTracker {
    awaiting_close: HashSet<PathBuf>,
    last_move: Option<usize>,
}

impl ArrivalTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed one event; returns the path to ingest now, if any.
    pub(crate) fn observe(&mut self, event: FolderEvent) -> Option<PathBuf> {
        match event {
            FolderEvent::Created(path) => {
                if !reports_write_close() || written_elsewhere(&path) {
                    self.awaiting_close.remove(&path);
                    return Some(path);
                }
                self.awaiting_close.insert(path);
                None
            }
            FolderEvent::WriteClosed(path) => self.awaiting_close.take(&path),
            FolderEvent::MovedIn { path, tracker } => {
                // inotify reports one move as both `To` and `Both` with the same cookie.
                if tracker.is_some() && tracker == self.last_move {
                    return None;
                }
                self.last_move = tracker;
                self.awaiting_close.remove(&path);
                Some(path)
            }
            FolderEvent::Gone(path) => {
                self.awaiting_close.remove(&path);
                None
            }
        }
    }

    pub(crate) fn awaiting(&self) -> usize {
        self.awaiting_close.len()
    }
}

fn reports_write_close() -> bool {
    cfg!(target_os = "linux")
}

/// A created file with more than one link was written under another name.
#[cfg(unix)]
fn written_elsewhere(path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    std::fs::symlink_metadata(path).is_ok_and(|meta| meta.is_file() && meta.nlink() > 1)
}

#[cfg(not(unix))]
fn written_elsewhere(_path: &Path) -> bool {
    false
}
