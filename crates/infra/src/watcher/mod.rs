//! Directory watcher: turns file arrivals into ingestions.
//!
//! - One `notify` subscription on the configured folder (non-recursive)
//! - One supervisory task that tracks arrivals and honours shutdown
//! - One task per arrived file: wait for the writer, then ingest
//!
//! Shutdown stops accepting new arrivals, then waits for every ingestion
//! already dispatched to run to completion.

mod arrival;
pub mod lock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, LockRetryPolicy, SettingsProvider};
use crate::pipeline::{IngestError, IngestionPipeline};
use crate::sink::RecordSink;

use arrival::{ArrivalTracker, FolderEvent};

pub use lock::{LockWaitError, wait_until_released};

/// Errors that prevent the watch loop from starting.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot watch {}: {source}", .path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Handle to control and join a running watcher.
#[derive(Debug)]
pub struct WatcherHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WatcherHandle {
    /// Request graceful shutdown and wait for the watch loop and every
    /// ingestion it dispatched to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.join.await {
            error!(error = %err, "watch loop terminated abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Watches one folder and ingests every file created in or moved into it.
#[derive(Debug)]
pub struct DirectoryWatcher<S> {
    pipeline: Arc<IngestionPipeline<S>>,
    lock_retry: LockRetryPolicy,
}

impl<S: RecordSink + 'static> DirectoryWatcher<S> {
    pub fn new(pipeline: IngestionPipeline<S>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            lock_retry: LockRetryPolicy::default(),
        }
    }

    pub fn with_lock_retry(mut self, policy: LockRetryPolicy) -> Self {
        self.lock_retry = policy;
        self
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline<S>> {
        &self.pipeline
    }

    /// Start watching; the returned handle stops the loop.
    ///
    /// The subscription is active when this returns, so files arriving
    /// afterwards are never missed.
    pub fn spawn<P>(self, settings: &P) -> Result<WatcherHandle, WatchError>
    where
        P: SettingsProvider + ?Sized,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = self.spawn_with_shutdown(settings, shutdown_rx)?;
        Ok(WatcherHandle {
            shutdown: shutdown_tx,
            join,
        })
    }

    /// Start watching until `shutdown` turns `true` (or its sender is dropped).
    ///
    /// The returned task completes once in-flight ingestions have drained.
    pub fn spawn_with_shutdown<P>(
        self,
        settings: &P,
        shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, WatchError>
    where
        P: SettingsProvider + ?Sized,
    {
        let folder = settings
            .folder_path()
            .ok_or(ConfigError::MissingFolderPath)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel::<FolderEvent>();
        let subscription = subscribe(&folder, events_tx)?;

        info!(folder = %folder.display(), "files are being monitored");

        Ok(tokio::spawn(watch_loop(
            self.pipeline,
            self.lock_retry,
            subscription,
            events_rx,
            shutdown,
        )))
    }
}

/// Register a non-recursive subscription that forwards folder events.
fn subscribe(
    folder: &Path,
    events: mpsc::UnboundedSender<FolderEvent>,
) -> Result<RecommendedWatcher, WatchError> {
    let subscribe_err = |source| WatchError::Subscribe {
        path: folder.to_path_buf(),
        source,
    };

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                for folder_event in FolderEvent::from_notify(event) {
                    let _ = events.send(folder_event);
                }
            }
            Err(err) => warn!(error = %err, "file watcher reported an error"),
        },
        Config::default(),
    )
    .map_err(subscribe_err)?;

    watcher
        .watch(folder, RecursiveMode::NonRecursive)
        .map_err(subscribe_err)?;

    Ok(watcher)
}

async fn watch_loop<S: RecordSink + 'static>(
    pipeline: Arc<IngestionPipeline<S>>,
    lock_retry: LockRetryPolicy,
    subscription: RecommendedWatcher,
    mut events: mpsc::UnboundedReceiver<FolderEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut arrivals = ArrivalTracker::new();
    let mut in_flight = JoinSet::new();

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone: nobody can stop us any more, so stop now.
                    break;
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join(joined);
            }
            next = events.recv() => match next {
                Some(event) => {
                    debug!(?event, "folder event");
                    if let Some(path) = arrivals.observe(event) {
                        dispatch(&mut in_flight, pipeline.clone(), lock_retry.clone(), path);
                    }
                }
                None => {
                    warn!("file watcher event channel closed");
                    break;
                }
            },
        }
    }

    drop(subscription);

    if arrivals.awaiting() > 0 {
        info!(files = arrivals.awaiting(), "files still being written are left for the next run");
    }
    if !in_flight.is_empty() {
        info!(ingestions = in_flight.len(), "waiting for in-flight ingestions");
    }
    while let Some(joined) = in_flight.join_next().await {
        log_join(joined);
    }

    info!("file monitoring stopped");
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "ingestion task terminated abnormally");
    }
}

/// Ingest one arrived file on its own task.
fn dispatch<S: RecordSink + 'static>(
    in_flight: &mut JoinSet<()>,
    pipeline: Arc<IngestionPipeline<S>>,
    lock_retry: LockRetryPolicy,
    path: PathBuf,
) {
    info!(path = %path.display(), "file arrived");

    in_flight.spawn(async move {
        // Some backends only report `CreateKind::Any`.
        if path.is_dir() {
            return;
        }

        if let Err(err) = wait_until_released(&path, &lock_retry).await {
            error!(path = %path.display(), error = %err, "file never became available; skipping");
            return;
        }

        info!(path = %path.display(), "file is available; processing");

        match pipeline.process(&path).await {
            Ok(_) => {}
            Err(IngestError::InvalidArgument(msg)) => {
                error!(path = %path.display(), error = %msg, "provided file path is empty");
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "error processing file");
            }
        }
    });
}
