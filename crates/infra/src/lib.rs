//! Infrastructure layer: record sinks, configuration, file ingestion and
//! directory watching.

pub mod config;
pub mod pipeline;
pub mod sink;
pub mod watcher;


pub use config::{BoxerSettings, ConfigError, LockRetryPolicy, SettingsProvider};
pub use pipeline::{IngestError, IngestSummary, IngestionPipeline};
pub use sink::{InMemoryBoxStore, RecordSink, SinkError};
pub use watcher::{DirectoryWatcher, WatchError, WatcherHandle};
