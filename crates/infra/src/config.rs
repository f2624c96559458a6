//! Configuration loading and representation.
//!
//! Settings come from the process environment:
//!
//! - `BOXER_FOLDER_PATH`: folder to watch for delivery files
//! - `BOXER_LOCK_RETRY_MS`: how often to re-check a file still held by its writer
//! - `BOXER_LOCK_MAX_ATTEMPTS`: give up on such a file after this many checks
//!   (unset means wait forever)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const FOLDER_PATH_VAR: &str = "BOXER_FOLDER_PATH";
pub const LOCK_RETRY_MS_VAR: &str = "BOXER_LOCK_RETRY_MS";
pub const LOCK_MAX_ATTEMPTS_VAR: &str = "BOXER_LOCK_MAX_ATTEMPTS";

/// Configuration error. Fatal to the watch loop; never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("watched folder path is not configured (set BOXER_FOLDER_PATH)")]
    MissingFolderPath,

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Supplies the folder the watcher observes.
pub trait SettingsProvider: Send + Sync {
    /// Absolute or relative path of the watched folder, if configured.
    fn folder_path(&self) -> Option<PathBuf>;
}

impl SettingsProvider for PathBuf {
    fn folder_path(&self) -> Option<PathBuf> {
        Some(self.clone())
    }
}

/// Retry policy while a new file is still held open by its writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRetryPolicy {
    pub interval: Duration,
    /// `None` waits indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for LockRetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl LockRetryPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = Some(max);
        self
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxerSettings {
    pub folder_path: Option<PathBuf>,
    pub lock_retry: LockRetryPolicy,
}

impl BoxerSettings {
    pub fn new(folder_path: impl Into<PathBuf>) -> Self {
        Self {
            folder_path: Some(folder_path.into()),
            lock_retry: LockRetryPolicy::default(),
        }
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let folder_path = lookup(FOLDER_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let mut lock_retry = LockRetryPolicy::default();
        if let Some(ms) = parse_var::<u64>(&lookup, LOCK_RETRY_MS_VAR)? {
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    var: LOCK_RETRY_MS_VAR,
                    value: ms.to_string(),
                });
            }
            lock_retry.interval = Duration::from_millis(ms);
        }
        lock_retry.max_attempts = parse_var::<u32>(&lookup, LOCK_MAX_ATTEMPTS_VAR)?;

        Ok(Self {
            folder_path,
            lock_retry,
        })
    }

    /// The folder path, or the configuration error the watcher reports.
    pub fn require_folder_path(&self) -> Result<PathBuf, ConfigError> {
        self.folder_path.clone().ok_or(ConfigError::MissingFolderPath)
    }
}

impl SettingsProvider for BoxerSettings {
    fn folder_path(&self) -> Option<PathBuf> {
        self.folder_path.clone()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}
