//! Client-side persistence for player preferences and resume positions.
//!
//! Both stores keep one small record per file, wrapped in an envelope that
//! carries an expiry timestamp. A record past its expiry reads as absent, and
//! every write pushes the expiry forward.

pub mod progress_store;
pub mod settings_store;

pub use progress_store::ProgressStore;
pub use settings_store::SettingsStore;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::utils::StorageError;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

/// A single expiring record on disk, or in memory when no path is given.
#[derive(Debug, Clone)]
pub(crate) struct RecordFile {
    path: Option<PathBuf>,
    ttl: Duration,
}

impl RecordFile {
    pub(crate) fn new(path: Option<PathBuf>, ttl: Duration) -> Self {
        Self { path, ttl }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn read<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)?;
        let envelope: Envelope<T> = match serde_json::from_str(&contents) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Discarding unreadable record {:?}: {}", path, e);
                return Ok(None);
            }
        };

        if envelope.expires_at <= Utc::now() {
            debug!("Record {:?} expired at {}", path, envelope.expires_at);
            return Ok(None);
        }

        Ok(Some(envelope.value))
    }

    pub(crate) fn write<T: Serialize>(&self, value: &T) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let envelope = Envelope {
            value,
            expires_at: Utc::now() + self.ttl,
        };
        let contents = serde_json::to_string(&envelope)?;

        // Replace atomically
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub(crate) fn clear(&self) -> Result<(), StorageError> {
        if let Some(path) = &self.path
            && path.exists()
        {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
