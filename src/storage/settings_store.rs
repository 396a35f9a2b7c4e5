use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::RecordFile;
use crate::constants::STORAGE_EXPIRY_DAYS;
use crate::models::{PlayerSettings, PlayerSettingsPatch, QualityTier};
use crate::utils::StorageError;

/// On-disk shape. Kept loose so older or hand-edited records still load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_skip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_next: Option<bool>,
}

impl StoredSettings {
    fn into_settings(self) -> PlayerSettings {
        let quality = self.quality.and_then(|label| match label.parse::<QualityTier>() {
            Ok(tier) => Some(tier),
            Err(e) => {
                debug!("Ignoring stored quality: {}", e);
                None
            }
        });

        PlayerSettings {
            quality,
            volume: self.volume,
            speed: self.speed,
            auto_skip: self.auto_skip.unwrap_or(false),
            auto_next: self.auto_next.unwrap_or(false),
        }
        .validated()
    }
}

impl From<&PlayerSettings> for StoredSettings {
    fn from(settings: &PlayerSettings) -> Self {
        Self {
            quality: settings.quality.map(|tier| tier.label().to_string()),
            volume: settings.volume,
            speed: settings.speed,
            auto_skip: Some(settings.auto_skip),
            auto_next: Some(settings.auto_next),
        }
    }
}

/// Global player preferences with merge-on-update semantics.
#[derive(Debug)]
pub struct SettingsStore {
    current: PlayerSettings,
    record: RecordFile,
}

impl SettingsStore {
    pub fn in_memory() -> Self {
        Self {
            current: PlayerSettings::default(),
            record: RecordFile::new(None, Duration::days(STORAGE_EXPIRY_DAYS)),
        }
    }

    pub fn open(path: PathBuf, expiry_days: i64) -> Result<Self, StorageError> {
        let record = RecordFile::new(Some(path), Duration::days(expiry_days.max(1)));
        let current = record
            .read::<StoredSettings>()?
            .map(StoredSettings::into_settings)
            .unwrap_or_default();
        Ok(Self { current, record })
    }

    pub fn get(&self) -> &PlayerSettings {
        &self.current
    }

    /// Merge `patch` into the stored settings and persist the result.
    ///
    /// A failed write is logged and the in-memory update is kept.
    pub fn update(&mut self, patch: &PlayerSettingsPatch) -> &PlayerSettings {
        if patch.is_empty() {
            return &self.current;
        }

        let mut next = self.current.clone();
        next.apply(patch);
        self.current = next.validated();

        if let Err(e) = self.record.write(&StoredSettings::from(&self.current)) {
            warn!("Failed to persist player settings: {}", e);
        }
        &self.current
    }
}
