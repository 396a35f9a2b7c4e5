use serde::{Deserialize, Serialize};

use super::quality::QualityTier;

pub const MIN_PLAYBACK_SPEED: f64 = 0.25;
pub const MAX_PLAYBACK_SPEED: f64 = 4.0;

/// Player preferences shared by every episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Last quality the user picked. `None` means "highest available".
    pub quality: Option<QualityTier>,
    pub volume: Option<f64>,
    pub speed: Option<f64>,
    pub auto_skip: bool,
    pub auto_next: bool,
}

impl PlayerSettings {
    /// Clamp numeric fields into the ranges the player accepts.
    pub fn validated(mut self) -> Self {
        self.volume = self
            .volume
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0));
        self.speed = self
            .speed
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED));
        self
    }

    pub fn apply(&mut self, patch: &PlayerSettingsPatch) {
        if let Some(quality) = patch.quality {
            self.quality = Some(quality);
        }
        if let Some(volume) = patch.volume {
            self.volume = Some(volume);
        }
        if let Some(speed) = patch.speed {
            self.speed = Some(speed);
        }
        if let Some(auto_skip) = patch.auto_skip {
            self.auto_skip = auto_skip;
        }
        if let Some(auto_next) = patch.auto_next {
            self.auto_next = auto_next;
        }
    }
}

/// Partial settings update; unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSettingsPatch {
    pub quality: Option<QualityTier>,
    pub volume: Option<f64>,
    pub speed: Option<f64>,
    pub auto_skip: Option<bool>,
    pub auto_next: Option<bool>,
}

impl PlayerSettingsPatch {
    pub fn quality(tier: QualityTier) -> Self {
        Self {
            quality: Some(tier),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
