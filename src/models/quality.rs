use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nominal quality tiers the catalog publishes renditions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl QualityTier {
    /// Highest quality first.
    pub const DESCENDING: [QualityTier; 3] =
        [QualityTier::P1080, QualityTier::P720, QualityTier::P480];

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::P1080 => "1080p",
            QualityTier::P720 => "720p",
            QualityTier::P480 => "480p",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quality tier: {0}")]
pub struct UnknownQualityTier(pub String);

impl FromStr for QualityTier {
    type Err = UnknownQualityTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityTier::DESCENDING
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownQualityTier(s.to_string()))
    }
}

/// One entry of the player's quality menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    pub tier: QualityTier,
    pub url: String,
    pub is_default: bool,
}

impl QualityOption {
    pub fn label(&self) -> &'static str {
        self.tier.label()
    }
}
