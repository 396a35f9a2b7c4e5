pub mod episode;
mod identifiers;
pub mod playback_context;
pub mod quality;
pub mod settings;

pub use episode::{
    EndingMarker, EpisodeMedia, NextEpisode, OpeningInterval, Renditions, SeriesTitle,
};
pub use identifiers::{EpisodeId, ProgressKey, SeriesAlias};
pub use playback_context::EpisodeContext;
pub use quality::{QualityOption, QualityTier, UnknownQualityTier};
pub use settings::{PlayerSettings, PlayerSettingsPatch};
