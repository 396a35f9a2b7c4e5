use tracing::{debug, info};

use crate::models::{EpisodeMedia, PlayerSettingsPatch, QualityOption, QualityTier, Renditions};
use crate::storage::SettingsStore;

/// Outcome of choosing a source for an episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualitySelection {
    /// Menu entries, highest quality first. Empty means no quality menu.
    pub options: Vec<QualityOption>,
    /// URL to play, if the episode has any source at all
    pub url: Option<String>,
}

impl QualitySelection {
    pub fn default_option(&self) -> Option<&QualityOption> {
        self.options.iter().find(|option| option.is_default)
    }

    pub fn has_menu(&self) -> bool {
        !self.options.is_empty()
    }
}

/// Menu entries for every populated rendition.
///
/// The entry matching `preferred` is the default; with no preference the
/// highest quality is. A preference that matches nothing leaves no default.
pub fn build_options(
    renditions: &Renditions,
    preferred: Option<QualityTier>,
) -> Vec<QualityOption> {
    let mut options: Vec<QualityOption> = QualityTier::DESCENDING
        .into_iter()
        .filter_map(|tier| {
            renditions.url_for(tier).map(|url| QualityOption {
                tier,
                url: url.to_string(),
                is_default: preferred == Some(tier),
            })
        })
        .collect();

    if preferred.is_none()
        && let Some(first) = options.first_mut()
    {
        first.is_default = true;
    }

    options
}

/// Pick the source for `episode` from the stored preference.
///
/// When the preference names a rendition the episode lacks, the first entry
/// becomes the default and its label is written back as the new preference.
pub fn select_quality(episode: &EpisodeMedia, settings: &mut SettingsStore) -> QualitySelection {
    let preferred = settings.get().quality;
    let mut options = build_options(&episode.renditions, preferred);

    if !options.iter().any(|option| option.is_default)
        && let Some(first) = options.first_mut()
    {
        first.is_default = true;
        info!(
            "Preferred quality {:?} unavailable for episode {}, falling back to {}",
            preferred.map(|tier| tier.label()),
            episode.id,
            first.tier
        );
        settings.update(&PlayerSettingsPatch::quality(first.tier));
    }

    let url = match options.iter().find(|option| option.is_default) {
        Some(option) => Some(option.url.clone()),
        None => {
            debug!("Episode {} has no renditions, using legacy source", episode.id);
            episode.video_url.clone().filter(|url| !url.is_empty())
        }
    };

    QualitySelection { options, url }
}

/// Persist an explicit user choice and recompute the selection.
pub fn choose_quality(
    episode: &EpisodeMedia,
    tier: QualityTier,
    settings: &mut SettingsStore,
) -> QualitySelection {
    settings.update(&PlayerSettingsPatch::quality(tier));
    select_quality(episode, settings)
}
