use serde::{Deserialize, Serialize};

use super::identifiers::{EpisodeId, ProgressKey};
use super::quality::QualityTier;

/// Localized series title as shown in the player chrome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTitle {
    pub primary: String,
    pub secondary: Option<String>,
}

/// Opening sequence of an episode, in seconds from the start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningInterval {
    pub start: f64,
    pub stop: f64,
}

impl OpeningInterval {
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.stop
    }
}

/// Ending sequence of an episode. Only `start` drives playback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndingMarker {
    pub start: f64,
    pub stop: Option<f64>,
}

/// Encoded renditions available for an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Renditions {
    pub p1080: Option<String>,
    pub p720: Option<String>,
    pub p480: Option<String>,
}

impl Renditions {
    pub fn url_for(&self, tier: QualityTier) -> Option<&str> {
        let url = match tier {
            QualityTier::P1080 => self.p1080.as_deref(),
            QualityTier::P720 => self.p720.as_deref(),
            QualityTier::P480 => self.p480.as_deref(),
        };
        url.filter(|u| !u.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        QualityTier::DESCENDING
            .iter()
            .all(|tier| self.url_for(*tier).is_none())
    }
}

/// Everything the playback core needs to know about one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMedia {
    pub id: EpisodeId,
    pub series_external_id: u64,
    pub number: u32,
    pub title: SeriesTitle,
    pub renditions: Renditions,
    /// Single-source URL used by episodes published before renditions existed
    pub video_url: Option<String>,
    pub preview_image: Option<String>,
    /// Total duration in seconds; zero when the catalog does not know it
    pub duration: f64,
    pub opening: Option<OpeningInterval>,
    pub ending: Option<EndingMarker>,
}

impl EpisodeMedia {
    pub fn progress_key(&self) -> ProgressKey {
        ProgressKey::new(self.series_external_id, self.number)
    }

    /// Poster URL, composed from the media host and the preview path.
    pub fn poster_url(&self, media_base_url: &str) -> Option<String> {
        self.preview_image
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", media_base_url.trim_end_matches('/'), path))
    }
}

/// Where the catalog says playback continues after the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEpisode {
    pub next_episode_number: u32,
    pub season_sort_order: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_interval_is_half_open() {
        let opening = OpeningInterval {
            start: 90.0,
            stop: 180.0,
        };
        assert!(!opening.contains(89.9));
        assert!(opening.contains(90.0));
        assert!(opening.contains(179.9));
        assert!(!opening.contains(180.0));
    }

    #[test]
    fn test_renditions_ignore_empty_urls() {
        let renditions = Renditions {
            p1080: Some(String::new()),
            p720: None,
            p480: None,
        };
        assert!(renditions.is_empty());
        assert_eq!(renditions.url_for(QualityTier::P1080), None);
    }

    #[test]
    fn test_poster_url_joins_base_and_path() {
        let episode = crate::test_utils::episode_fixture();
        assert_eq!(
            episode.poster_url("https://media.example/").as_deref(),
            Some("https://media.example/storage/previews/3.jpg")
        );
    }
}
