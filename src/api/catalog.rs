use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::client::ApiClient;
use super::errors::ApiError;
use crate::models::{
    EndingMarker, EpisodeId, EpisodeMedia, NextEpisode, OpeningInterval, Renditions, SeriesAlias,
    SeriesTitle,
};

/// Episode metadata provider.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn episode(
        &self,
        alias: &SeriesAlias,
        season: u32,
        number: u32,
    ) -> Result<EpisodeMedia, ApiError>;

    /// Where playback continues after the given episode, if anywhere.
    async fn next_episode(
        &self,
        alias: &SeriesAlias,
        season: u32,
        number: u32,
    ) -> Result<Option<NextEpisode>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct EpisodeRecord {
    id: Value,
    #[serde(alias = "ordinal")]
    number: u32,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    preview_image: Option<String>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    video_url_1080: Option<String>,
    #[serde(default)]
    video_url_720: Option<String>,
    #[serde(default)]
    video_url_480: Option<String>,
    #[serde(default)]
    opening: Option<MarkerRecord>,
    #[serde(default)]
    ending: Option<MarkerRecord>,
    #[serde(rename = "animeRelease", default)]
    anime_release: Option<ReleaseRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct MarkerRecord {
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    stop: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseRecord {
    #[serde(default)]
    title_ru: Option<String>,
    #[serde(default)]
    title_en: Option<String>,
    #[serde(default)]
    external_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NextEpisodeRecord {
    #[serde(default)]
    next_episode_number: Option<u32>,
    #[serde(default)]
    season_sort_order: Option<u32>,
}

/// Strings and numbers both show up for identifiers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl EpisodeRecord {
    fn into_media(self) -> Result<EpisodeMedia, ApiError> {
        let id = id_string(&self.id)
            .map(EpisodeId::new)
            .ok_or_else(|| ApiError::ParseError(format!("episode id {} is not usable", self.id)))?;

        let release = self.anime_release.unwrap_or_default();
        let series_external_id = release
            .external_id
            .as_ref()
            .and_then(id_string)
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or_else(|| {
                warn!("Episode {} has no numeric series external id", id);
                0
            });

        let title_ru = non_empty(release.title_ru);
        let title_en = non_empty(release.title_en);
        let title = match (title_ru, title_en) {
            (Some(primary), secondary) => SeriesTitle { primary, secondary },
            (None, Some(primary)) => SeriesTitle {
                primary,
                secondary: None,
            },
            (None, None) => SeriesTitle::default(),
        };

        let opening = self.opening.and_then(|m| match (m.start, m.stop) {
            (Some(start), Some(stop)) if stop > start => Some(OpeningInterval { start, stop }),
            _ => None,
        });
        let ending = self.ending.and_then(|m| {
            m.start.map(|start| EndingMarker {
                start,
                stop: m.stop,
            })
        });

        Ok(EpisodeMedia {
            id,
            series_external_id,
            number: self.number,
            title,
            renditions: Renditions {
                p1080: non_empty(self.video_url_1080),
                p720: non_empty(self.video_url_720),
                p480: non_empty(self.video_url_480),
            },
            video_url: non_empty(self.video_url),
            preview_image: non_empty(self.preview_image),
            duration: self.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0),
            opening,
            ending,
        })
    }
}

/// [`CatalogApi`] over the REST backend.
#[derive(Clone)]
pub struct HttpCatalogApi {
    client: ApiClient,
}

impl HttpCatalogApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn episode(
        &self,
        alias: &SeriesAlias,
        season: u32,
        number: u32,
    ) -> Result<EpisodeMedia, ApiError> {
        let season = season.to_string();
        let number = number.to_string();
        let record: EpisodeRecord = self
            .client
            .get_json(
                &[
                    "episodes",
                    alias.as_str(),
                    "seasons",
                    season.as_str(),
                    "episodes",
                    number.as_str(),
                ],
                "get_episode",
            )
            .await?;

        let media = record.into_media()?;
        debug!(
            "Fetched episode {} ({} #{}), {} renditions",
            media.id,
            alias,
            media.number,
            crate::models::QualityTier::DESCENDING
                .iter()
                .filter(|tier| media.renditions.url_for(**tier).is_some())
                .count()
        );
        Ok(media)
    }

    async fn next_episode(
        &self,
        alias: &SeriesAlias,
        season: u32,
        number: u32,
    ) -> Result<Option<NextEpisode>, ApiError> {
        let season = season.to_string();
        let number = number.to_string();
        let result: Result<Option<NextEpisodeRecord>, ApiError> = self
            .client
            .get_json(
                &[
                    "episodes",
                    alias.as_str(),
                    "seasons",
                    season.as_str(),
                    "episodes",
                    number.as_str(),
                    "next",
                ],
                "get_next_episode",
            )
            .await;

        match result {
            Ok(record) => Ok(record.and_then(|r| {
                r.next_episode_number
                    .filter(|n| *n > 0)
                    .map(|next_episode_number| NextEpisode {
                        next_episode_number,
                        season_sort_order: r.season_sort_order,
                    })
            })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
