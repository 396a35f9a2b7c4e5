use serde::{Deserialize, Serialize};

use super::episode::{EpisodeMedia, NextEpisode};
use super::identifiers::SeriesAlias;

/// The episode being played together with where it sits in its series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeContext {
    pub alias: SeriesAlias,
    pub season: u32,
    pub episode: EpisodeMedia,
    /// `None` for the last published episode
    pub next: Option<NextEpisode>,
}

impl EpisodeContext {
    pub fn new(alias: SeriesAlias, season: u32, episode: EpisodeMedia) -> Self {
        Self {
            alias,
            season,
            episode,
            next: None,
        }
    }

    pub fn with_next(mut self, next: Option<NextEpisode>) -> Self {
        self.next = next;
        self
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Season to navigate to for the next episode.
    pub fn next_season(&self) -> Option<u32> {
        self.next
            .map(|next| next.season_sort_order.unwrap_or(self.season))
    }
}
