use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::WatchStateApi;
use crate::models::EpisodeId;

/// Reports "watching" and "watched" for the current episode, each at most once.
///
/// Calls run as background tasks; failures are logged and otherwise ignored.
/// Without an authenticated API every call is a silent no-op.
pub struct WatchTracker {
    api: Option<Arc<dyn WatchStateApi>>,
    episode: Option<EpisodeId>,
    marked_watching: bool,
    marked_watched: bool,
    pending: Vec<JoinHandle<()>>,
}

impl WatchTracker {
    pub fn new(api: Option<Arc<dyn WatchStateApi>>, authenticated: bool) -> Self {
        Self {
            api: api.filter(|_| authenticated),
            episode: None,
            marked_watching: false,
            marked_watched: false,
            pending: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    /// Start tracking `episode_id`. Switching episodes clears both flags.
    pub fn begin_episode(&mut self, episode_id: EpisodeId) {
        if self.episode.as_ref() == Some(&episode_id) {
            return;
        }
        debug!("Tracking watch state for episode {}", episode_id);
        self.episode = Some(episode_id);
        self.marked_watching = false;
        self.marked_watched = false;
    }

    /// Returns `true` if a call was dispatched.
    pub fn mark_watching(&mut self) -> bool {
        if self.marked_watching {
            return false;
        }
        let Some((api, episode_id)) = self.target() else {
            return false;
        };
        self.marked_watching = true;

        self.spawn("mark_watching", async move {
            api.mark_watching(&episode_id).await.map(|()| episode_id)
        })
    }

    /// Returns `true` if a call was dispatched.
    pub fn mark_watched(&mut self) -> bool {
        if self.marked_watched {
            return false;
        }
        let Some((api, episode_id)) = self.target() else {
            return false;
        };
        self.marked_watched = true;

        self.spawn("mark_watched", async move {
            api.mark_watched(&episode_id, true).await.map(|()| episode_id)
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.iter().filter(|task| !task.is_finished()).count()
    }

    /// Wait for every dispatched call to finish.
    pub async fn drain(&mut self) {
        let tasks = std::mem::take(&mut self.pending);
        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                warn!("Watch state task failed: {}", e);
            }
        }
    }

    fn target(&self) -> Option<(Arc<dyn WatchStateApi>, EpisodeId)> {
        let api = self.api.clone()?;
        let episode_id = self.episode.clone().filter(|id| !id.is_empty())?;
        Some((api, episode_id))
    }

    fn spawn<F>(&mut self, operation: &'static str, call: F) -> bool
    where
        F: std::future::Future<Output = Result<EpisodeId, crate::api::ApiError>> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("{}: no async runtime, skipping", operation);
            return false;
        };

        self.pending.retain(|task| !task.is_finished());
        self.pending.push(runtime.spawn(async move {
            match call.await {
                Ok(episode_id) => info!("{} sent for episode {}", operation, episode_id),
                Err(e) => warn!("{} failed: {}", operation, e),
            }
        }));
        true
    }
}
