use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::listeners::{EventSender, ListenerRegistry, SessionMessage};
use super::orientation::OrientationLock;
use super::progress_tracker::{ProgressTracker, resume_position};
use super::quality::{QualitySelection, choose_quality, select_quality};
use super::skip_markers::{PolicyThresholds, SkipAdvancePolicy, SkipAdvanceState};
use super::stream_adapter::{StreamAdapter, is_manifest_url};
use super::traits::{
    EpisodeNavigator, HlsBackend, MediaPlayer, OverlaySink, PlayerFactory, ScreenOrientation,
};
use super::types::{DecodeConfig, PlayerConfig, PlayerEvent, SessionPhase, SourceKind};
use crate::api::WatchStateApi;
use crate::config::Config;
use crate::constants::{
    HLS_MIME_TYPE, OVERLAY_BOTTOM_OFFSET_FULLSCREEN_PX, OVERLAY_BOTTOM_OFFSET_PX,
};
use crate::models::{
    EpisodeContext, NextEpisode, PlayerSettings, PlayerSettingsPatch, QualityOption, QualityTier,
};
use crate::services::WatchTracker;
use crate::storage::{ProgressStore, SettingsStore};
use crate::utils::messages::playback_error_message;
use crate::utils::{Language, PlaybackError};

/// Tunables for one controller.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub language: Language,
    /// Resume seeks and watch-state calls only happen for signed-in users
    pub authenticated: bool,
    pub media_base_url: String,
    pub time_update_interval: Duration,
    pub thresholds: PolicyThresholds,
    pub decode: DecodeConfig,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            language: config.general.language,
            authenticated: config.is_authenticated(),
            media_base_url: config.api.media_base_url.clone(),
            time_update_interval: config.playback.time_update_interval(),
            thresholds: PolicyThresholds {
                watching_threshold: config.playback.watching_threshold_seconds,
                near_end_margin: config.playback.near_end_margin_seconds,
            },
            decode: DecodeConfig {
                back_buffer_seconds: config.playback.back_buffer_seconds,
                enable_worker: config.playback.worker_decoding,
                low_latency: config.playback.low_latency,
            },
        }
    }
}

/// Platform pieces the controller drives.
pub struct Collaborators {
    pub factory: Box<dyn PlayerFactory>,
    pub hls: Box<dyn HlsBackend>,
    pub overlay: Box<dyn OverlaySink>,
    pub navigator: Box<dyn EpisodeNavigator>,
    pub orientation: Option<Box<dyn ScreenOrientation>>,
    pub watch_api: Option<Arc<dyn WatchStateApi>>,
}

/// Owns one player for the lifetime of an episode page.
///
/// Player and decoder callbacks only enqueue messages; the host calls
/// [`process_pending`](Self::process_pending) on its event loop to apply them.
pub struct PlaybackController {
    options: ControllerOptions,
    factory: Box<dyn PlayerFactory>,
    overlay: Box<dyn OverlaySink>,
    navigator: Box<dyn EpisodeNavigator>,
    adapter: StreamAdapter,
    orientation: OrientationLock,
    settings: SettingsStore,
    progress: ProgressStore,
    watch: WatchTracker,
    policy: SkipAdvancePolicy,
    throttle: ProgressTracker,
    listeners: ListenerRegistry,

    events_tx: mpsc::UnboundedSender<(u64, SessionMessage)>,
    events_rx: mpsc::UnboundedReceiver<(u64, SessionMessage)>,
    generation: u64,
    sender: Option<EventSender>,

    player: Option<Box<dyn MediaPlayer>>,
    phase: SessionPhase,
    mounted: bool,
    ready_seen: bool,
    fullscreen: bool,
    context: Option<EpisodeContext>,
    selection: QualitySelection,
    source_url: Option<String>,
    error: Option<PlaybackError>,
}

impl PlaybackController {
    pub fn new(
        collaborators: Collaborators,
        settings: SettingsStore,
        progress: ProgressStore,
        options: ControllerOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut policy = SkipAdvancePolicy::new(options.thresholds);
        policy.set_auto_skip(settings.get().auto_skip);
        policy.set_auto_next(settings.get().auto_next);

        Self {
            factory: collaborators.factory,
            overlay: collaborators.overlay,
            navigator: collaborators.navigator,
            adapter: StreamAdapter::new(collaborators.hls, options.decode.clone()),
            orientation: OrientationLock::new(collaborators.orientation),
            watch: WatchTracker::new(collaborators.watch_api, options.authenticated),
            throttle: ProgressTracker::new(options.time_update_interval),
            policy,
            settings,
            progress,
            listeners: ListenerRegistry::new(),
            events_tx,
            events_rx,
            generation: 0,
            sender: None,
            player: None,
            phase: SessionPhase::Idle,
            mounted: false,
            ready_seen: false,
            fullscreen: false,
            context: None,
            selection: QualitySelection::default(),
            source_url: None,
            error: None,
            options,
        }
    }

    // === State accessors ===

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        self.error.as_ref()
    }

    /// Localized text for the blocking error overlay.
    pub fn error_message(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| playback_error_message(self.options.language, e))
    }

    pub fn skip_advance_state(&self) -> SkipAdvanceState {
        self.policy.state()
    }

    pub fn has_skipped_opening(&self) -> bool {
        self.policy.has_skipped_opening()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn quality_options(&self) -> &[QualityOption] {
        &self.selection.options
    }

    pub fn settings(&self) -> &PlayerSettings {
        self.settings.get()
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn context(&self) -> Option<&EpisodeContext> {
        self.context.as_ref()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn watch_tracker_mut(&mut self) -> &mut WatchTracker {
        &mut self.watch
    }

    // === Lifecycle ===

    /// The host's video container exists; a pending source starts now.
    pub fn mount(&mut self) {
        if self.phase == SessionPhase::Destroyed {
            warn!("Mount after teardown ignored");
            return;
        }
        self.mounted = true;
        if let Some(url) = self.source_url.clone()
            && self.player.is_none()
            && self.phase == SessionPhase::Idle
        {
            self.initialize(&url);
        }
    }

    /// Show `context`. Creates the player on first use and swaps the source
    /// of the live player afterwards.
    pub fn load_episode(&mut self, context: EpisodeContext) {
        if self.phase == SessionPhase::Destroyed {
            warn!("Episode load after teardown ignored");
            return;
        }

        info!(
            "Loading {} season {} episode {}",
            context.alias, context.season, context.episode.number
        );
        self.policy.load_episode(&context.episode, context.has_next());
        self.watch.begin_episode(context.episode.id.clone());
        self.throttle.reset();
        self.overlay.set_skip_visible(false);
        self.overlay.set_next_visible(false);

        let selection = select_quality(&context.episode, &mut self.settings);
        self.context = Some(context);
        let url = selection.url.clone();
        self.selection = selection;

        match url {
            Some(url) => self.apply_source(url),
            None => {
                warn!("Episode has no playable source");
                self.source_url = None;
                self.fail(PlaybackError::EmptyUrl);
            }
        }
    }

    /// Next-episode info often arrives after the episode itself.
    pub fn set_next_episode(&mut self, next: Option<NextEpisode>) {
        self.policy.set_has_next(next.is_some());
        if let Some(context) = self.context.as_mut() {
            context.next = next;
        }
    }

    /// Apply queued player and decoder messages. Returns how many were handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok((generation, message)) = self.events_rx.try_recv() {
            if generation != self.generation || self.player.is_none() {
                trace!("Dropping message from generation {}", generation);
                continue;
            }
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Tear everything down. The controller cannot be reused afterwards.
    pub fn unmount(&mut self) {
        if self.phase == SessionPhase::Destroyed {
            debug!("Already torn down");
            return;
        }

        if let Some(mut player) = self.player.take() {
            self.adapter.teardown(player.media_element());
            let removed = self.listeners.clear(player.as_mut());
            player.destroy();
            debug!("Destroyed player, removed {} listeners", removed);
        }
        self.orientation.release();
        self.overlay.remove();

        // Anything still queued or emitted later belongs to a dead generation
        self.generation += 1;
        self.sender = None;
        while self.events_rx.try_recv().is_ok() {}

        self.mounted = false;
        self.phase = SessionPhase::Destroyed;
        info!("Playback session torn down");
    }

    // === User actions ===

    pub fn select_quality(&mut self, tier: QualityTier) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        info!("Quality changed to {}", tier);
        let selection = choose_quality(&context.episode, tier, &mut self.settings);
        let url = selection.url.clone();
        self.selection = selection;

        if let Some(url) = url
            && self.source_url.as_deref() != Some(url.as_str())
        {
            self.apply_source(url);
        }
    }

    pub fn set_auto_skip(&mut self, enabled: bool) {
        self.settings.update(&PlayerSettingsPatch {
            auto_skip: Some(enabled),
            ..Default::default()
        });
        self.policy.set_auto_skip(enabled);
    }

    pub fn set_auto_next(&mut self, enabled: bool) {
        self.settings.update(&PlayerSettingsPatch {
            auto_next: Some(enabled),
            ..Default::default()
        });
        self.policy.set_auto_next(enabled);
    }

    /// The skip affordance was clicked.
    pub fn skip_opening(&mut self) {
        let Some(target) = self.policy.skip_opening() else {
            return;
        };
        self.overlay.set_skip_visible(false);
        if let Some(player) = self.player.as_mut() {
            player.seek(target);
        }
    }

    /// Shared by the next affordance and auto-advance. Returns `false` when
    /// there is nowhere to go.
    pub fn next_episode(&mut self) -> bool {
        let Some(context) = self.context.as_ref() else {
            return false;
        };
        let (Some(next), Some(season)) = (context.next, context.next_season()) else {
            debug!("No next episode");
            return false;
        };
        let alias = context.alias.clone();
        let finished = context.episode.progress_key();

        self.policy.hide_next();
        self.overlay.set_next_visible(false);
        if let Err(e) = self.progress.remove(finished) {
            warn!("Failed to clear progress for {}: {}", finished, e);
        }

        info!(
            "Advancing to {} season {} episode {}",
            alias, season, next.next_episode_number
        );
        self.navigator
            .open_episode(&alias, season, next.next_episode_number);
        true
    }

    /// Retry after an error: re-issue the source load on the existing player,
    /// or run initialization again if there is no player.
    pub fn retry(&mut self) {
        if self.phase == SessionPhase::Destroyed {
            return;
        }
        let Some(url) = self.source_url.clone() else {
            self.fail(PlaybackError::EmptyUrl);
            return;
        };
        info!("Retrying {}", url);

        if self.player.is_none() {
            self.phase = SessionPhase::Idle;
            self.error = None;
            self.initialize(&url);
            return;
        }

        if let Err(e) = self.validate(&url) {
            self.fail(e);
            return;
        }
        if let Err(e) = self.load_source(&url) {
            self.fail(e);
            return;
        }
        self.error = None;
        self.phase = self.live_phase();
        self.resume_playback();
    }

    // === Internals ===

    fn apply_source(&mut self, url: String) {
        self.source_url = Some(url.clone());
        if self.player.is_some() {
            self.swap_source(&url);
        } else if self.mounted {
            self.initialize(&url);
        } else {
            debug!("Container not mounted yet, deferring player creation");
        }
    }

    fn validate(&self, url: &str) -> Result<(), PlaybackError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PlaybackError::EmptyUrl);
        }
        let parsed = Url::parse(url).map_err(|_| PlaybackError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PlaybackError::InvalidUrl(url.to_string()));
        }
        if is_manifest_url(url)
            && !self
                .adapter
                .can_decode(self.factory.can_play_type(HLS_MIME_TYPE))
        {
            return Err(PlaybackError::UnsupportedFormat);
        }
        Ok(())
    }

    fn initialize(&mut self, url: &str) {
        if self.player.is_some() {
            debug!("Player already initialized, ignoring");
            return;
        }
        if !self.mounted {
            return;
        }

        self.phase = SessionPhase::Initializing;
        self.error = None;
        self.ready_seen = false;

        if let Err(e) = self.validate(url) {
            self.fail(e);
            return;
        }

        let settings = self.settings.get();
        let config = PlayerConfig {
            url: (!is_manifest_url(url)).then(|| url.to_string()),
            poster: self.poster_url(),
            title: self.title(),
            volume: settings.volume.unwrap_or(1.0),
            playback_rate: settings.speed.unwrap_or(1.0),
            autoplay: false,
        };

        let mut player = match self.factory.create(&config) {
            Ok(player) => player,
            Err(e) => {
                error!("Failed to construct player: {}", e);
                let e = match e {
                    PlaybackError::Construction(_) => e,
                    other => PlaybackError::Construction(other.to_string()),
                };
                self.fail(e);
                return;
            }
        };

        self.generation += 1;
        let sender = EventSender::new(self.generation, self.events_tx.clone());
        self.listeners.bind_all(player.as_mut(), &sender);

        let loaded = match self.adapter.load(player.media_element(), url, &sender) {
            Ok(kind) => {
                debug!("Source attached as {:?}", kind);
                Ok(())
            }
            Err(e) => Err(PlaybackError::from(e)),
        };

        self.player = Some(player);
        self.sender = Some(sender);
        info!("Player created for {}", url);

        if let Err(e) = loaded {
            self.fail(e);
        }
    }

    fn swap_source(&mut self, url: &str) {
        if let Err(e) = self.validate(url) {
            self.fail(e);
            return;
        }
        if let Err(e) = self.load_source(url) {
            self.fail(e);
            return;
        }

        let poster = self.poster_url();
        let title = self.title();
        if let Some(player) = self.player.as_mut() {
            player.set_poster(poster.as_deref());
            player.set_title(&title);
            player.set_quality_menu(&self.selection.options);
        }
        self.policy.reset_source();

        if self.phase == SessionPhase::Error {
            self.error = None;
            self.phase = self.live_phase();
        }
        info!("Switched source to {}", url);
        self.resume_playback();
    }

    fn load_source(&mut self, url: &str) -> Result<(), PlaybackError> {
        let (Some(player), Some(sender)) = (self.player.as_mut(), self.sender.as_ref()) else {
            return Ok(());
        };
        match self.adapter.load(player.media_element(), url, sender)? {
            SourceKind::Passthrough => player.switch_url(url),
            SourceKind::Library | SourceKind::Native => Ok(()),
        }
    }

    fn resume_playback(&mut self) {
        if let Some(player) = self.player.as_mut()
            && let Err(e) = player.play()
        {
            warn!("Auto-resume failed: {}", e);
        }
    }

    fn live_phase(&self) -> SessionPhase {
        if self.ready_seen {
            SessionPhase::Ready
        } else {
            SessionPhase::Initializing
        }
    }

    fn fail(&mut self, error: PlaybackError) {
        warn!("Playback error: {}", error);
        self.error = Some(error);
        self.phase = SessionPhase::Error;
    }

    fn poster_url(&self) -> Option<String> {
        self.context
            .as_ref()
            .and_then(|c| c.episode.poster_url(&self.options.media_base_url))
    }

    fn title(&self) -> String {
        self.context
            .as_ref()
            .map(|c| c.episode.title.primary.clone())
            .unwrap_or_default()
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Player(event) => self.handle_player_event(event),
            SessionMessage::Decoder(error) => {
                if let Some(player) = self.player.as_mut() {
                    let recovery = self
                        .adapter
                        .handle_decode_error(player.media_element(), &error);
                    debug!("Decode error handled: {:?}", recovery);
                }
            }
        }
    }

    fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready => self.on_ready(),
            PlayerEvent::Play => self.on_play(),
            PlayerEvent::TimeUpdate { current_time } => {
                if self.phase == SessionPhase::Ready && self.throttle.should_process() {
                    self.on_time_update(current_time);
                }
            }
            PlayerEvent::Ended => {
                self.watch.mark_watched();
            }
            PlayerEvent::Error(fault) => {
                let error = fault.classify();
                error!("Media error: {}", error);
                self.fail(error);
            }
            PlayerEvent::Fullscreen(enabled) => self.on_fullscreen(enabled),
        }
    }

    fn on_ready(&mut self) {
        self.ready_seen = true;
        if self.phase == SessionPhase::Initializing {
            self.phase = SessionPhase::Ready;
        }
        self.overlay.install();
        self.overlay.set_bottom_offset(OVERLAY_BOTTOM_OFFSET_PX);
        if let Some(player) = self.player.as_mut() {
            player.set_quality_menu(&self.selection.options);
        }
        debug!("Player ready ({:?})", self.phase);
    }

    fn on_play(&mut self) {
        if self.phase != SessionPhase::Ready || !self.options.authenticated {
            return;
        }
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let saved = self.progress.load(context.episode.progress_key());
        if let Some(player) = self.player.as_mut()
            && let Some(position) = resume_position(saved, player.current_time())
        {
            info!("Resuming at {}s", position);
            player.seek(position);
        }
    }

    fn on_time_update(&mut self, time: f64) {
        let decision = self.policy.evaluate(time);
        self.overlay.set_skip_visible(decision.state.show_skip);
        self.overlay.set_next_visible(decision.state.show_next);

        if let Some(target) = decision.seek_to
            && let Some(player) = self.player.as_mut()
        {
            player.seek(target);
        }

        if let Some(context) = self.context.as_ref() {
            let key = context.episode.progress_key();
            if let Err(e) = self.progress.save(key, time.max(0.0).floor() as u64) {
                warn!("Failed to save progress for {}: {}", key, e);
            }
        }

        if decision.mark_watching {
            self.watch.mark_watching();
        }
        if decision.mark_watched {
            self.watch.mark_watched();
        }
        if decision.advance {
            self.next_episode();
        }
    }

    fn on_fullscreen(&mut self, enabled: bool) {
        self.fullscreen = enabled;
        if enabled {
            self.overlay.set_bottom_offset(OVERLAY_BOTTOM_OFFSET_FULLSCREEN_PX);
            self.orientation.lock_landscape();
        } else {
            self.overlay.set_bottom_offset(OVERLAY_BOTTOM_OFFSET_PX);
            self.orientation.release();
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if self.phase != SessionPhase::Destroyed {
            self.unmount();
        }
    }
}
