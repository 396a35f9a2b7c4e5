//! In-process player backend without any output.
//!
//! Nothing happens on its own: the host advances the clock and emits events
//! through a [`HeadlessHandle`]. Used by the CLI and integration tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info};

use super::traits::{
    DecodeErrorCallback, DecodeSession, EpisodeNavigator, EventCallback, HlsBackend, ListenerId,
    MediaElement, MediaPlayer, OverlaySink, PlayerFactory,
};
use super::types::{DecodeConfig, EventKind, PlayerConfig, PlayerEvent};
use crate::constants::HLS_MIME_TYPE;
use crate::models::{QualityOption, SeriesAlias};
use crate::utils::{PlaybackError, StreamError};

#[derive(Default)]
struct HeadlessState {
    listeners: Vec<(ListenerId, EventKind, Rc<dyn Fn(PlayerEvent)>)>,
    next_listener: u64,
    current_time: f64,
    source: Option<String>,
    title: String,
    quality_labels: Vec<&'static str>,
    playing: bool,
    destroyed: bool,
}

/// Host-side control of a [`HeadlessPlayer`].
#[derive(Clone)]
pub struct HeadlessHandle {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessHandle {
    /// Deliver `event` to every listener bound for its kind.
    pub fn emit(&self, event: PlayerEvent) {
        let kind = event.kind();
        let callbacks: Vec<_> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(event.clone());
        }
    }

    /// Move the playhead forward and report the new position.
    pub fn advance(&self, seconds: f64) -> f64 {
        let current_time = {
            let mut state = self.state.borrow_mut();
            state.current_time += seconds;
            state.current_time
        };
        self.emit(PlayerEvent::TimeUpdate { current_time });
        current_time
    }

    pub fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    pub fn title(&self) -> String {
        self.state.borrow().title.clone()
    }

    pub fn quality_labels(&self) -> Vec<&'static str> {
        self.state.borrow().quality_labels.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

pub struct HeadlessElement {
    native_hls: bool,
    state: Rc<RefCell<HeadlessState>>,
    session: Option<Rc<dyn DecodeSession>>,
}

impl MediaElement for HeadlessElement {
    fn can_play_type(&self, mime: &str) -> bool {
        self.native_hls && mime == HLS_MIME_TYPE
    }

    fn set_src(&mut self, url: &str) {
        debug!("Element source set to {}", url);
        self.state.borrow_mut().source = Some(url.to_string());
    }

    fn decode_session(&self) -> Option<Rc<dyn DecodeSession>> {
        self.session.clone()
    }

    fn set_decode_session(&mut self, session: Option<Rc<dyn DecodeSession>>) {
        self.session = session;
    }
}

pub struct HeadlessPlayer {
    state: Rc<RefCell<HeadlessState>>,
    element: HeadlessElement,
}

impl MediaPlayer for HeadlessPlayer {
    fn on(&mut self, kind: EventKind, callback: EventCallback) -> ListenerId {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, kind, Rc::from(callback)));
        id
    }

    fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state
            .listeners
            .retain(|(listener, k, _)| !(*listener == id && *k == kind));
        state.listeners.len() != before
    }

    fn switch_url(&mut self, url: &str) -> Result<(), PlaybackError> {
        info!("Player source switched to {}", url);
        let mut state = self.state.borrow_mut();
        state.source = Some(url.to_string());
        state.current_time = 0.0;
        Ok(())
    }

    fn set_poster(&mut self, poster: Option<&str>) {
        debug!("Poster: {:?}", poster);
    }

    fn set_title(&mut self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
    }

    fn set_quality_menu(&mut self, options: &[QualityOption]) {
        let labels: Vec<_> = options.iter().map(QualityOption::label).collect();
        debug!("Quality menu: {:?}", labels);
        self.state.borrow_mut().quality_labels = labels;
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn seek(&mut self, seconds: f64) {
        info!("Seek to {:.1}s", seconds);
        self.state.borrow_mut().current_time = seconds;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.state.borrow_mut().playing = true;
        Ok(())
    }

    fn media_element(&mut self) -> &mut dyn MediaElement {
        &mut self.element
    }

    fn destroy(&mut self) {
        debug!("Headless player destroyed");
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.destroyed = true;
    }
}

/// Creates [`HeadlessPlayer`]s and keeps a handle to each.
#[derive(Clone, Default)]
pub struct HeadlessFactory {
    native_hls: bool,
    handles: Rc<RefCell<Vec<HeadlessHandle>>>,
}

impl HeadlessFactory {
    pub fn new(native_hls: bool) -> Self {
        Self {
            native_hls,
            handles: Rc::default(),
        }
    }

    /// Handle of the most recently created player.
    pub fn latest(&self) -> Option<HeadlessHandle> {
        self.handles.borrow().last().cloned()
    }

    pub fn created(&self) -> usize {
        self.handles.borrow().len()
    }
}

impl PlayerFactory for HeadlessFactory {
    fn create(&self, config: &PlayerConfig) -> Result<Box<dyn MediaPlayer>, PlaybackError> {
        info!("Creating headless player for \"{}\"", config.title);
        let state = Rc::new(RefCell::new(HeadlessState {
            source: config.url.clone(),
            title: config.title.clone(),
            ..Default::default()
        }));
        self.handles.borrow_mut().push(HeadlessHandle {
            state: state.clone(),
        });

        Ok(Box::new(HeadlessPlayer {
            element: HeadlessElement {
                native_hls: self.native_hls,
                state: state.clone(),
                session: None,
            },
            state,
        }))
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.native_hls && mime == HLS_MIME_TYPE
    }
}

pub struct HeadlessDecodeSession {
    id: usize,
    on_error: RefCell<Option<DecodeErrorCallback>>,
}

impl DecodeSession for HeadlessDecodeSession {
    fn load_source(&self, url: &str) -> Result<(), StreamError> {
        info!("Decode session {} loading {}", self.id, url);
        Ok(())
    }

    fn attach_media(&self, _element: &mut dyn MediaElement) -> Result<(), StreamError> {
        debug!("Decode session {} attached", self.id);
        Ok(())
    }

    fn detach_media(&self) -> Result<(), StreamError> {
        debug!("Decode session {} detached", self.id);
        Ok(())
    }

    fn stop_load(&self) -> Result<(), StreamError> {
        debug!("Decode session {} stopped loading", self.id);
        Ok(())
    }

    fn start_load(&self) {
        debug!("Decode session {} restarted loading", self.id);
    }

    fn recover_media_error(&self) {
        debug!("Decode session {} recovering", self.id);
    }

    fn on_error(&self, callback: DecodeErrorCallback) {
        *self.on_error.borrow_mut() = Some(callback);
    }

    fn destroy(&self) {
        debug!("Decode session {} destroyed", self.id);
        self.on_error.borrow_mut().take();
    }
}

/// Segmented-stream decoder that accepts every manifest.
#[derive(Clone, Default)]
pub struct HeadlessHlsBackend {
    sessions: Rc<Cell<usize>>,
}

impl HeadlessHlsBackend {
    pub fn sessions_created(&self) -> usize {
        self.sessions.get()
    }
}

impl HlsBackend for HeadlessHlsBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn create_session(&self, config: &DecodeConfig) -> Result<Rc<dyn DecodeSession>, StreamError> {
        let id = self.sessions.get() + 1;
        self.sessions.set(id);
        debug!(
            "Decode session {} created (back buffer {}s, worker {}, low latency {})",
            id, config.back_buffer_seconds, config.enable_worker, config.low_latency
        );
        Ok(Rc::new(HeadlessDecodeSession {
            id,
            on_error: RefCell::new(None),
        }))
    }
}

/// Overlay that reports visibility changes to the log.
#[derive(Debug, Default)]
pub struct LogOverlay {
    installed: bool,
    skip_visible: bool,
    next_visible: bool,
}

impl OverlaySink for LogOverlay {
    fn install(&mut self) {
        if !self.installed {
            debug!("Overlay installed");
            self.installed = true;
        }
    }

    fn set_skip_visible(&mut self, visible: bool) {
        if self.skip_visible != visible {
            info!("Skip opening button {}", if visible { "shown" } else { "hidden" });
            self.skip_visible = visible;
        }
    }

    fn set_next_visible(&mut self, visible: bool) {
        if self.next_visible != visible {
            info!("Next episode button {}", if visible { "shown" } else { "hidden" });
            self.next_visible = visible;
        }
    }

    fn set_bottom_offset(&mut self, pixels: u32) {
        debug!("Overlay offset {}px", pixels);
    }

    fn remove(&mut self) {
        self.installed = false;
        self.skip_visible = false;
        self.next_visible = false;
    }
}

/// Navigator that remembers where it was sent.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    opened: Rc<RefCell<Vec<(SeriesAlias, u32, u32)>>>,
}

impl RecordingNavigator {
    pub fn opened(&self) -> Vec<(SeriesAlias, u32, u32)> {
        self.opened.borrow().clone()
    }
}

impl EpisodeNavigator for RecordingNavigator {
    fn open_episode(&mut self, alias: &SeriesAlias, season: u32, episode_number: u32) {
        info!(
            "Navigating to {} season {} episode {}",
            alias, season, episode_number
        );
        self.opened
            .borrow_mut()
            .push((alias.clone(), season, episode_number));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_reach_bound_listeners() {
        let factory = HeadlessFactory::new(false);
        let mut player = factory
            .create(&PlayerConfig {
                url: None,
                poster: None,
                title: "Frieren".to_string(),
                volume: 1.0,
                playback_rate: 1.0,
                autoplay: false,
            })
            .unwrap();
        let handle = factory.latest().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = player.on(
            EventKind::TimeUpdate,
            Box::new(move |event| sink.borrow_mut().push(event)),
        );

        assert_eq!(handle.advance(2.5), 2.5);
        player.seek(100.0);
        handle.advance(1.0);
        assert_eq!(
            *seen.borrow(),
            vec![
                PlayerEvent::TimeUpdate { current_time: 2.5 },
                PlayerEvent::TimeUpdate { current_time: 101.0 },
            ]
        );

        assert!(player.off(EventKind::TimeUpdate, id));
        handle.advance(1.0);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(handle.title(), "Frieren");
    }

    #[test]
    fn test_backend_counts_sessions() {
        let backend = HeadlessHlsBackend::default();
        let session = backend.create_session(&DecodeConfig::default()).unwrap();
        session.load_source("https://cdn.example/a.m3u8").unwrap();
        session.destroy();

        assert_eq!(backend.sessions_created(), 1);
        assert!(backend.is_supported());
    }

    #[test]
    fn test_navigator_records_targets() {
        let navigator = RecordingNavigator::default();
        let mut boxed: Box<dyn EpisodeNavigator> = Box::new(navigator.clone());
        boxed.open_episode(&SeriesAlias::new("frieren"), 1, 4);

        assert_eq!(navigator.opened(), vec![(SeriesAlias::new("frieren"), 1, 4)]);
    }
}
