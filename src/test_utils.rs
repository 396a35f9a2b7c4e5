#![cfg(test)]

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, WatchStateApi};
use crate::models::{
    EndingMarker, EpisodeContext, EpisodeId, EpisodeMedia, NextEpisode, OpeningInterval,
    QualityOption, Renditions, SeriesAlias, SeriesTitle,
};
use crate::player::controller::{Collaborators, ControllerOptions, PlaybackController};
use crate::player::traits::{
    DecodeErrorCallback, DecodeSession, EpisodeNavigator, EventCallback, HlsBackend, ListenerId,
    MediaElement, MediaPlayer, OverlaySink, PlayerFactory, ScreenOrientation,
};
use crate::player::types::{DecodeConfig, DecodeError, EventKind, PlayerConfig, PlayerEvent};
use crate::storage::{ProgressStore, SettingsStore};
use crate::utils::{PlaybackError, StreamError};

pub const URL_1080: &str = "https://cdn.example/frieren/3/1080.m3u8";
pub const URL_720: &str = "https://cdn.example/frieren/3/720.m3u8";
pub const URL_480: &str = "https://cdn.example/frieren/3/480.m3u8";

/// Episode 3: 1400 s long, opening 90-180, ending from 1380.
pub fn episode_fixture() -> EpisodeMedia {
    EpisodeMedia {
        id: EpisodeId::new("ep-3"),
        series_external_id: 9000,
        number: 3,
        title: SeriesTitle {
            primary: "Провожающая в последний путь Фрирен".to_string(),
            secondary: Some("Frieren".to_string()),
        },
        renditions: Renditions {
            p1080: Some(URL_1080.to_string()),
            p720: Some(URL_720.to_string()),
            p480: Some(URL_480.to_string()),
        },
        video_url: None,
        preview_image: Some("/storage/previews/3.jpg".to_string()),
        duration: 1400.0,
        opening: Some(OpeningInterval {
            start: 90.0,
            stop: 180.0,
        }),
        ending: Some(EndingMarker {
            start: 1380.0,
            stop: None,
        }),
    }
}

/// Episode 3 of season 1, with episode 4 next.
pub fn context_fixture() -> EpisodeContext {
    EpisodeContext::new(SeriesAlias::new("frieren"), 1, episode_fixture()).with_next(Some(
        NextEpisode {
            next_episode_number: 4,
            season_sort_order: None,
        },
    ))
}

// === Player ===

#[derive(Default)]
pub struct PlayerRecord {
    listeners: Vec<(ListenerId, EventKind, Rc<dyn Fn(PlayerEvent)>)>,
    next_listener: u64,
    pub switched: Vec<String>,
    pub posters: Vec<Option<String>>,
    pub titles: Vec<String>,
    pub quality_menus: Vec<Vec<QualityOption>>,
    pub seeks: Vec<f64>,
    pub plays: usize,
    pub current_time: f64,
    pub destroyed: bool,
}

#[derive(Default)]
pub struct ElementRecord {
    native_hls: bool,
    sources: Vec<String>,
    session: Option<Rc<dyn DecodeSession>>,
}

pub struct MockMediaElement {
    record: Rc<RefCell<ElementRecord>>,
}

impl MockMediaElement {
    pub fn new(native_hls: bool) -> Self {
        Self {
            record: Rc::new(RefCell::new(ElementRecord {
                native_hls,
                ..Default::default()
            })),
        }
    }

    pub fn sources(&self) -> Vec<String> {
        self.record.borrow().sources.clone()
    }

    pub fn session(&self) -> Option<Rc<dyn DecodeSession>> {
        self.record.borrow().session.clone()
    }
}

impl MediaElement for MockMediaElement {
    fn can_play_type(&self, mime: &str) -> bool {
        self.record.borrow().native_hls && mime == crate::constants::HLS_MIME_TYPE
    }

    fn set_src(&mut self, url: &str) {
        self.record.borrow_mut().sources.push(url.to_string());
    }

    fn decode_session(&self) -> Option<Rc<dyn DecodeSession>> {
        self.record.borrow().session.clone()
    }

    fn set_decode_session(&mut self, session: Option<Rc<dyn DecodeSession>>) {
        self.record.borrow_mut().session = session;
    }
}

pub struct MockPlayer {
    record: Rc<RefCell<PlayerRecord>>,
    element: MockMediaElement,
}

/// Test-side view of a [`MockPlayer`] that has been handed to the controller.
#[derive(Clone)]
pub struct PlayerHandle {
    record: Rc<RefCell<PlayerRecord>>,
    element: Rc<RefCell<ElementRecord>>,
}

impl MockPlayer {
    pub fn new(native_hls: bool) -> (Self, PlayerHandle) {
        let record = Rc::new(RefCell::new(PlayerRecord::default()));
        let element = MockMediaElement::new(native_hls);
        let handle = PlayerHandle {
            record: record.clone(),
            element: element.record.clone(),
        };
        (Self { record, element }, handle)
    }
}

impl PlayerHandle {
    pub fn emit(&self, event: PlayerEvent) {
        let kind = event.kind();
        let callbacks: Vec<_> = self
            .record
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

    pub fn listener_count(&self) -> usize {
        self.record.borrow().listeners.len()
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.record.borrow_mut().current_time = seconds;
    }

    pub fn record(&self) -> std::cell::Ref<'_, PlayerRecord> {
        self.record.borrow()
    }

    pub fn element_sources(&self) -> Vec<String> {
        self.element.borrow().sources.clone()
    }

    pub fn element_session(&self) -> Option<Rc<dyn DecodeSession>> {
        self.element.borrow().session.clone()
    }
}

impl MediaPlayer for MockPlayer {
    fn on(&mut self, kind: EventKind, callback: EventCallback) -> ListenerId {
        let mut record = self.record.borrow_mut();
        record.next_listener += 1;
        let id = ListenerId(record.next_listener);
        record.listeners.push((id, kind, Rc::from(callback)));
        id
    }

    fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let mut record = self.record.borrow_mut();
        let before = record.listeners.len();
        record
            .listeners
            .retain(|(listener, k, _)| !(*listener == id && *k == kind));
        record.listeners.len() != before
    }

    fn switch_url(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.record.borrow_mut().switched.push(url.to_string());
        Ok(())
    }

    fn set_poster(&mut self, poster: Option<&str>) {
        self.record
            .borrow_mut()
            .posters
            .push(poster.map(str::to_string));
    }

    fn set_title(&mut self, title: &str) {
        self.record.borrow_mut().titles.push(title.to_string());
    }

    fn set_quality_menu(&mut self, options: &[QualityOption]) {
        self.record.borrow_mut().quality_menus.push(options.to_vec());
    }

    fn current_time(&self) -> f64 {
        self.record.borrow().current_time
    }

    fn seek(&mut self, seconds: f64) {
        let mut record = self.record.borrow_mut();
        record.seeks.push(seconds);
        record.current_time = seconds;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.record.borrow_mut().plays += 1;
        Ok(())
    }

    fn media_element(&mut self) -> &mut dyn MediaElement {
        &mut self.element
    }

    fn destroy(&mut self) {
        self.record.borrow_mut().destroyed = true;
    }
}

#[derive(Clone, Default)]
pub struct MockPlayerFactory {
    native_hls: bool,
    fail: Rc<Cell<bool>>,
    configs: Rc<RefCell<Vec<PlayerConfig>>>,
    players: Rc<RefCell<Vec<PlayerHandle>>>,
}

impl MockPlayerFactory {
    pub fn new(native_hls: bool) -> Self {
        Self {
            native_hls,
            ..Default::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn created(&self) -> usize {
        self.players.borrow().len()
    }

    pub fn configs(&self) -> Vec<PlayerConfig> {
        self.configs.borrow().clone()
    }

    /// Most recently created player.
    pub fn player(&self) -> PlayerHandle {
        self.players
            .borrow()
            .last()
            .cloned()
            .expect("no player created")
    }
}

impl PlayerFactory for MockPlayerFactory {
    fn create(&self, config: &PlayerConfig) -> Result<Box<dyn MediaPlayer>, PlaybackError> {
        self.configs.borrow_mut().push(config.clone());
        if self.fail.get() {
            return Err(PlaybackError::Construction("mock failure".to_string()));
        }
        let (player, handle) = MockPlayer::new(self.native_hls);
        self.players.borrow_mut().push(handle);
        Ok(Box::new(player))
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.native_hls && mime == crate::constants::HLS_MIME_TYPE
    }
}

// === Decoder ===

pub struct MockDecodeSession {
    id: usize,
    log: Rc<RefCell<Vec<String>>>,
    fail_stop_load: Cell<bool>,
    destroyed: Cell<usize>,
    on_error: RefCell<Option<DecodeErrorCallback>>,
}

impl MockDecodeSession {
    fn record(&self, call: &str) {
        self.log.borrow_mut().push(format!("{}#{}", call, self.id));
    }

    pub fn fail_stop_load(&self) {
        self.fail_stop_load.set(true);
    }

    pub fn destroy_count(&self) -> usize {
        self.destroyed.get()
    }

    pub fn emit_error(&self, error: DecodeError) {
        if let Some(callback) = self.on_error.borrow().as_ref() {
            callback(error);
        }
    }
}

impl DecodeSession for MockDecodeSession {
    fn load_source(&self, url: &str) -> Result<(), StreamError> {
        self.log
            .borrow_mut()
            .push(format!("load#{} {}", self.id, url));
        Ok(())
    }

    fn attach_media(&self, _element: &mut dyn MediaElement) -> Result<(), StreamError> {
        self.record("attach");
        Ok(())
    }

    fn detach_media(&self) -> Result<(), StreamError> {
        self.record("detach");
        Ok(())
    }

    fn stop_load(&self) -> Result<(), StreamError> {
        self.record("stop");
        if self.fail_stop_load.get() {
            return Err(StreamError::Session("stop failed".to_string()));
        }
        Ok(())
    }

    fn start_load(&self) {
        self.record("start_load");
    }

    fn recover_media_error(&self) {
        self.record("recover");
    }

    fn on_error(&self, callback: DecodeErrorCallback) {
        *self.on_error.borrow_mut() = Some(callback);
    }

    fn destroy(&self) {
        self.record("destroy");
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

#[derive(Clone)]
pub struct MockHlsBackend {
    supported: bool,
    sessions: Rc<RefCell<Vec<Rc<MockDecodeSession>>>>,
    log: Rc<RefCell<Vec<String>>>,
}

impl MockHlsBackend {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            sessions: Rc::default(),
            log: Rc::default(),
        }
    }

    pub fn created(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn session(&self, index: usize) -> Rc<MockDecodeSession> {
        self.sessions.borrow()[index].clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl HlsBackend for MockHlsBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create_session(&self, _config: &DecodeConfig) -> Result<Rc<dyn DecodeSession>, StreamError> {
        let session = Rc::new(MockDecodeSession {
            id: self.sessions.borrow().len() + 1,
            log: self.log.clone(),
            fail_stop_load: Cell::new(false),
            destroyed: Cell::new(0),
            on_error: RefCell::new(None),
        });
        session.record("create");
        self.sessions.borrow_mut().push(session.clone());
        Ok(session as Rc<dyn DecodeSession>)
    }
}

// === Page chrome ===

#[derive(Debug, Default)]
pub struct OverlayRecord {
    pub installed: usize,
    pub removed: bool,
    pub skip_visible: bool,
    pub next_visible: bool,
    pub bottom_offset: Option<u32>,
}

#[derive(Clone, Default)]
pub struct MockOverlay {
    record: Rc<RefCell<OverlayRecord>>,
}

impl MockOverlay {
    pub fn record(&self) -> std::cell::Ref<'_, OverlayRecord> {
        self.record.borrow()
    }
}

impl OverlaySink for MockOverlay {
    fn install(&mut self) {
        self.record.borrow_mut().installed += 1;
    }

    fn set_skip_visible(&mut self, visible: bool) {
        self.record.borrow_mut().skip_visible = visible;
    }

    fn set_next_visible(&mut self, visible: bool) {
        self.record.borrow_mut().next_visible = visible;
    }

    fn set_bottom_offset(&mut self, pixels: u32) {
        self.record.borrow_mut().bottom_offset = Some(pixels);
    }

    fn remove(&mut self) {
        self.record.borrow_mut().removed = true;
    }
}

#[derive(Clone, Default)]
pub struct MockNavigator {
    opened: Rc<RefCell<Vec<(SeriesAlias, u32, u32)>>>,
}

impl MockNavigator {
    pub fn opened(&self) -> Vec<(SeriesAlias, u32, u32)> {
        self.opened.borrow().clone()
    }
}

impl EpisodeNavigator for MockNavigator {
    fn open_episode(&mut self, alias: &SeriesAlias, season: u32, episode_number: u32) {
        self.opened
            .borrow_mut()
            .push((alias.clone(), season, episode_number));
    }
}

#[derive(Clone)]
pub struct MockOrientation {
    supported: bool,
    fail: bool,
    locked: Rc<Cell<bool>>,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl MockOrientation {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            fail: false,
            locked: Rc::default(),
            calls: Rc::default(),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl ScreenOrientation for MockOrientation {
    fn supports_lock(&self) -> bool {
        self.supported
    }

    fn lock_landscape(&mut self) -> Result<(), String> {
        if self.fail {
            return Err("orientation lock rejected".to_string());
        }
        self.calls.borrow_mut().push("lock");
        self.locked.set(true);
        Ok(())
    }

    fn unlock(&mut self) {
        self.calls.borrow_mut().push("unlock");
        self.locked.set(false);
    }
}

// === Watch state ===

#[derive(Debug, Clone, PartialEq)]
pub enum WatchCall {
    Watching(EpisodeId),
    Watched(EpisodeId, bool),
}

#[derive(Clone, Default)]
pub struct MockWatchApi {
    fail: bool,
    calls: Arc<Mutex<Vec<WatchCall>>>,
}

impl MockWatchApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<WatchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn result(&self) -> Result<(), ApiError> {
        if self.fail {
            Err(ApiError::ServerError {
                status: 500,
                message: "mock failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WatchStateApi for MockWatchApi {
    async fn mark_watching(&self, episode_id: &EpisodeId) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(WatchCall::Watching(episode_id.clone()));
        self.result()
    }

    async fn mark_watched(
        &self,
        episode_id: &EpisodeId,
        watched_until_end: bool,
    ) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(WatchCall::Watched(episode_id.clone(), watched_until_end));
        self.result()
    }
}

// === Controller harness ===

/// All mocks a controller needs, kept around for inspection.
pub struct Harness {
    pub factory: MockPlayerFactory,
    pub hls: MockHlsBackend,
    pub overlay: MockOverlay,
    pub navigator: MockNavigator,
    pub orientation: MockOrientation,
    pub watch_api: MockWatchApi,
}

impl Harness {
    /// No native manifest support, library decoding available.
    pub fn new() -> Self {
        Self::with_support(false, true)
    }

    pub fn with_support(native_hls: bool, library_hls: bool) -> Self {
        Self {
            factory: MockPlayerFactory::new(native_hls),
            hls: MockHlsBackend::new(library_hls),
            overlay: MockOverlay::default(),
            navigator: MockNavigator::default(),
            orientation: MockOrientation::new(true),
            watch_api: MockWatchApi::new(),
        }
    }

    pub fn controller(&self, options: ControllerOptions) -> PlaybackController {
        self.controller_with(options, SettingsStore::in_memory(), ProgressStore::in_memory())
    }

    pub fn controller_with(
        &self,
        options: ControllerOptions,
        settings: SettingsStore,
        progress: ProgressStore,
    ) -> PlaybackController {
        let watch_api: Arc<dyn WatchStateApi> = Arc::new(self.watch_api.clone());
        PlaybackController::new(
            Collaborators {
                factory: Box::new(self.factory.clone()),
                hls: Box::new(self.hls.clone()),
                overlay: Box::new(self.overlay.clone()),
                navigator: Box::new(self.navigator.clone()),
                orientation: Some(Box::new(self.orientation.clone())),
                watch_api: Some(watch_api),
            },
            settings,
            progress,
            options,
        )
    }

    pub fn player(&self) -> PlayerHandle {
        self.factory.player()
    }
}

pub fn signed_in() -> ControllerOptions {
    ControllerOptions {
        authenticated: true,
        ..Default::default()
    }
}
