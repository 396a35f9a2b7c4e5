use std::rc::Rc;

use super::types::{DecodeConfig, DecodeError, EventKind, PlayerConfig, PlayerEvent};
use crate::models::{QualityOption, SeriesAlias};
use crate::utils::{PlaybackError, StreamError};

pub type EventCallback = Box<dyn Fn(PlayerEvent)>;
pub type DecodeErrorCallback = Box<dyn Fn(DecodeError)>;

/// Handle returned by [`MediaPlayer::on`], needed to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Constructs player instances bound to the host's video surface.
pub trait PlayerFactory {
    fn create(&self, config: &PlayerConfig) -> Result<Box<dyn MediaPlayer>, PlaybackError>;

    /// Whether the platform media element can play `mime` without help.
    fn can_play_type(&self, mime: &str) -> bool;
}

/// A rich player with controls, settings menu, fullscreen and events.
pub trait MediaPlayer {
    fn on(&mut self, kind: EventKind, callback: EventCallback) -> ListenerId;
    fn off(&mut self, kind: EventKind, id: ListenerId) -> bool;

    /// Load a source the player can play directly.
    fn switch_url(&mut self, url: &str) -> Result<(), PlaybackError>;
    fn set_poster(&mut self, poster: Option<&str>);
    fn set_title(&mut self, title: &str);
    fn set_quality_menu(&mut self, options: &[QualityOption]);

    fn current_time(&self) -> f64;
    fn seek(&mut self, seconds: f64);
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn media_element(&mut self) -> &mut dyn MediaElement;
    fn destroy(&mut self);
}

/// The underlying video element a decode session attaches to.
pub trait MediaElement {
    fn can_play_type(&self, mime: &str) -> bool;
    fn set_src(&mut self, url: &str);

    /// Session attached to this element, if any.
    fn decode_session(&self) -> Option<Rc<dyn DecodeSession>>;
    fn set_decode_session(&mut self, session: Option<Rc<dyn DecodeSession>>);
}

/// Segmented-stream decoding library.
pub trait HlsBackend {
    fn is_supported(&self) -> bool;
    fn create_session(&self, config: &DecodeConfig) -> Result<Rc<dyn DecodeSession>, StreamError>;
}

/// One library decode session. Methods take `&self`; sessions are shared handles.
pub trait DecodeSession {
    fn load_source(&self, url: &str) -> Result<(), StreamError>;
    fn attach_media(&self, element: &mut dyn MediaElement) -> Result<(), StreamError>;
    fn detach_media(&self) -> Result<(), StreamError>;
    fn stop_load(&self) -> Result<(), StreamError>;
    fn start_load(&self);
    fn recover_media_error(&self);
    fn on_error(&self, callback: DecodeErrorCallback);
    fn destroy(&self);
}

/// The two custom affordances drawn over the player.
pub trait OverlaySink {
    fn install(&mut self);
    fn set_skip_visible(&mut self, visible: bool);
    fn set_next_visible(&mut self, visible: bool);
    fn set_bottom_offset(&mut self, pixels: u32);
    fn remove(&mut self);
}

pub trait EpisodeNavigator {
    fn open_episode(&mut self, alias: &SeriesAlias, season: u32, episode_number: u32);
}

pub trait ScreenOrientation {
    fn supports_lock(&self) -> bool;
    fn lock_landscape(&mut self) -> Result<(), String>;
    fn unlock(&mut self);
}
