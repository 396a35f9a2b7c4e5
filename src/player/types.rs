/// Common types shared by the controller and player backends
use std::fmt;

use crate::utils::PlaybackError;

/// Lifecycle phase of a playback session.
///
/// Playing and paused are owned by the player itself and are not tracked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No playable URL yet
    Idle,
    /// Player constructed, waiting for its ready signal
    Initializing,
    Ready,
    /// Playback cannot continue until the user retries
    Error,
    /// Torn down; terminal
    Destroyed,
}

/// Player events the controller subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Ready,
    Play,
    TimeUpdate,
    Ended,
    Error,
    Fullscreen,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Ready,
        EventKind::Play,
        EventKind::TimeUpdate,
        EventKind::Ended,
        EventKind::Error,
        EventKind::Fullscreen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "ready",
            EventKind::Play => "video:play",
            EventKind::TimeUpdate => "video:timeupdate",
            EventKind::Ended => "video:ended",
            EventKind::Error => "error",
            EventKind::Fullscreen => "fullscreen",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Ready,
    Play,
    TimeUpdate { current_time: f64 },
    Ended,
    Error(MediaFault),
    Fullscreen(bool),
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::Ready => EventKind::Ready,
            PlayerEvent::Play => EventKind::Play,
            PlayerEvent::TimeUpdate { .. } => EventKind::TimeUpdate,
            PlayerEvent::Ended => EventKind::Ended,
            PlayerEvent::Error(_) => EventKind::Error,
            PlayerEvent::Fullscreen(_) => EventKind::Fullscreen,
        }
    }
}

/// Raw error reported by the media element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaFault {
    /// Media error code (1 aborted, 2 network, 3 decode, 4 source not supported)
    pub code: Option<u16>,
    pub message: Option<String>,
}

impl MediaFault {
    pub fn with_code(code: u16) -> Self {
        Self {
            code: Some(code),
            message: None,
        }
    }

    pub fn classify(&self) -> PlaybackError {
        match self.code {
            Some(code) => {
                PlaybackError::Media(MediaErrorKind::from_code(code, self.message.clone()))
            }
            None => PlaybackError::Source(
                self.message
                    .clone()
                    .unwrap_or_else(|| "media element reported no error details".to_string()),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaErrorKind {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
    Unknown(Option<String>),
}

impl MediaErrorKind {
    pub const ABORTED: u16 = 1;
    pub const NETWORK: u16 = 2;
    pub const DECODE: u16 = 3;
    pub const SRC_NOT_SUPPORTED: u16 = 4;

    pub fn from_code(code: u16, message: Option<String>) -> Self {
        match code {
            Self::ABORTED => MediaErrorKind::Aborted,
            Self::NETWORK => MediaErrorKind::Network,
            Self::DECODE => MediaErrorKind::Decode,
            Self::SRC_NOT_SUPPORTED => MediaErrorKind::SourceNotSupported,
            _ => MediaErrorKind::Unknown(message.filter(|m| !m.is_empty())),
        }
    }
}

impl fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaErrorKind::Aborted => f.write_str("aborted"),
            MediaErrorKind::Network => f.write_str("network"),
            MediaErrorKind::Decode => f.write_str("decode"),
            MediaErrorKind::SourceNotSupported => f.write_str("source not supported"),
            MediaErrorKind::Unknown(Some(detail)) => write!(f, "unknown ({})", detail),
            MediaErrorKind::Unknown(None) => f.write_str("unknown"),
        }
    }
}

/// Category of an error raised by a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    Network,
    Media,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub fatal: bool,
    pub details: String,
}

impl DecodeError {
    pub fn fatal(kind: DecodeErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            details: details.into(),
        }
    }

    pub fn recoverable(kind: DecodeErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            details: details.into(),
        }
    }
}

/// Tuning for library-backed decode sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    pub back_buffer_seconds: u32,
    pub enable_worker: bool,
    pub low_latency: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            back_buffer_seconds: crate::constants::BACK_BUFFER_SECONDS,
            enable_worker: true,
            low_latency: true,
        }
    }
}

/// Construction parameters handed to a player factory.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Set for sources the player loads itself; manifests are attached afterwards
    pub url: Option<String>,
    pub poster: Option<String>,
    pub title: String,
    pub volume: f64,
    pub playback_rate: f64,
    pub autoplay: bool,
}

/// How a source ended up on the media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Not a manifest; the player loads it itself
    Passthrough,
    /// Decoded by a library session
    Library,
    /// Played by the platform's built-in manifest support
    Native,
}
