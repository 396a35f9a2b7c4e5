pub mod controller;
pub mod headless;
pub mod listeners;
pub mod orientation;
pub mod progress_tracker;
pub mod quality;
pub mod skip_markers;
pub mod stream_adapter;
pub mod traits;
pub mod types;

pub use controller::{Collaborators, ControllerOptions, PlaybackController};
pub use headless::{
    HeadlessFactory, HeadlessHandle, HeadlessHlsBackend, LogOverlay, RecordingNavigator,
};
pub use skip_markers::SkipAdvanceState;
pub use traits::{
    DecodeSession, EpisodeNavigator, HlsBackend, MediaElement, MediaPlayer, OverlaySink,
    PlayerFactory, ScreenOrientation,
};
pub use types::{EventKind, MediaFault, PlayerEvent, SessionPhase};
