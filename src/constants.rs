// Playback tunables. Config defaults point here so the values live in one place.

use std::time::Duration;

// === Timeline processing ===
/// Minimum spacing between two processed time updates
pub const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(2500);
/// Playback position after which the episode counts as "being watched"
pub const WATCHING_THRESHOLD_SECONDS: f64 = 30.0;
/// Without an ending marker, the last this-many seconds count as the ending
pub const NEAR_END_MARGIN_SECONDS: f64 = 10.0;

// === Overlay ===
pub const OVERLAY_BOTTOM_OFFSET_PX: u32 = 64;
pub const OVERLAY_BOTTOM_OFFSET_FULLSCREEN_PX: u32 = 82;

// === Segmented streaming ===
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";
pub const HLS_EXTENSION: &str = ".m3u8";
pub const BACK_BUFFER_SECONDS: u32 = 90;

// === Client-side storage ===
pub const PROGRESS_CAPACITY: usize = 20;
pub const STORAGE_EXPIRY_DAYS: i64 = 30;
