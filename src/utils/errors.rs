use thiserror::Error;

use crate::player::types::MediaErrorKind;

/// Failures that decide whether video can play at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Video URL is empty")]
    EmptyUrl,

    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("Segmented streams are not supported on this platform")]
    UnsupportedFormat,

    #[error("Failed to initialize player: {0}")]
    Construction(String),

    #[error("Media error: {0}")]
    Media(MediaErrorKind),

    #[error("Failed to load source: {0}")]
    Source(String),
}

/// Failures inside the segmented-stream adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    #[error("Segmented stream format is not supported")]
    UnsupportedFormat,

    #[error("Decode session error: {0}")]
    Session(String),
}

impl From<StreamError> for PlaybackError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::UnsupportedFormat => PlaybackError::UnsupportedFormat,
            StreamError::Session(msg) => PlaybackError::Source(msg),
        }
    }
}

/// Failures of the client-side persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt storage record: {0}")]
    Corrupt(String),
}
