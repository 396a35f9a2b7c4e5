//! User-facing playback messages.

use serde::{Deserialize, Serialize};

use super::errors::PlaybackError;
use crate::player::types::MediaErrorKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

/// Message for the blocking error overlay.
pub fn playback_error_message(language: Language, error: &PlaybackError) -> String {
    match (language, error) {
        (Language::Ru, PlaybackError::EmptyUrl) => "URL видео не указан".to_string(),
        (Language::En, PlaybackError::EmptyUrl) => "Video URL is missing".to_string(),
        (Language::Ru, PlaybackError::InvalidUrl(_)) => "Некорректный URL видео".to_string(),
        (Language::En, PlaybackError::InvalidUrl(_)) => "Invalid video URL".to_string(),
        (Language::Ru, PlaybackError::UnsupportedFormat) => {
            "HLS формат не поддерживается на этом устройстве".to_string()
        }
        (Language::En, PlaybackError::UnsupportedFormat) => {
            "HLS streams are not supported on this device".to_string()
        }
        (Language::Ru, PlaybackError::Construction(_)) => {
            "Ошибка инициализации плеера".to_string()
        }
        (Language::En, PlaybackError::Construction(_)) => {
            "Failed to initialize the player".to_string()
        }
        (_, PlaybackError::Media(kind)) => media_error_message(language, kind),
        (Language::Ru, PlaybackError::Source(_)) => "Ошибка загрузки видео".to_string(),
        (Language::En, PlaybackError::Source(_)) => "Failed to load the video".to_string(),
    }
}

pub fn media_error_message(language: Language, kind: &MediaErrorKind) -> String {
    match (language, kind) {
        (Language::Ru, MediaErrorKind::Aborted) => "Видео было прервано".to_string(),
        (Language::En, MediaErrorKind::Aborted) => "Video playback was aborted".to_string(),
        (Language::Ru, MediaErrorKind::Network) => {
            "Ошибка сети при загрузке видео. Возможно, сервер недоступен".to_string()
        }
        (Language::En, MediaErrorKind::Network) => {
            "Network error while loading the video. The server may be unreachable".to_string()
        }
        (Language::Ru, MediaErrorKind::Decode) => "Ошибка декодирования видео".to_string(),
        (Language::En, MediaErrorKind::Decode) => "Failed to decode the video".to_string(),
        (Language::Ru, MediaErrorKind::SourceNotSupported) => {
            "Формат видео не поддерживается".to_string()
        }
        (Language::En, MediaErrorKind::SourceNotSupported) => {
            "Video format is not supported".to_string()
        }
        (Language::Ru, MediaErrorKind::Unknown(detail)) => format!(
            "Ошибка видео: {}",
            detail.as_deref().unwrap_or("Неизвестная ошибка")
        ),
        (Language::En, MediaErrorKind::Unknown(detail)) => format!(
            "Video error: {}",
            detail.as_deref().unwrap_or("Unknown error")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_errors_are_localized() {
        assert_eq!(
            media_error_message(Language::Ru, &MediaErrorKind::Decode),
            "Ошибка декодирования видео"
        );
        assert_eq!(
            playback_error_message(Language::En, &PlaybackError::Media(MediaErrorKind::Aborted)),
            "Video playback was aborted"
        );
    }

    #[test]
    fn test_unknown_error_carries_detail() {
        let message = media_error_message(
            Language::En,
            &MediaErrorKind::Unknown(Some("PIPELINE_ERROR_READ".to_string())),
        );
        assert_eq!(message, "Video error: PIPELINE_ERROR_READ");
    }
}
