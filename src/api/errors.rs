use serde_json::Value;
use thiserror::Error;

use crate::utils::Language;

/// Typed error enum for catalog and watch-state API calls
///
/// Differentiates failure modes so the retry policy can tell transient
/// failures from permanent ones.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401, 403. Never retried
    #[error("Authentication failed: {message} (status: {status})")]
    Authentication { status: u16, message: String },

    /// 429. Retried with backoff
    #[error("Rate limited: {message} (retry after: {retry_after:?}s)")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// 500+. Retried
    #[error("Server error: {message} (status: {status})")]
    ServerError { status: u16, message: String },

    /// Other 4xx. Not retried
    #[error("Client error: {message} (status: {status})")]
    ClientError { status: u16, message: String },

    /// Timeouts, refused connections. Retried
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error: {0}")]
    Other(String),
}

impl ApiError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::ServerError { .. } | ApiError::RateLimit { .. }
        )
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimit { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ClientError { status: 404, .. })
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ApiError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() {
            ApiError::Network(format!("Request error: {}", error))
        } else if error.is_decode() {
            ApiError::ParseError(error.to_string())
        } else {
            ApiError::Other(error.to_string())
        }
    }

    /// Build an error from an HTTP status and the raw response body.
    ///
    /// A `statusCode` field in the body takes precedence over the HTTP status.
    pub fn from_status(status: u16, body: &str, retry_after: Option<u64>) -> Self {
        let payload: Option<Value> = serde_json::from_str(body).ok();
        let status = payload
            .as_ref()
            .and_then(|p| p.get("statusCode"))
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(status);
        let message = payload
            .as_ref()
            .filter(|_| status != 404 && status < 500)
            .and_then(server_message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        match status {
            401 | 403 => ApiError::Authentication { status, message },
            429 => ApiError::RateLimit {
                message,
                retry_after,
            },
            400..=499 => ApiError::ClientError { status, message },
            500..=599 => ApiError::ServerError { status, message },
            _ => ApiError::Other(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Server-provided text is surfaced for client errors other than 404;
    /// everything else gets a generic message.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            ApiError::Authentication { status, message }
            | ApiError::ClientError { status, message }
                if *status != 404 && !message.starts_with("HTTP ") =>
            {
                message.clone()
            }
            ApiError::RateLimit { message, .. } if !message.starts_with("HTTP ") => message.clone(),
            _ => match language {
                Language::Ru => "Что-то пошло не так. Попробуйте позже".to_string(),
                Language::En => "Something went wrong. Please try again later".to_string(),
            },
        }
    }
}

/// `message` as a string, a list of strings joined by newlines, or a nested
/// `{ "message": ... }` object.
fn server_message(payload: &Value) -> Option<String> {
    let message = match payload.get("message")? {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(inner) => inner.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    (!message.is_empty()).then_some(message)
}
