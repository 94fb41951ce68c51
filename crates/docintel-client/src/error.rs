//! Error types for backend requests.

use docintel_core::error::DocIntelError;
use serde::Deserialize;

/// Errors from a backend round trip.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Backend { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Build a backend error from a non-2xx status and its raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        ClientError::Backend {
            status,
            detail: parse_detail(body),
        }
    }

    /// The message shown to the user for this failure.
    ///
    /// Backend failures use the payload's `detail` when present, otherwise
    /// `fallback`. Undecodable success bodies also use `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Backend {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ClientError::Backend { detail: None, .. } | ClientError::Decode(_) => {
                fallback.to_string()
            }
            ClientError::Transport(message) => message.clone(),
            ClientError::Io(err) => err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if err.is_timeout() {
            ClientError::Transport(format!("request timed out: {}", err))
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<ClientError> for DocIntelError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Io(io) => DocIntelError::Io(io),
            other => DocIntelError::Backend(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Best-effort extraction of a string `detail` from an error payload.
///
/// Returns `None` for malformed JSON, a missing or null `detail`, a
/// non-string `detail` (e.g. a validation error list), or an empty string.
pub fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
