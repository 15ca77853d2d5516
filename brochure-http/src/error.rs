use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::redact::snip_body;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for API errors, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a failed attempt is worth repeating.
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// Best human-readable message from an error body.
///
/// Understands `{"error":{"message":..}}` and flat `message`/`detail`/`error`
/// fields; anything else falls back to a body snippet.
pub(crate) fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ErrorBody {
        Nested { error: Detail },
        Flat {
            #[serde(default)]
            message: String,
            #[serde(default)]
            detail: String,
            #[serde(default)]
            error: String,
        },
    }
    #[derive(Deserialize)]
    struct Detail {
        message: String,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody::Nested { error }) => error.message,
        Ok(ErrorBody::Flat {
            message,
            detail,
            error,
        }) => [message, detail, error]
            .into_iter()
            .find(|m| !m.is_empty())
            .unwrap_or_else(|| snip_body(body)),
        Err(_) => snip_body(body),
    }
}
