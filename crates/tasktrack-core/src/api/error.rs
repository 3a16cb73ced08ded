use std::path::PathBuf;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{method} {url} failed with status {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: Value,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Session storage error: {0}")]
    Session(#[source] anyhow::Error),

    #[error("Failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

static NO_BODY: Value = Value::Null;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Parse an error body as JSON, keeping non-JSON text as a JSON string.
    pub(crate) fn parse_body(text: &str) -> Value {
        if text.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Response body of a failed request, `Null` for transport failures.
    pub fn body(&self) -> &Value {
        match self {
            ApiError::Status { body, .. } => body,
            _ => &NO_BODY,
        }
    }

    /// The most useful human-readable message: the server's `message` or
    /// `error` field, the raw body, or this error's own description.
    pub fn server_message(&self) -> String {
        let body = self.body();
        for key in ["message", "error"] {
            if let Some(text) = body.get(key).and_then(Value::as_str) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
        match body {
            Value::Null => self.to_string(),
            Value::String(text) => Self::truncate_body(text),
            other => Self::truncate_body(&other.to_string()),
        }
    }
}
