use serde_json::Value;
use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the coverage backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Transport { message: String },

    /// The backend answered with a non-2xx status.
    #[error("API error ({status})")]
    Status { status: u16, body: Value },

    /// A GraphQL envelope carried errors and no data.
    #[error("GraphQL error: {message}")]
    GraphQl { message: String },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request's abort signal fired before a response arrived.
    #[error("Request aborted")]
    Aborted,

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Create a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// HTTP status for [`ApiError::Status`] errors.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure happened below HTTP (network unreachable, DNS, TLS).
    #[inline]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<HttpError> for ApiError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Transport(message) => ApiError::Transport { message },
            other => ApiError::Transport {
                message: other.to_string(),
            },
        }
    }
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Transport { .. } => "Network error".to_string(),
        ApiError::Status { status, body } => match body.get("detail").and_then(Value::as_str) {
            Some(detail) if detail.chars().count() > 50 => {
                let truncated: String = detail.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            }
            Some(detail) => format!("HTTP {}: {}", status, detail),
            None => format!("HTTP {}", status),
        },
        ApiError::GraphQl { .. } => "GraphQL error".to_string(),
        ApiError::Json(_) => "JSON parse error".to_string(),
        ApiError::Aborted => "Request aborted".to_string(),
        ApiError::Config(msg) => format!("Config: {}", msg),
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
