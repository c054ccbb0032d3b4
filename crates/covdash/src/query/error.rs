use serde_json::Value;
use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced by the query layer.
///
/// Cloneable so that every consumer sharing a de-duplicated request receives
/// the same failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network unreachable or similar transport failure.
    #[error("Network error: {message}")]
    Transport { message: String },

    /// The response did not have the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The consumer's abort signal fired.
    #[error("Query aborted")]
    Aborted,

    /// A cached value for the key has a different type than requested.
    #[error("Cached value for {key} has an unexpected type")]
    TypeMismatch { key: String },
}

impl QueryError {
    /// Create a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport { message } => QueryError::Transport { message },
            ApiError::Status { status, body } => QueryError::Api {
                status,
                message: ["detail", "message"]
                    .iter()
                    .find_map(|field| body.get(field).and_then(Value::as_str))
                    .map_or_else(|| format!("HTTP {status}"), str::to_string),
            },
            ApiError::GraphQl { message } => QueryError::Api {
                status: 200,
                message,
            },
            ApiError::Json(e) => QueryError::Decode {
                message: e.to_string(),
            },
            ApiError::Aborted => QueryError::Aborted,
            ApiError::Config(message) => QueryError::Transport { message },
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_api_error_conversion() {
        let err: QueryError = ApiError::Status {
            status: 404,
            body: json!({ "detail": "Not found." }),
        }
        .into();
        assert!(matches!(err, QueryError::Api { status: 404, .. }));

        let err: QueryError = ApiError::transport("refused").into();
        assert_eq!(
            err,
            QueryError::Transport {
                message: "refused".to_string()
            }
        );

        let err: QueryError = ApiError::Aborted.into();
        assert_eq!(err, QueryError::Aborted);
    }

    #[test]
    fn test_status_error_shows_detail_not_body() {
        let err: QueryError = ApiError::Status {
            status: 403,
            body: json!({ "code": "x", "detail": "Forbidden" }),
        }
        .into();
        let rendered = err.to_string();
        assert_eq!(rendered, "API error (403): Forbidden");
        assert!(!rendered.contains('{') && !rendered.contains('}'));

        let err: QueryError = ApiError::Status {
            status: 502,
            body: json!({ "errors": [{ "code": "upstream" }] }),
        }
        .into();
        assert_eq!(err.to_string(), "API error (502): HTTP 502");

        let err: QueryError = ApiError::Status {
            status: 500,
            body: Value::String("<html>oops</html>".to_string()),
        }
        .into();
        assert_eq!(err.to_string(), "API error (500): HTTP 500");
    }
}
