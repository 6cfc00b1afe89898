//! Error responses.
//!
//! # Responsibilities
//! - Render policy denials as structured JSON
//! - Keep bodies categorical: a code and a fixed message, nothing about
//!   which list entry or which window state caused the denial
//!
//! # Body
//! ```text
//! { "error": { "message": "...", "code": "RATE_LIMIT_EXCEEDED", "retryAfter": 12 } }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    CorsError,
    RateLimitExceeded,
    Unauthorized,
    NotFound,
}

impl ErrorCode {
    /// Wire name, as serialized in error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CorsError => "CORS_ERROR",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub message: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// A rejection with its status code.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: ErrorDetail {
                    message: message.into(),
                    code,
                    retry_after: None,
                },
            },
        }
    }

    pub fn origin_not_allowed() -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorCode::CorsError, "Origin not allowed")
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        let mut err = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::RateLimitExceeded,
            "Too many requests. Please try again later.",
        );
        err.body.error.retry_after = Some(retry_after_secs);
        err
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, "Authentication required")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_body() {
        let err = ApiError::rate_limited(42);
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);

        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["error"]["code"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(json["error"]["retryAfter"], 42);
    }

    #[test]
    fn test_cors_body_has_no_retry_after() {
        let err = ApiError::origin_not_allowed();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["error"]["code"], "CORS_ERROR");
        assert_eq!(json["error"]["message"], "Origin not allowed");
        assert!(json["error"].get("retryAfter").is_none());
    }

    #[test]
    fn test_code_names_match_serialized_form() {
        for code in [
            ErrorCode::CorsError,
            ErrorCode::RateLimitExceeded,
            ErrorCode::Unauthorized,
            ErrorCode::NotFound,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
    }
}
