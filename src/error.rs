//! # Error Handling
//!
//! Custom error types for the application and their conversion into HTTP
//! responses.
//!
//! ## Error Categories:
//! - **Internal**: Server-side problems (500 errors)
//! - **BadRequest**: Client sent invalid data (400 errors)
//! - **NotFound**: Requested resource doesn't exist (404 errors)
//! - **ConfigError**: Configuration problems, including a missing Gemini API
//!   key (500 errors)
//! - **ValidationError**: Exam/subject/question validation failed (400 errors)
//! - **Upstream**: The Gemini API rejected or failed a request (502 errors)
//!
//! WebSocket connections never surface these as HTTP responses; the interview
//! relay converts failures into `error` messages on the socket instead.

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Internal server errors
    Internal(String),

    /// Client sent invalid or malformed data
    BadRequest(String),

    /// Requested resource was not found
    NotFound(String),

    /// Configuration file, environment variable, or missing-credential problems
    ConfigError(String),

    /// Exam configuration or question data failed validation rules
    ValidationError(String),

    /// The upstream Gemini API failed (transport, auth, or service error)
    Upstream(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
        }
    }
}

/// Converts errors into the JSON error envelope all API clients receive:
///
/// ```json
/// {
///   "error": {
///     "type": "validation_error",
///     "message": "Invalid difficulty: Extreme",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "bad_request",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "not_found",
                msg.clone(),
            ),
            AppError::ConfigError(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
            AppError::ValidationError(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AppError::Upstream(msg) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "upstream_error",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// JSON parsing errors are almost always malformed client data, so they map
/// to 400 rather than 500.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Failures talking to the Gemini REST API surface as upstream errors.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Upstream(format!("Gemini request timed out: {}", err))
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = AppError::ValidationError("bad difficulty".to_string());
        assert_eq!(err.to_string(), "Validation error: bad difficulty");
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = AppError::Upstream("quota exceeded".to_string());
        let response = err.error_response();
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_serde_error_maps_to_bad_request() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: AppError = parse_err.into();
        matches!(err, AppError::BadRequest(_));
    }
}
