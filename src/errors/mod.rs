//! Unified error handling with consistent API response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error detail in the API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Consistent JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            error: None,
        })
    }

    /// Wrap an error in the envelope.
    pub fn error(code: &str, message: &str) -> Json<Self> {
        Json(Self {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        })
    }
}

/// Load-time taxonomy configuration errors. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Duplicate device type id: {0}")]
    DuplicateTypeId(String),

    #[error("Invalid pattern {pattern:?} in device type {type_id}: {source}")]
    InvalidPattern {
        type_id: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Base confidence {value} of device type {type_id} is outside (0, 1]")]
    InvalidConfidence { type_id: String, value: f32 },

    #[error("Invalid taxonomy document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Resolution cache persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache persistence task failed: {0}")]
    Task(String),
}

/// Failure of a single lookup source. Never surfaced to resolver callers.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Caller errors from the identifier resolver.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Identifier {0:?} is not a dotted sequence of decimal integers")]
    Malformed(String),
}

/// Configuration errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be set when CACHE_BACKEND=redis")]
    Missing(&'static str),
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        };

        (status, ApiResponse::<()>::error(code, &message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success() {
        let response = ApiResponse::success("hello");
        let json = serde_json::to_value(&response.0).unwrap();
        assert_eq!(json["data"], "hello");
        assert!(json["error"].is_null());
    }

    #[test]
    fn api_response_error() {
        let response = ApiResponse::<()>::error("NOT_FOUND", "Vendor not found");
        let json = serde_json::to_value(&response.0).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "Vendor not found");
    }

    #[test]
    fn resolve_error_maps_to_validation() {
        let err: AppError = ResolveError::Malformed("1.a.3".to_string()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn resolve_error_display() {
        let err = ResolveError::Malformed("abc".to_string());
        assert_eq!(
            err.to_string(),
            "Identifier \"abc\" is not a dotted sequence of decimal integers"
        );
    }

    #[test]
    fn app_error_status_codes() {
        let resp = AppError::Validation("bad".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = AppError::NotFound("vendor".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
