//! # Error Handling Module
//!
//! Crate-wide error types built on `thiserror`. Module-local errors
//! (`CacheError`, `SchedulerError`) convert into [`ChatError`] at the module
//! boundary so callers above the composition root deal with one taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the gateway.
pub type ChatResult<T> = Result<T, ChatError>;

/// Error categories for the chat gateway core.
///
/// `Validation` is surfaced to the immediate caller and never retried.
/// `Storage` aborts the operation that needed the store. `Configuration` is
/// caught at the point of use and replaced with a documented default; it is
/// never fatal.
#[derive(Debug, Error, Clone)]
pub enum ChatError {
    /// Malformed input to a public operation (bad key, past scheduled time).
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// The external persistent store failed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Malformed runtime configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O errors (snapshot files, sockets).
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {message}")]
    Json { message: String },

    /// YAML parsing errors for configuration files.
    #[error("YAML error: {message}")]
    Yaml { message: String },

    /// Unexpected internal failures.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ChatError {
    /// Create a validation error for a named field.
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a storage error with a custom message.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error with a custom message.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code for this error, used by the admin surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Storage { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Json { .. } => StatusCode::BAD_REQUEST,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// String identifier of the error category for API responses.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Storage { .. } => "storage_error",
            Self::Configuration { .. } => "configuration_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Yaml { .. } => "yaml_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ChatError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });

        (status, Json(error_response)).into_response()
    }
}
