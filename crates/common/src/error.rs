//! Common error types for TexDit
//!
//! This module defines all error types used across the TexDit system.
//! All errors are convertible to HTTP status codes so handlers can return them directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for TexDit
#[derive(Error, Debug)]
pub enum TexditError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation failures; the message is shown to clients as-is
    #[error("{0}")]
    InvalidInput(String),

    /// Model loading or selection errors
    #[error("{0}")]
    Model(String),

    /// Inference backend returned an error
    #[error("{0}")]
    Backend(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Backend or server unavailable
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Operation not offered by this architecture
    #[error("{0}")]
    NotFound(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for TexditError {
    fn from(err: config::ConfigError) -> Self {
        TexditError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for TexditError {
    fn from(err: serde_yaml::Error) -> Self {
        TexditError::Config(err.to_string())
    }
}

impl TexditError {
    /// Convert error to an HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            TexditError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TexditError::NotFound(_) => StatusCode::NOT_FOUND,
            TexditError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TexditError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TexditError::Http(err) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        TexditError::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TexditError::InvalidInput(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        TexditError::Model(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        TexditError::Backend(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        TexditError::Timeout(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        TexditError::Unavailable(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        TexditError::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        TexditError::Internal(msg.into())
    }
}

impl IntoResponse for TexditError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type alias for TexDit operations
pub type Result<T> = std::result::Result<T, TexditError>;
