//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Validation errors carry the
//! operation name and the offending argument so callers can log them as-is.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or longer than the allowed maximum
    #[error("Invalid key in {op}: '{key}' ({reason})")]
    InvalidKey {
        op: &'static str,
        key: String,
        reason: String,
    },

    /// Value cannot be serialized
    #[error("Invalid value in {op} for key '{key}': {reason}")]
    InvalidValue {
        op: &'static str,
        key: String,
        reason: String,
    },

    /// Non-positive TTL
    #[error("Invalid TTL in {op} for key '{key}': {ttl}")]
    InvalidTtl {
        op: &'static str,
        key: String,
        ttl: u64,
    },

    /// Wildcard pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Import snapshot is structurally malformed
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Snapshot file could not be read or written
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    // == Status Code ==
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::InvalidKey { .. }
            | CacheError::InvalidValue { .. }
            | CacheError::InvalidTtl { .. }
            | CacheError::InvalidPattern { .. }
            | CacheError::InvalidBackup(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Io(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
