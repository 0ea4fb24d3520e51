//! Error types for taskfeed
//!
//! This module provides error handling for the library, including:
//! - Domain error types (invalid arguments, server-side failures by sub-kind)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for taskfeed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Sub-kind label carried by [`Error::Server`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServerErrorKind {
    /// The catalog returned data that violates the scan contract
    DataSourceError,
    /// The task manager is miswired (e.g. consumed before it was started)
    TaskManagerError,
    /// The key-value store failed
    StoreError,
}

impl ServerErrorKind {
    /// Machine-readable code for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerErrorKind::DataSourceError => "data_source_error",
            ServerErrorKind::TaskManagerError => "task_manager_error",
            ServerErrorKind::StoreError => "store_error",
        }
    }
}

impl fmt::Display for ServerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServerErrorKind::DataSourceError => "DataSourceError",
            ServerErrorKind::TaskManagerError => "TaskManagerError",
            ServerErrorKind::StoreError => "StoreError",
        };
        f.write_str(label)
    }
}

/// Main error type for taskfeed
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a missing or empty required parameter
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable description of the problem
        message: String,
        /// Name of the offending parameter
        field: Option<String>,
    },

    /// Integrity violation or collaborator failure
    #[error("{kind}: {message}")]
    Server {
        /// Which subsystem failed
        kind: ServerErrorKind,
        /// Human-readable error message
        message: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "scan_size")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidArgument`] naming the offending field
    pub fn invalid_argument(field: &str, message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    /// Shorthand for an [`Error::Server`] of the given kind
    pub fn server(kind: ServerErrorKind, message: impl Into<String>) -> Self {
        Error::Server {
            kind,
            message: message.into(),
        }
    }

    /// The server sub-kind, if this is a server error
    pub fn server_kind(&self) -> Option<ServerErrorKind> {
        match self {
            Error::Server { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "invalid_argument",
///     "message": "invalid argument: agent is required",
///     "details": { "field": "agent" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_argument", "store_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::InvalidArgument { .. } => 400,
            Error::Config { .. } => 400,

            // 500 Internal Server Error - Server-side issues
            Error::Server { .. } => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Serialization(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::InvalidArgument { .. } => "invalid_argument",
            Error::Server { kind, .. } => kind.as_str(),
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::InvalidArgument {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Server { kind, .. } => Some(serde_json::json!({ "kind": kind.to_string() })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
