//! Error type system for Shelfdrop
//!
//! This module provides the error taxonomy shared by every component:
//! - Caller-facing validation and authentication failures
//! - Upstream failures tagged with the external call that produced them
//! - HTTP status code mapping
//! - JSON error bodies with trace IDs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum number of characters of a raw upstream body kept in an error.
pub const EXCERPT_LIMIT: usize = 500;

/// External call that produced an upstream error.
///
/// For the dispatch flow this doubles as the step identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    IndexSearch,
    IndexDownload,
    DownloadClientLogin,
    DownloadClientAdd,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::IndexSearch => "index search",
            Upstream::IndexDownload => "index download",
            Upstream::DownloadClientLogin => "download client login",
            Upstream::DownloadClientAdd => "download client add",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // System-level errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    // Caller-facing errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request timed out after {0:?}")]
    RequestTimeout(std::time::Duration),

    // Upstream errors
    #[error("{upstream} rejected credentials{}", fmt_status(.status))]
    UpstreamAuth {
        upstream: Upstream,
        status: Option<u16>,
        body: String,
    },

    #[error("{upstream} unavailable{}: {message}", fmt_status(.status))]
    UpstreamUnavailable {
        upstream: Upstream,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to parse {upstream} response")]
    Parse { upstream: Upstream, excerpt: String },

    // I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl GatewayError {
    /// Build an upstream-unavailable error from a transport failure
    pub fn transport(upstream: Upstream, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        GatewayError::UpstreamUnavailable {
            upstream,
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    /// Build a parse error carrying a bounded excerpt of the raw body
    pub fn parse(upstream: Upstream, raw: &str) -> Self {
        GatewayError::Parse {
            upstream,
            excerpt: excerpt(raw),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            GatewayError::InvalidRequest(_) | GatewayError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }

            // 401 Unauthorized
            GatewayError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            GatewayError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            // 408 Request Timeout
            GatewayError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,

            // 502 Bad Gateway
            GatewayError::UpstreamAuth { .. }
            | GatewayError::UpstreamUnavailable { .. }
            | GatewayError::Parse { .. } => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            GatewayError::InitializationError(_)
            | GatewayError::ConfigError(_)
            | GatewayError::DatabaseError(_)
            | GatewayError::IoError(_)
            | GatewayError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::InitializationError(_) => "InitializationError",
            GatewayError::ConfigError(_) => "ConfigError",
            GatewayError::DatabaseError(_) => "DatabaseError",
            GatewayError::InvalidRequest(_) => "InvalidRequest",
            GatewayError::ValidationError(_) => "ValidationError",
            GatewayError::AuthenticationError(_) => "AuthenticationError",
            GatewayError::PermissionDenied(_) => "PermissionDenied",
            GatewayError::RequestTimeout(_) => "RequestTimeout",
            GatewayError::UpstreamAuth { .. } => "UpstreamAuthError",
            GatewayError::UpstreamUnavailable { .. } => "UpstreamUnavailableError",
            GatewayError::Parse { .. } => "ParseError",
            GatewayError::IoError(_) => "IoError",
            GatewayError::TaskError(_) => "TaskError",
        }
    }

    /// Structured details attached to the JSON error body
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            GatewayError::UpstreamAuth {
                upstream,
                status,
                body,
            } => Some(serde_json::json!({
                "step": upstream,
                "status": status,
                "body": excerpt(body),
            })),
            GatewayError::UpstreamUnavailable {
                upstream, status, ..
            } => Some(serde_json::json!({
                "step": upstream,
                "status": status,
            })),
            GatewayError::Parse { upstream, excerpt } => Some(serde_json::json!({
                "step": upstream,
                "text": excerpt,
            })),
            _ => None,
        }
    }
}

/// Truncate a raw body to at most [`EXCERPT_LIMIT`] characters
pub fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_LIMIT).collect()
}

tokio::task_local! {
    /// Trace ID of the request being served on this task
    pub static REQUEST_TRACE_ID: String;
}

pub fn current_trace_id() -> Option<String> {
    REQUEST_TRACE_ID.try_with(|id| id.clone()).ok()
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response tagged with the current request's trace ID,
    /// or a fresh one outside a request
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            details: None,
            trace_id: current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Create an error response from a GatewayError
    pub fn from_error(error: &GatewayError) -> Self {
        let mut response = Self::new(error.error_type().to_string(), error.to_string());
        response.details = error.details();
        response
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (trace_id: {})",
            self.error, self.message, self.trace_id
        )
    }
}

/// Implement IntoResponse for GatewayError to enable automatic error handling in Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Context extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| GatewayError::InitializationError(format!("{}: {}", context.into(), e)))
    }
}
