//! Error types for songforge
//!
//! This module provides the shared error taxonomy used by the submission
//! client and the status resolver, including:
//! - Domain-specific error types (Provider, Database, Config)
//! - The provider/network outcome classification used for user-facing
//!   diagnostics (whitelist, relay misconfiguration, timeouts)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for songforge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for songforge
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "provider.api_key")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Provider or network failure on the submission path, classified into a
    /// user-facing diagnostic
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Unclassified network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),
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

/// Classified provider/network failure
///
/// Both the submission client and the API layer share this taxonomy so every
/// failure on the submission path is returned synchronously with a
/// distinguishing status code and an actionable message. Each submission
/// attempt is terminal; nothing here triggers an automatic retry.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Host unreachable (connection refused, DNS failure)
    #[error("connection failed: {0}")]
    Connection(String),

    /// No response within the bounded request timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Credential/identity not whitelisted for the outbound IP
    ///
    /// `detected_ip` is the best-effort outbound IP probe result, degraded to
    /// a placeholder when the probe itself fails.
    #[error("whitelist error: {message} (detected outbound IP: {detected_ip})")]
    Whitelist {
        /// Diagnostic with a relay/direct-specific remediation hint
        message: String,
        /// Outbound IP as observed by the probe endpoint
        detected_ip: String,
    },

    /// Provider rejected the request with a permission-denied code
    #[error("permission denied by provider: {0}")]
    PermissionDenied(String),

    /// Provider-level logic error, message surfaced verbatim
    #[error("provider error: {0}")]
    Logic(String),

    /// Gateway error from the relay intermediary, attributable to its
    /// configuration rather than to the provider
    #[error("relay misconfiguration ({status}): check the gateway configuration of {host}")]
    RelayGateway {
        /// The gateway's own HTTP status (502/503/504)
        status: u16,
        /// The configured relay host
        host: String,
    },

    /// Any other non-200 HTTP response from the provider
    #[error("provider HTTP error: {status}")]
    Http {
        /// The HTTP status returned by the provider
        status: u16,
    },
}

/// API error response format
///
/// Returned by API endpoints when an error occurs: a machine-readable code, a
/// human-readable message, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "whitelist_error",
///     "message": "whitelist error: ...",
///     "details": {
///       "detected_ip": "203.0.113.7"
///     }
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
    /// Machine-readable error code (e.g., "config_error", "timeout")
    pub code: String,

    /// Human-readable error message, suitable for displaying to end users
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

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "validation error"
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
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
            // 502 Bad Gateway - the provider/relay host is unreachable
            Error::Provider(ProviderError::Connection(_)) => 502,

            // 504 Gateway Timeout - the provider did not answer in time
            Error::Provider(ProviderError::Timeout(_)) => 504,

            // Relay gateway errors echo the gateway's own status
            Error::Provider(ProviderError::RelayGateway { status, .. }) => *status,

            // 500 - provider logic/permission/whitelist failures and
            // configuration errors are all surfaced as server errors
            Error::Provider(_) => 500,
            Error::Config { .. } => 500,

            // 500 Internal Server Error - everything else is server-side
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServer(_) => 500,

            // 502 for unclassified network failures
            Error::Network(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Provider(e) => match e {
                ProviderError::Connection(_) => "connection_failed",
                ProviderError::Timeout(_) => "timeout",
                ProviderError::Whitelist { .. } => "whitelist_error",
                ProviderError::PermissionDenied(_) => "permission_denied",
                ProviderError::Logic(_) => "provider_error",
                ProviderError::RelayGateway { .. } => "relay_misconfigured",
                ProviderError::Http { .. } => "http_error",
            },
            Error::Network(_) => "network_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServer(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Provider(ProviderError::Whitelist { detected_ip, .. }) => {
                Some(serde_json::json!({
                    "detected_ip": detected_ip,
                }))
            }
            Error::Provider(ProviderError::RelayGateway { status, host }) => {
                Some(serde_json::json!({
                    "status": status,
                    "host": host,
                }))
            }
            Error::Provider(ProviderError::Http { status }) => Some(serde_json::json!({
                "status": status,
            })),
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
