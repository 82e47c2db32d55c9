//! Error classification for resource API calls.
//!
//! Conflicts are kept apart from every other failure: callers resolve them by
//! refetching, while everything else is reported and left to the user.

use thiserror::Error;

/// Errors that can occur during resource API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No endpoint configured
    #[error("Resource client is not configured")]
    NotConfigured,

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Version token no longer matches (409/412), or the name is already taken
    #[error("Conflict on {resource}")]
    Conflict { resource: String },

    /// Non-success status other than a conflict
    #[error("{resource} failed: {status} - {body}")]
    Status {
        resource: String,
        status: u16,
        body: String,
    },

    /// Failed to reach the server
    #[error("Connection failed for {resource}: {source}")]
    Connection {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body could not be decoded
    #[error("Invalid response from {resource}: {message}")]
    InvalidResponse { resource: String, message: String },
}

impl ApiError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    /// HTTP status for failures that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Conflict { .. } => Some(409),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable classification for logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotConfigured => "not_configured",
            ApiError::Build(_) => "build_error",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Status { .. } => "status_error",
            ApiError::Connection { .. } => "connection_error",
            ApiError::InvalidResponse { .. } => "invalid_response",
        }
    }
}
