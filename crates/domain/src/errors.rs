//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for FeedSync
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FeedSyncError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for FeedSync operations
pub type Result<T> = std::result::Result<T, FeedSyncError>;

/// Categories of remote API errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedApiErrorCategory {
    /// Authentication errors (401, 403) - retry after token refresh
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Configuration errors - non-retryable
    Config,
}

/// Errors raised by the remote feed API client.
///
/// The `Api` variant carries the remote error envelope verbatim; its
/// numeric `code` is the platform's error number (e.g. the
/// merchant-connected-elsewhere conflict), which callers inspect via
/// [`FeedApiError::remote_code`].
#[derive(Debug, Error)]
pub enum FeedApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Remote API error {code}: {message}")]
    Api { status: u16, code: i64, message: String },

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl FeedApiError {
    /// Get the error category for this error
    pub fn category(&self) -> FeedApiErrorCategory {
        match self {
            Self::Auth(_) => FeedApiErrorCategory::Authentication,
            Self::RateLimit(_) => FeedApiErrorCategory::RateLimit,
            Self::Server(_) => FeedApiErrorCategory::Server,
            Self::Api { .. } | Self::Client(_) => FeedApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => FeedApiErrorCategory::Network,
            Self::Config(_) => FeedApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            FeedApiErrorCategory::Authentication
                | FeedApiErrorCategory::RateLimit
                | FeedApiErrorCategory::Server
                | FeedApiErrorCategory::Network
        )
    }

    /// The remote platform's numeric error code, when one was returned.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
