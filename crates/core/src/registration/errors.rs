//! Registration-specific error types
//!
//! The registry raises these to the controller; the controller is the
//! error boundary and nothing here ever reaches the scheduler.

use feedsync_common::fingerprint::FingerprintError;
use feedsync_domain::constants::MERCHANT_CONNECTED_DIFF_PLATFORM_CODE;
use feedsync_domain::{FeedApiError, FeedSyncError};
use thiserror::Error;

use crate::locale::LocaleError;

/// Errors raised while registering or reconciling the feed
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A previous creation attempt with the same payload failed recently;
    /// the remembered remote error code is carried along.
    #[error("feed creation throttled after a previous failure (remote code {code})")]
    Throttled { code: i64 },

    /// The merchant locale cannot be mapped to the remote API
    #[error(transparent)]
    Locale(#[from] LocaleError),

    /// The remote API call failed
    #[error(transparent)]
    Api(#[from] FeedApiError),

    /// The state store failed
    #[error("state store error: {0}")]
    State(#[from] FeedSyncError),

    /// Neither matching nor creation produced a feed id
    #[error("could not register feed")]
    NotRegistered,
}

impl RegistrationError {
    /// The remote platform's numeric error code, when one is attached
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Self::Throttled { code } => Some(*code),
            Self::Api(err) => err.remote_code(),
            _ => None,
        }
    }

    /// Whether the remote side reports this merchant as connected to the
    /// platform through a different site.
    pub fn is_platform_conflict(&self) -> bool {
        self.remote_code() == Some(MERCHANT_CONNECTED_DIFF_PLATFORM_CODE)
    }
}

impl From<FingerprintError> for RegistrationError {
    fn from(err: FingerprintError) -> Self {
        Self::State(FeedSyncError::Internal(err.to_string()))
    }
}
