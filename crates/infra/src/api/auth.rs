//! Access token management for API requests

use async_trait::async_trait;
use feedsync_domain::FeedApiError;

/// Provides bearer tokens for API requests.
///
/// Implementations may refresh tokens under the hood; the client fetches
/// the token per request so a refreshed token is picked up immediately.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// The current access token
    async fn access_token(&self) -> Result<String, FeedApiError>;
}

/// A fixed token, for setups where the host platform manages refresh
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wrap an already-issued token
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, FeedApiError> {
        Ok(self.token.clone())
    }
}
