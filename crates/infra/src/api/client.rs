//! Authenticated JSON client for the remote catalog API
//!
//! Wraps reqwest with bearer authentication, request timeouts, and
//! status-to-error mapping. Remote error envelopes (`{code, message}`)
//! are decoded so callers can branch on the platform's numeric error
//! codes.

use std::sync::Arc;
use std::time::Duration;

use feedsync_domain::FeedApiError;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::auth::AccessTokenProvider;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API (e.g. "https://api.example.com/v5")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self { base_url: "https://api.example.com/v5".to_string(), timeout: Duration::from_secs(30) }
    }
}

/// Error envelope returned by the remote API on non-2xx responses
#[derive(Debug, Deserialize)]
struct RemoteErrorEnvelope {
    code: i64,
    message: String,
}

/// Authenticated JSON transport
pub struct ApiClient {
    http: reqwest::Client,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns [`FeedApiError::Config`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        config: ApiClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, FeedApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, auth, config })
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, FeedApiError> {
        self.request::<(), R>(Method::GET, path, None).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, FeedApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// deserialized.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, FeedApiError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn request<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, FeedApiError> {
        let url = format!("{}{}", self.config.base_url, path);
        let token = self.auth.access_token().await?;

        debug!(url = %url, method = %method, "API request");

        let mut request = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                FeedApiError::Timeout(self.config.timeout)
            } else {
                FeedApiError::Network(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &url, body));
        }

        response
            .json()
            .await
            .map_err(|e| FeedApiError::Client(format!("failed to parse response: {e}")))
    }
}

fn map_status_error(status: StatusCode, url: &str, body: String) -> FeedApiError {
    let message = if body.is_empty() {
        format!("{url} returned status {status}")
    } else {
        format!("{url} returned status {status}: {body}")
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return FeedApiError::Auth(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FeedApiError::RateLimit(message);
    }
    if status.is_server_error() {
        return FeedApiError::Server(message);
    }

    // Client errors carry the platform's error envelope when present.
    if let Ok(envelope) = serde_json::from_str::<RemoteErrorEnvelope>(&body) {
        return FeedApiError::Api {
            status: status.as_u16(),
            code: envelope.code,
            message: envelope.message,
        };
    }
    if status.is_client_error() {
        return FeedApiError::Client(message);
    }
    FeedApiError::Network(message)
}
