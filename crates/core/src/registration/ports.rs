//! Port interfaces for feed registration

use std::time::Duration;

use async_trait::async_trait;
use feedsync_domain::{
    CreateFeedRequest, FeedApiError, FeedStatus, ItemIssue, LocalFeedConfig, ProcessingResult,
    RemoteFeed, Result,
};

use crate::registration::errors::RegistrationError;

/// Typed access to the remote catalog feed API.
///
/// The advertising account the feeds belong to is adapter configuration;
/// it does not appear in the port signatures. Implementations are
/// expected to serve `get_feeds` through a short-TTL cache with explicit
/// invalidation via `invalidate_feeds_cache`.
#[async_trait]
pub trait RemoteFeedApi: Send + Sync {
    /// Register a new feed and return the remote record
    async fn create_feed(&self, request: &CreateFeedRequest) -> std::result::Result<RemoteFeed, FeedApiError>;

    /// List all feeds registered for the account (cacheable read)
    async fn get_feeds(&self) -> std::result::Result<Vec<RemoteFeed>, FeedApiError>;

    /// Transition a feed to the given status
    async fn update_feed_status(
        &self,
        feed_id: &str,
        status: FeedStatus,
    ) -> std::result::Result<RemoteFeed, FeedApiError>;

    /// Fetch processing results for a feed, most recent first
    async fn get_feed_processing_results(
        &self,
        feed_id: &str,
        page_size: u32,
    ) -> std::result::Result<Vec<ProcessingResult>, FeedApiError>;

    /// Fetch per-item issues for a processing result
    async fn get_processing_result_items_issues(
        &self,
        result_id: &str,
        per_page: u32,
    ) -> std::result::Result<Vec<ItemIssue>, FeedApiError>;

    /// Drop any cached feed listing. Returns true when an entry existed.
    async fn invalidate_feeds_cache(&self) -> bool;
}

/// Persisted, process-wide registration state.
///
/// Lifecycle is tied to the sync feature being enabled; everything is
/// cleared wholesale on deregistration. The admin surface reads the same
/// keys for display.
#[async_trait]
pub trait RegistrationStateStore: Send + Sync {
    /// The registered remote feed id, if a create-or-match has succeeded
    async fn feed_registered(&self) -> Result<Option<String>>;

    /// Persist (or clear, with `None`) the registered feed id
    async fn set_feed_registered(&self, feed_id: Option<&str>) -> Result<()>;

    /// Whether the catalog changed since the last full feed generation
    async fn feed_dirty(&self) -> Result<bool>;

    /// Mark the catalog as changed (or fully regenerated, with `false`)
    async fn set_feed_dirty(&self, dirty: bool) -> Result<()>;

    /// Current backoff delay for failing feed creation calls
    async fn create_feed_delay(&self) -> Result<Option<Duration>>;

    /// Persist (or reset, with `None`) the creation backoff delay
    async fn set_create_feed_delay(&self, delay: Option<Duration>) -> Result<()>;

    /// Whether the merchant locale could not be mapped to the remote API
    async fn merchant_locale_not_valid(&self) -> Result<bool>;

    /// Record the locale-resolution flag
    async fn set_merchant_locale_not_valid(&self, value: bool) -> Result<()>;

    /// Whether the remote side reports the merchant connected elsewhere
    async fn merchant_connected_diff_platform(&self) -> Result<bool>;

    /// Record the platform-conflict flag
    async fn set_merchant_connected_diff_platform(&self, value: bool) -> Result<()>;

    /// Remove every registration key (deregistration)
    async fn clear_registration_state(&self) -> Result<()>;
}

/// Resolves the single canonical local feed definition.
///
/// Locale resolution happens here; an unmappable merchant locale
/// surfaces as [`RegistrationError::Locale`].
#[async_trait]
pub trait LocalFeedSource: Send + Sync {
    /// The canonical local feed configuration for this merchant
    async fn local_feed_config(&self) -> std::result::Result<LocalFeedConfig, RegistrationError>;
}

/// Reports whether the local feed file has finished generating.
#[async_trait]
pub trait FeedFileProbe: Send + Sync {
    /// True once a complete feed file exists at the configured location
    async fn feed_file_exists(&self) -> bool;
}

/// Catalog lookups needed by change signals.
#[async_trait]
pub trait CatalogProbe: Send + Sync {
    /// Whether the given id refers to a product in the catalog
    async fn product_exists(&self, product_id: &str) -> bool;
}
