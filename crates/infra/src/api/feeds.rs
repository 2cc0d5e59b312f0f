//! Remote feed endpoints
//!
//! Implements the `RemoteFeedApi` port over the catalog endpoints. The
//! feed listing is the only cached read: repeated reconciliation ticks
//! and admin reads hit the remote at most once per TTL, and every
//! invalidation point is explicit.

use std::sync::Arc;

use async_trait::async_trait;
use feedsync_core::RemoteFeedApi;
use feedsync_domain::constants::FEEDS_CACHE_TTL;
use feedsync_domain::{
    CreateFeedRequest, FeedApiError, FeedListPage, FeedStatus, ItemIssue, ItemIssuesPage,
    ProcessingResult, ProcessingResultsPage, RemoteFeed,
};
use moka::sync::Cache;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::client::ApiClient;

/// Configuration for the remote feed client
#[derive(Debug, Clone)]
pub struct RemoteFeedClientConfig {
    /// Advertising account the feeds belong to
    pub ad_account_id: String,
    /// TTL for the cached feed listing
    pub feeds_cache_ttl: Duration,
}

impl RemoteFeedClientConfig {
    /// Configuration with the default listing TTL
    pub fn new(ad_account_id: impl Into<String>) -> Self {
        Self { ad_account_id: ad_account_id.into(), feeds_cache_ttl: FEEDS_CACHE_TTL }
    }
}

#[derive(Debug, Serialize)]
struct UpdateFeedStatusRequest {
    status: FeedStatus,
}

/// Remote feed API client with a cached listing read
pub struct RemoteFeedClient {
    client: Arc<ApiClient>,
    config: RemoteFeedClientConfig,
    feeds_cache: Cache<String, Arc<Vec<RemoteFeed>>>,
}

impl RemoteFeedClient {
    /// Create a feed client over the given transport
    pub fn new(client: Arc<ApiClient>, config: RemoteFeedClientConfig) -> Self {
        let feeds_cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(config.feeds_cache_ttl)
            .build();
        Self { client, config, feeds_cache }
    }

    fn cache_key(&self) -> String {
        self.config.ad_account_id.clone()
    }
}

#[async_trait]
impl RemoteFeedApi for RemoteFeedClient {
    #[instrument(skip(self, request))]
    async fn create_feed(&self, request: &CreateFeedRequest) -> Result<RemoteFeed, FeedApiError> {
        let path = format!("/catalogs/feeds?ad_account_id={}", self.config.ad_account_id);
        self.client.post(&path, request).await
    }

    async fn get_feeds(&self) -> Result<Vec<RemoteFeed>, FeedApiError> {
        if let Some(cached) = self.feeds_cache.get(&self.cache_key()) {
            debug!("serving feed listing from cache");
            return Ok(cached.as_ref().clone());
        }

        let path = format!("/catalogs/feeds?ad_account_id={}", self.config.ad_account_id);
        let page: FeedListPage = self.client.get(&path).await?;
        self.feeds_cache.insert(self.cache_key(), Arc::new(page.items.clone()));
        Ok(page.items)
    }

    #[instrument(skip(self))]
    async fn update_feed_status(
        &self,
        feed_id: &str,
        status: FeedStatus,
    ) -> Result<RemoteFeed, FeedApiError> {
        let path = format!(
            "/catalogs/feeds/{feed_id}?ad_account_id={}",
            self.config.ad_account_id
        );
        self.client.patch(&path, &UpdateFeedStatusRequest { status }).await
    }

    async fn get_feed_processing_results(
        &self,
        feed_id: &str,
        page_size: u32,
    ) -> Result<Vec<ProcessingResult>, FeedApiError> {
        let path = format!(
            "/catalogs/feeds/{feed_id}/processing_results?ad_account_id={}&page_size={page_size}",
            self.config.ad_account_id
        );
        let page: ProcessingResultsPage = self.client.get(&path).await?;
        Ok(page.items)
    }

    async fn get_processing_result_items_issues(
        &self,
        result_id: &str,
        per_page: u32,
    ) -> Result<Vec<ItemIssue>, FeedApiError> {
        let path = format!(
            "/catalogs/processing_results/{result_id}/item_issues?page_size={per_page}"
        );
        let page: ItemIssuesPage = self.client.get(&path).await?;
        Ok(page.items)
    }

    async fn invalidate_feeds_cache(&self) -> bool {
        let key = self.cache_key();
        let had_entry = self.feeds_cache.contains_key(&key);
        self.feeds_cache.invalidate(&key);
        debug!(had_entry, "invalidated feed listing cache");
        had_entry
    }
}
