//! Feed registry
//!
//! Translates the local feed configuration into remote calls and answers
//! "does a matching remote feed already exist". Creation failures are
//! throttled through the fingerprint-keyed backoff cache so that retried
//! or overlapping reconciliation runs do not hammer the remote API with
//! an identical failing payload.

use std::sync::Arc;

use feedsync_common::fingerprint::fingerprint;
use feedsync_domain::constants::{CREATE_FEED_DELAY_FLOOR, RECENT_PROCESSING_RESULTS_PAGE_SIZE};
use feedsync_domain::{
    CatalogType, CreateFeedRequest, FeedApiError, FeedFormat, FeedStatus, ItemIssue,
    LocalFeedConfig, ProcessingResult, ProductAvailability, RemoteFeed,
};
use tracing::{debug, error, instrument, warn};

use crate::registration::backoff::{doubled_delay, CreateFeedBackoff};
use crate::registration::errors::RegistrationError;
use crate::registration::ports::{LocalFeedSource, RegistrationStateStore, RemoteFeedApi};

/// Remote feed lifecycle operations against a single merchant account
pub struct FeedRegistry {
    api: Arc<dyn RemoteFeedApi>,
    state: Arc<dyn RegistrationStateStore>,
    local: Arc<dyn LocalFeedSource>,
    backoff: CreateFeedBackoff,
}

impl FeedRegistry {
    /// Create a registry over the given ports
    pub fn new(
        api: Arc<dyn RemoteFeedApi>,
        state: Arc<dyn RegistrationStateStore>,
        local: Arc<dyn LocalFeedSource>,
    ) -> Self {
        Self::with_backoff(api, state, local, CreateFeedBackoff::new())
    }

    /// Create a registry with an explicit backoff cache (tests)
    pub fn with_backoff(
        api: Arc<dyn RemoteFeedApi>,
        state: Arc<dyn RegistrationStateStore>,
        local: Arc<dyn LocalFeedSource>,
        backoff: CreateFeedBackoff,
    ) -> Self {
        Self { api, state, local, backoff }
    }

    /// Register a new feed from the local configuration.
    ///
    /// Returns the id of the created feed, or an empty string when the
    /// remote creation succeeded but the new feed could not be resolved
    /// locally (logged, not fatal).
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Throttled`] when an unexpired backoff entry
    ///   exists for this payload; no remote call is made.
    /// - [`RegistrationError::Api`] when the remote call fails; a backoff
    ///   entry is stored and the persisted delay doubles (6h ceiling).
    #[instrument(skip(self))]
    pub async fn create_feed(&self) -> Result<String, RegistrationError> {
        let config = self.local.local_feed_config().await?;
        let request = build_create_request(&config);
        let payload_fingerprint = fingerprint(&request)?;

        if let Some(code) = self.backoff.active(&payload_fingerprint) {
            debug!(code, "feed creation still throttled from a previous failure");
            return Err(RegistrationError::Throttled { code });
        }

        let feed = match self.api.create_feed(&request).await {
            Ok(feed) => feed,
            Err(err) => {
                let delay =
                    self.state.create_feed_delay().await?.unwrap_or(CREATE_FEED_DELAY_FLOOR);
                self.backoff.record_failure(
                    &payload_fingerprint,
                    err.remote_code().unwrap_or_default(),
                    delay,
                );
                self.state.set_create_feed_delay(Some(doubled_delay(delay))).await?;
                return Err(err.into());
            }
        };

        self.api.invalidate_feeds_cache().await;

        // Resolve the new feed's id against the record we already hold,
        // avoiding an extra remote read.
        let feed_id = match self
            .match_local_feed_configuration_to_registered_feeds(Some(std::slice::from_ref(&feed)))
            .await
        {
            Ok(feed_id) => feed_id,
            Err(err) => {
                warn!(error = %err, "created feed but could not resolve its id");
                String::new()
            }
        };

        self.state.set_create_feed_delay(None).await?;
        self.backoff.clear(&payload_fingerprint);

        if feed_id.is_empty() {
            warn!(location = %request.location, "newly created feed did not match local configuration");
        }

        Ok(feed_id)
    }

    /// Verify whether the local feed is already registered remotely.
    ///
    /// Matches on location, default country, and default locale; currency
    /// is intentionally excluded from the match key. The first match in
    /// listing order wins, which keeps the result deterministic for a
    /// fixed listing. Returns an empty string when nothing matches.
    ///
    /// # Errors
    ///
    /// Transport failures while fetching the listing, and locale
    /// resolution failures, propagate; "no match" never does.
    #[instrument(skip(self, candidates))]
    pub async fn match_local_feed_configuration_to_registered_feeds(
        &self,
        candidates: Option<&[RemoteFeed]>,
    ) -> Result<String, RegistrationError> {
        let config = self.local.local_feed_config().await?;

        let fetched;
        let feeds: &[RemoteFeed] = match candidates {
            Some(feeds) => feeds,
            None => {
                fetched = self.api.get_feeds().await?;
                &fetched
            }
        };

        for feed in feeds {
            if feed.location == config.feed_url
                && feed.default_country.as_deref() == Some(config.country.as_str())
                && feed.default_locale.as_deref() == Some(config.locale.as_str())
            {
                return Ok(feed.id.clone());
            }
        }

        Ok(String::new())
    }

    /// The full remote feed listing (served through the cacheable read)
    pub async fn get_feeds(&self) -> Result<Vec<RemoteFeed>, FeedApiError> {
        self.api.get_feeds().await
    }

    /// The canonical local feed configuration this registry reconciles
    /// against.
    pub async fn local_feed_config(&self) -> Result<LocalFeedConfig, RegistrationError> {
        self.local.local_feed_config().await
    }

    /// Look up a single feed by id in the listing
    ///
    /// # Errors
    ///
    /// Transport failures propagate; an absent feed is `Ok(None)`.
    pub async fn get_feed(&self, feed_id: &str) -> Result<Option<RemoteFeed>, FeedApiError> {
        let feeds = match self.api.get_feeds().await {
            Ok(feeds) => feeds,
            Err(err) => {
                error!(error = %err, feed_id, "failed to fetch feed listing");
                return Err(err);
            }
        };
        Ok(feeds.into_iter().find(|feed| feed.id == feed_id))
    }

    /// Whether the given feed is currently active on the remote side.
    ///
    /// False for an empty id and for a feed absent from the listing.
    pub async fn is_local_feed_enabled(&self, feed_id: &str) -> Result<bool, FeedApiError> {
        if feed_id.is_empty() {
            return Ok(false);
        }
        Ok(self
            .get_feed(feed_id)
            .await?
            .map(|feed| feed.status.is_active())
            .unwrap_or(false))
    }

    /// Enable a feed. Fire-and-forget: failures are logged, not raised.
    ///
    /// Invalidates the cached listing on success; the new status is not
    /// re-checked.
    #[instrument(skip(self))]
    pub async fn enable_feed(&self, feed_id: &str) -> bool {
        match self.api.update_feed_status(feed_id, FeedStatus::Active).await {
            Ok(_) => {
                self.api.invalidate_feeds_cache().await;
                true
            }
            Err(err) => {
                error!(error = %err, feed_id, "failed to enable feed");
                false
            }
        }
    }

    /// Disable a feed. Fire-and-forget: failures are logged, not raised.
    ///
    /// Leaves listing-cache invalidation to the caller so that a cleanup
    /// pass over several feeds invalidates once.
    #[instrument(skip(self))]
    pub async fn disable_feed(&self, feed_id: &str) -> bool {
        match self.api.update_feed_status(feed_id, FeedStatus::Inactive).await {
            Ok(_) => true,
            Err(err) => {
                error!(error = %err, feed_id, "failed to disable feed");
                false
            }
        }
    }

    /// Drop the cached remote feed listing
    pub async fn invalidate_feeds_cache(&self) -> bool {
        self.api.invalidate_feeds_cache().await
    }

    /// The most recent processing report for a feed, if available.
    ///
    /// Best-effort: any transport failure yields `None` and must never
    /// abort registration.
    pub async fn get_feed_recent_processing_results(
        &self,
        feed_id: &str,
    ) -> Option<ProcessingResult> {
        match self
            .api
            .get_feed_processing_results(feed_id, RECENT_PROCESSING_RESULTS_PAGE_SIZE)
            .await
        {
            Ok(mut results) => {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            }
            Err(err) => {
                debug!(error = %err, feed_id, "failed to fetch feed processing results");
                None
            }
        }
    }

    /// Per-item issues of a processing result. Best-effort: empty on
    /// transport failure.
    pub async fn get_feed_processing_result_items_issues(
        &self,
        result_id: &str,
        per_page: u32,
    ) -> Vec<ItemIssue> {
        match self.api.get_processing_result_items_issues(result_id, per_page).await {
            Ok(issues) => issues,
            Err(err) => {
                debug!(error = %err, result_id, "failed to fetch processing result issues");
                Vec::new()
            }
        }
    }
}

/// Build the creation payload for the given local configuration
pub fn build_create_request(config: &LocalFeedConfig) -> CreateFeedRequest {
    CreateFeedRequest {
        name: format!("Created by FeedSync {}-{}", config.country, config.currency),
        format: FeedFormat::Xml,
        location: config.feed_url.clone(),
        catalog_type: CatalogType::Retail,
        default_currency: config.currency.clone(),
        default_locale: config.locale.clone(),
        default_country: config.country.clone(),
        default_availability: ProductAvailability::InStock,
    }
}
