//! Feed registration controller
//!
//! The per-tick reconciliation state machine. One invocation per
//! scheduled interval (and on demand after configuration changes):
//! match-or-create the remote feed, persist the resolved id, keep the
//! feed enabled, and disable stale duplicates sharing the local feed's
//! directory.
//!
//! This is the error boundary for the whole registration pipeline: no
//! error escapes a tick, so the host scheduler never observes the
//! recurring task itself as failed.

use std::sync::Arc;

use feedsync_domain::RemoteFeed;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::registration::errors::RegistrationError;
use crate::registration::ports::{FeedFileProbe, RegistrationStateStore};
use crate::registration::registry::FeedRegistry;

/// Outcome of one reconciliation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The feed is registered and enabled
    Registered,
    /// The feed file is not ready yet; retried on the next interval
    Deferred,
    /// Registration failed this tick; retried on the next interval
    Failed,
}

/// The reconciliation state machine, one tick per invocation
pub struct RegistrationController {
    registry: Arc<FeedRegistry>,
    state: Arc<dyn RegistrationStateStore>,
    feed_file: Arc<dyn FeedFileProbe>,
}

impl RegistrationController {
    /// Create a controller over the given registry and ports
    pub fn new(
        registry: Arc<FeedRegistry>,
        state: Arc<dyn RegistrationStateStore>,
        feed_file: Arc<dyn FeedFileProbe>,
    ) -> Self {
        Self { registry, state, feed_file }
    }

    /// Run one reconciliation tick.
    ///
    /// Merchant error flags are re-derived every cycle rather than
    /// carried over. A missing feed file is an expected condition, not a
    /// failure. All errors are absorbed here.
    #[instrument(skip(self))]
    pub async fn handle_registration(&self) -> TickOutcome {
        self.clear_merchant_error_flags().await;

        if !self.feed_file.feed_file_exists().await {
            debug!("feed file not fully generated yet, retrying later");
            return TickOutcome::Deferred;
        }

        match self.register_feed().await {
            Ok(()) => TickOutcome::Registered,
            Err(err @ RegistrationError::Locale(_)) => {
                if let Err(state_err) = self.state.set_merchant_locale_not_valid(true).await {
                    warn!(error = %state_err, "failed to record locale flag");
                }
                error!(error = %err, "could not register feed");
                TickOutcome::Failed
            }
            Err(err) => {
                if err.is_platform_conflict() {
                    if let Err(state_err) =
                        self.state.set_merchant_connected_diff_platform(true).await
                    {
                        warn!(error = %state_err, "failed to record platform conflict flag");
                    }
                }
                error!(error = %err, "feed registration failed");
                TickOutcome::Failed
            }
        }
    }

    async fn clear_merchant_error_flags(&self) {
        if let Err(err) = self.state.set_merchant_connected_diff_platform(false).await {
            warn!(error = %err, "failed to clear platform conflict flag");
        }
        if let Err(err) = self.state.set_merchant_locale_not_valid(false).await {
            warn!(error = %err, "failed to clear locale flag");
        }
    }

    /// Match an existing remote feed or create one, then keep it enabled.
    ///
    /// The resolved id is persisted whatever the outcome; an empty id is
    /// itself meaningful state for the admin surface.
    async fn register_feed(&self) -> Result<(), RegistrationError> {
        let mut feed_id = self
            .registry
            .match_local_feed_configuration_to_registered_feeds(None)
            .await?;

        if feed_id.is_empty() {
            feed_id = self.registry.create_feed().await?;
        }

        self.state
            .set_feed_registered(if feed_id.is_empty() { None } else { Some(&feed_id) })
            .await?;

        if feed_id.is_empty() {
            return Err(RegistrationError::NotRegistered);
        }

        self.maintain_enabled_status(&feed_id).await?;
        Ok(())
    }

    /// Enable the registered feed if it is not enabled, then disable any
    /// stale sibling feeds.
    async fn maintain_enabled_status(&self, feed_id: &str) -> Result<(), RegistrationError> {
        if !self.registry.is_local_feed_enabled(feed_id).await? {
            self.registry.enable_feed(feed_id).await;
        }

        self.disable_stale_feeds(feed_id).await
    }

    /// Disable active remote feeds that share the local feed's directory
    /// but are not the feed resolved this cycle.
    ///
    /// Feed file URLs are regenerated with fresh name suffixes over time,
    /// so siblings under the same directory are earlier registrations of
    /// this same shop; comparing only the directory path avoids touching
    /// feeds from other locations registered to the same merchant.
    /// Best-effort: a failed listing read skips cleanup for this cycle.
    async fn disable_stale_feeds(&self, feed_id: &str) -> Result<(), RegistrationError> {
        let feeds = match self.registry.get_feeds().await {
            Ok(feeds) => feeds,
            Err(err) => {
                warn!(error = %err, "feed listing unavailable, skipping stale feed cleanup");
                return Ok(());
            }
        };
        if feeds.is_empty() {
            return Ok(());
        }

        let config = self.registry.local_feed_config().await?;
        let Some(local_dir) = directory_path(&config.feed_url) else {
            warn!(feed_url = %config.feed_url, "local feed url has no directory path");
            return Ok(());
        };

        let mut disabled_any = false;
        for feed in &feeds {
            if feed.id == feed_id {
                continue;
            }
            if !is_stale_sibling(feed, &local_dir) {
                continue;
            }
            if self.registry.disable_feed(&feed.id).await {
                debug!(stale_feed_id = %feed.id, "disabled stale feed");
                disabled_any = true;
            }
        }

        if disabled_any {
            self.registry.invalidate_feeds_cache().await;
        }

        Ok(())
    }
}

fn is_stale_sibling(feed: &RemoteFeed, local_dir: &str) -> bool {
    if !feed.status.is_active() {
        return false;
    }
    directory_path(&feed.location).as_deref() == Some(local_dir)
}

/// The location with its final path segment removed (query and fragment
/// stripped), or `None` for unparseable locations.
fn directory_path(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let host = url.host_str()?;
    let path = url.path();
    let dir = &path[..path.rfind('/')?];

    let mut base = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        base.push_str(&format!(":{port}"));
    }
    base.push_str(dir);
    Some(base)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use feedsync_domain::{
        CatalogType, CreateFeedRequest, FeedApiError, FeedFormat, FeedStatus, ItemIssue,
        LocalFeedConfig, ProcessingResult, ProductAvailability, RemoteFeed,
        Result as DomainResult,
    };

    use super::*;
    use crate::locale::LocaleError;
    use crate::registration::ports::{LocalFeedSource, RemoteFeedApi};

    fn local_config() -> LocalFeedConfig {
        LocalFeedConfig {
            feed_url: "https://shop.example/feed-abc123.xml".to_string(),
            country: "US".to_string(),
            locale: "en-US".to_string(),
            currency: "USD".to_string(),
        }
    }

    fn remote_feed(id: &str, location: &str, status: FeedStatus) -> RemoteFeed {
        RemoteFeed {
            id: id.to_string(),
            name: None,
            location: location.to_string(),
            status,
            format: FeedFormat::Xml,
            catalog_type: CatalogType::Retail,
            default_currency: Some("USD".to_string()),
            default_locale: Some("en-US".to_string()),
            default_country: Some("US".to_string()),
            default_availability: Some(ProductAvailability::InStock),
            created_at: None,
            updated_at: None,
        }
    }

    struct TestLocalSource {
        fail_locale: bool,
    }

    #[async_trait]
    impl LocalFeedSource for TestLocalSource {
        async fn local_feed_config(&self) -> Result<LocalFeedConfig, RegistrationError> {
            if self.fail_locale {
                return Err(RegistrationError::Locale(LocaleError::Unsupported(
                    "xx_XX".to_string(),
                )));
            }
            Ok(local_config())
        }
    }

    #[derive(Default)]
    struct TestState {
        feed_registered: StdMutex<Option<String>>,
        registered_writes: AtomicUsize,
        locale_flag: AtomicBool,
        platform_flag: AtomicBool,
        delay: StdMutex<Option<Duration>>,
    }

    #[async_trait]
    impl super::super::ports::RegistrationStateStore for TestState {
        async fn feed_registered(&self) -> DomainResult<Option<String>> {
            Ok(self.feed_registered.lock().unwrap().clone())
        }
        async fn set_feed_registered(&self, feed_id: Option<&str>) -> DomainResult<()> {
            self.registered_writes.fetch_add(1, Ordering::SeqCst);
            *self.feed_registered.lock().unwrap() = feed_id.map(str::to_string);
            Ok(())
        }
        async fn feed_dirty(&self) -> DomainResult<bool> {
            Ok(false)
        }
        async fn set_feed_dirty(&self, _dirty: bool) -> DomainResult<()> {
            Ok(())
        }
        async fn create_feed_delay(&self) -> DomainResult<Option<Duration>> {
            Ok(*self.delay.lock().unwrap())
        }
        async fn set_create_feed_delay(&self, delay: Option<Duration>) -> DomainResult<()> {
            *self.delay.lock().unwrap() = delay;
            Ok(())
        }
        async fn merchant_locale_not_valid(&self) -> DomainResult<bool> {
            Ok(self.locale_flag.load(Ordering::SeqCst))
        }
        async fn set_merchant_locale_not_valid(&self, value: bool) -> DomainResult<()> {
            self.locale_flag.store(value, Ordering::SeqCst);
            Ok(())
        }
        async fn merchant_connected_diff_platform(&self) -> DomainResult<bool> {
            Ok(self.platform_flag.load(Ordering::SeqCst))
        }
        async fn set_merchant_connected_diff_platform(&self, value: bool) -> DomainResult<()> {
            self.platform_flag.store(value, Ordering::SeqCst);
            Ok(())
        }
        async fn clear_registration_state(&self) -> DomainResult<()> {
            *self.feed_registered.lock().unwrap() = None;
            *self.delay.lock().unwrap() = None;
            self.locale_flag.store(false, Ordering::SeqCst);
            self.platform_flag.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FileReady(bool);

    #[async_trait]
    impl FeedFileProbe for FileReady {
        async fn feed_file_exists(&self) -> bool {
            self.0
        }
    }

    struct ScriptedApi {
        feeds: StdMutex<Vec<RemoteFeed>>,
        create_response: StdMutex<Option<Result<RemoteFeed, FeedApiError>>>,
        create_calls: AtomicUsize,
        status_calls: StdMutex<Vec<(String, FeedStatus)>>,
        invalidations: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(feeds: Vec<RemoteFeed>) -> Self {
            Self {
                feeds: StdMutex::new(feeds),
                create_response: StdMutex::new(None),
                create_calls: AtomicUsize::new(0),
                status_calls: StdMutex::new(Vec::new()),
                invalidations: AtomicUsize::new(0),
            }
        }

        fn with_create_response(self, response: Result<RemoteFeed, FeedApiError>) -> Self {
            *self.create_response.lock().unwrap() = Some(response);
            self
        }

        fn status_calls(&self) -> Vec<(String, FeedStatus)> {
            self.status_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteFeedApi for ScriptedApi {
        async fn create_feed(
            &self,
            request: &CreateFeedRequest,
        ) -> Result<RemoteFeed, FeedApiError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            match self.create_response.lock().unwrap().take() {
                Some(response) => response,
                None => Ok(remote_feed("F1", &request.location, FeedStatus::Inactive)),
            }
        }

        async fn get_feeds(&self) -> Result<Vec<RemoteFeed>, FeedApiError> {
            Ok(self.feeds.lock().unwrap().clone())
        }

        async fn update_feed_status(
            &self,
            feed_id: &str,
            status: FeedStatus,
        ) -> Result<RemoteFeed, FeedApiError> {
            self.status_calls.lock().unwrap().push((feed_id.to_string(), status));
            Ok(remote_feed(feed_id, "https://shop.example/feed-abc123.xml", status))
        }

        async fn get_feed_processing_results(
            &self,
            _feed_id: &str,
            _page_size: u32,
        ) -> Result<Vec<ProcessingResult>, FeedApiError> {
            Ok(Vec::new())
        }

        async fn get_processing_result_items_issues(
            &self,
            _result_id: &str,
            _per_page: u32,
        ) -> Result<Vec<ItemIssue>, FeedApiError> {
            Ok(Vec::new())
        }

        async fn invalidate_feeds_cache(&self) -> bool {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn controller_with(
        api: Arc<ScriptedApi>,
        file_ready: bool,
        fail_locale: bool,
    ) -> (RegistrationController, Arc<TestState>) {
        let state = Arc::new(TestState::default());
        let registry = Arc::new(FeedRegistry::new(
            api,
            state.clone(),
            Arc::new(TestLocalSource { fail_locale }),
        ));
        let controller =
            RegistrationController::new(registry, state.clone(), Arc::new(FileReady(file_ready)));
        (controller, state)
    }

    #[tokio::test]
    async fn tick_defers_while_feed_file_is_generating() {
        let api = Arc::new(ScriptedApi::new(Vec::new()));
        let (controller, state) = controller_with(api.clone(), false, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Deferred);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.registered_writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_listing_creates_and_enables_the_feed() {
        // Scenario: nothing registered remotely yet.
        let api = Arc::new(ScriptedApi::new(Vec::new()));
        let (controller, state) = controller_with(api.clone(), true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Registered);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.feed_registered().await.unwrap(), Some("F1".to_string()));
        assert_eq!(api.status_calls(), vec![("F1".to_string(), FeedStatus::Active)]);
    }

    #[tokio::test]
    async fn matching_inactive_feed_is_enabled_without_creation() {
        // Scenario: the feed exists remotely but is disabled.
        let api = Arc::new(ScriptedApi::new(vec![remote_feed(
            "F1",
            "https://shop.example/feed-abc123.xml",
            FeedStatus::Inactive,
        )]));
        let (controller, state) = controller_with(api.clone(), true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Registered);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.feed_registered().await.unwrap(), Some("F1".to_string()));
        assert_eq!(api.status_calls(), vec![("F1".to_string(), FeedStatus::Active)]);
    }

    #[tokio::test]
    async fn active_matching_feed_is_not_re_enabled() {
        let api = Arc::new(ScriptedApi::new(vec![remote_feed(
            "F1",
            "https://shop.example/feed-abc123.xml",
            FeedStatus::Active,
        )]));
        let (controller, _) = controller_with(api.clone(), true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Registered);
        assert!(api.status_calls().is_empty());
    }

    #[tokio::test]
    async fn stale_sibling_feeds_are_disabled_once() {
        // Scenario: an earlier registration with an old URL suffix is
        // still active under the same directory.
        let api = Arc::new(ScriptedApi::new(vec![
            remote_feed("F1", "https://shop.example/feed-abc123.xml", FeedStatus::Active),
            remote_feed("F2", "https://shop.example/feed-oldsuffix.xml", FeedStatus::Active),
        ]));
        let (controller, _) = controller_with(api.clone(), true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Registered);
        assert_eq!(api.status_calls(), vec![("F2".to_string(), FeedStatus::Inactive)]);
        assert_eq!(api.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cleanup_skips_foreign_directories_and_inactive_feeds() {
        let api = Arc::new(ScriptedApi::new(vec![
            remote_feed("F1", "https://shop.example/feed-abc123.xml", FeedStatus::Active),
            remote_feed("F3", "https://other.example/feed-x.xml", FeedStatus::Active),
            remote_feed("F4", "https://shop.example/sub/feed-y.xml", FeedStatus::Active),
            remote_feed("F5", "https://shop.example/feed-old.xml", FeedStatus::Inactive),
        ]));
        let (controller, _) = controller_with(api.clone(), true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Registered);
        assert!(api.status_calls().is_empty());
        assert_eq!(api.invalidations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn locale_failure_sets_flag_and_fails_tick() {
        let api = Arc::new(ScriptedApi::new(Vec::new()));
        let (controller, state) = controller_with(api.clone(), true, true);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Failed);
        assert!(state.merchant_locale_not_valid().await.unwrap());
        assert!(!state.merchant_connected_diff_platform().await.unwrap());
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn platform_conflict_code_sets_flag() {
        let api = Arc::new(ScriptedApi::new(Vec::new()).with_create_response(Err(
            FeedApiError::Api {
                status: 409,
                code: 4163,
                message: "merchant connected through another platform".to_string(),
            },
        )));
        let (controller, state) = controller_with(api, true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Failed);
        assert!(state.merchant_connected_diff_platform().await.unwrap());
        assert!(!state.merchant_locale_not_valid().await.unwrap());
    }

    #[tokio::test]
    async fn error_flags_are_re_derived_each_tick() {
        let api = Arc::new(ScriptedApi::new(vec![remote_feed(
            "F1",
            "https://shop.example/feed-abc123.xml",
            FeedStatus::Active,
        )]));
        let (controller, state) = controller_with(api, true, false);

        state.set_merchant_locale_not_valid(true).await.unwrap();
        state.set_merchant_connected_diff_platform(true).await.unwrap();

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Registered);
        assert!(!state.merchant_locale_not_valid().await.unwrap());
        assert!(!state.merchant_connected_diff_platform().await.unwrap());
    }

    #[tokio::test]
    async fn failed_creation_persists_empty_registration() {
        let api = Arc::new(
            ScriptedApi::new(Vec::new())
                .with_create_response(Err(FeedApiError::Server("boom".to_string()))),
        );
        let (controller, state) = controller_with(api, true, false);

        let outcome = controller.handle_registration().await;

        assert_eq!(outcome, TickOutcome::Failed);
        // The failed attempt never reached the persistence step, so no
        // id was recorded for this cycle.
        assert_eq!(state.feed_registered().await.unwrap(), None);
    }

    #[test]
    fn directory_path_strips_final_segment_and_query() {
        assert_eq!(
            directory_path("https://shop.example/feed-abc123.xml").as_deref(),
            Some("https://shop.example")
        );
        assert_eq!(
            directory_path("https://shop.example/sub/feed.xml?v=2").as_deref(),
            Some("https://shop.example/sub")
        );
        assert_eq!(
            directory_path("https://shop.example:8443/feed.xml").as_deref(),
            Some("https://shop.example:8443")
        );
        assert_eq!(directory_path("not a url"), None);
    }

    #[test]
    fn sibling_check_requires_active_status_and_same_directory() {
        let local_dir = directory_path("https://shop.example/feed-abc123.xml").unwrap();

        let active_sibling =
            remote_feed("F2", "https://shop.example/feed-old.xml", FeedStatus::Active);
        assert!(is_stale_sibling(&active_sibling, &local_dir));

        let inactive_sibling =
            remote_feed("F3", "https://shop.example/feed-old.xml", FeedStatus::Inactive);
        assert!(!is_stale_sibling(&inactive_sibling, &local_dir));

        let foreign = remote_feed("F4", "https://other.example/feed.xml", FeedStatus::Active);
        assert!(!is_stale_sibling(&foreign, &local_dir));
    }
}
