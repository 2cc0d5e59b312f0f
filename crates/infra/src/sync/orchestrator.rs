//! Sync orchestrator
//!
//! Owns the product sync feature's lifecycle: gates it behind its
//! prerequisites, arms the recurring registration schedule, receives
//! catalog-change signals from the host, and tears everything down on
//! deregistration. The host integration calls the inbound notification
//! methods; the engine never polls for host events.

use std::sync::Arc;

use feedsync_core::{
    CatalogProbe, FeedFileProbe, FeedRegistry, RegistrationController, RegistrationStateStore,
    RemoteFeedApi, TickOutcome,
};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::{RegistrationScheduler, RegistrationSchedulerConfig, SchedulerError};
use crate::settings::{SettingsLocalFeedSource, SyncSettings};

/// Top-level owner of the sync feature
pub struct SyncOrchestrator {
    settings: Arc<RwLock<SyncSettings>>,
    state: Arc<dyn RegistrationStateStore>,
    catalog: Arc<dyn CatalogProbe>,
    controller: Arc<RegistrationController>,
    scheduler: Mutex<RegistrationScheduler>,
}

impl SyncOrchestrator {
    /// Wire up the registry, controller, and scheduler over the given
    /// ports and an initial settings snapshot.
    pub fn new(
        initial_settings: SyncSettings,
        api: Arc<dyn RemoteFeedApi>,
        state: Arc<dyn RegistrationStateStore>,
        feed_file: Arc<dyn FeedFileProbe>,
        catalog: Arc<dyn CatalogProbe>,
        scheduler_config: RegistrationSchedulerConfig,
    ) -> Self {
        let settings = Arc::new(RwLock::new(initial_settings));
        let local_source = Arc::new(SettingsLocalFeedSource::new(settings.clone()));
        let registry = Arc::new(FeedRegistry::new(api, state.clone(), local_source));
        let controller =
            Arc::new(RegistrationController::new(registry, state.clone(), feed_file));
        let scheduler =
            Mutex::new(RegistrationScheduler::new(controller.clone(), scheduler_config));

        Self { settings, state, catalog, controller, scheduler }
    }

    /// Whether the feature flag and all of its prerequisites hold.
    ///
    /// Fail-closed: any single failing prerequisite disables the whole
    /// pipeline.
    pub fn is_product_sync_enabled(&self) -> bool {
        let settings = self.settings.read();
        settings.domain_verified
            && settings.tracking_configured
            && settings.product_sync_enabled
    }

    /// Arm the recurring registration schedule when the feature is
    /// enabled. Idempotent: an already-armed schedule is left alone.
    ///
    /// Returns whether the feature is running after the call.
    ///
    /// # Errors
    ///
    /// Propagates scheduler failures other than "already running".
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<bool, SchedulerError> {
        if !self.is_product_sync_enabled() {
            debug!("product sync prerequisites not met, staying disabled");
            return Ok(false);
        }

        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_scheduled() {
            debug!("registration schedule already armed");
            return Ok(true);
        }

        scheduler.start()?;
        info!("product sync enabled");
        Ok(true)
    }

    /// Run one reconciliation tick on demand (e.g. right after settings
    /// changed), outside the schedule.
    pub async fn run_now(&self) -> TickOutcome {
        self.controller.handle_registration().await
    }

    /// Observe a settings write from the host.
    ///
    /// Disabling the feature flag triggers full deregistration; turning
    /// it on (with prerequisites met) arms the schedule.
    #[instrument(skip(self, new_settings))]
    pub async fn on_settings_changed(&self, new_settings: SyncSettings) {
        let was_enabled = {
            let mut settings = self.settings.write();
            let was_enabled = settings.product_sync_enabled;
            *settings = new_settings;
            was_enabled
        };

        let now_enabled = self.settings.read().product_sync_enabled;
        if was_enabled && !now_enabled {
            info!("product sync disabled via settings, deregistering");
            self.deregister().await;
        } else if !was_enabled && now_enabled {
            if let Err(err) = self.start().await {
                warn!(error = %err, "failed to arm schedule after settings change");
            }
        }
    }

    /// A product was created or edited; mark the feed for regeneration.
    pub async fn on_product_changed(&self, product_id: &str) {
        if !self.catalog.product_exists(product_id).await {
            return;
        }
        self.mark_feed_dirty().await;
    }

    /// A product's stock status changed. Only honored while the host
    /// manages stock.
    pub async fn on_stock_status_changed(&self, product_id: &str) {
        if !self.settings.read().manage_stock {
            return;
        }
        self.on_product_changed(product_id).await;
    }

    /// The hide-out-of-stock setting changed; the whole feed is stale.
    pub async fn on_hide_out_of_stock_changed(&self) {
        self.mark_feed_dirty().await;
    }

    /// Tear the feature down: cancel the recurring schedule and clear
    /// every registration key. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn deregister(&self) {
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_scheduled() {
            if let Err(err) = scheduler.stop().await {
                warn!(error = %err, "failed to stop registration scheduler");
            }
        }
        drop(scheduler);

        if let Err(err) = self.state.clear_registration_state().await {
            warn!(error = %err, "failed to clear registration state");
        }

        info!("product feed registration reset");
    }

    /// Whether the recurring schedule is currently armed
    pub async fn is_scheduled(&self) -> bool {
        self.scheduler.lock().await.is_scheduled()
    }

    async fn mark_feed_dirty(&self) {
        if let Err(err) = self.state.set_feed_dirty(true).await {
            warn!(error = %err, "failed to mark feed dirty");
            return;
        }
        info!("feed marked dirty");
    }
}
