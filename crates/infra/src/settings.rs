//! Merchant sync settings
//!
//! A snapshot of the host platform's settings that the sync feature
//! depends on: the feature flag and its prerequisites, the published
//! feed URL, and the merchant's country/currency/locale. The host pushes
//! new snapshots through `SyncOrchestrator::on_settings_changed`; the
//! engine never polls for them.

use std::sync::Arc;

use async_trait::async_trait;
use feedsync_core::{api_locale_for, LocalFeedSource, RegistrationError};
use feedsync_domain::LocalFeedConfig;
use parking_lot::RwLock;

/// Snapshot of host settings consumed by the sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// The product sync feature flag
    pub product_sync_enabled: bool,
    /// Whether the store's domain is verified with the platform
    pub domain_verified: bool,
    /// Whether tracking/conversion configuration is present
    pub tracking_configured: bool,
    /// Whether the host manages stock levels
    pub manage_stock: bool,
    /// Published location of the generated feed file
    pub feed_url: String,
    /// Merchant base country (ISO 3166-1 alpha-2); empty falls back to US
    pub base_country: String,
    /// Merchant currency (ISO 4217)
    pub currency: String,
    /// Merchant locale as reported by the host (e.g. `en_US`)
    pub merchant_locale: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            product_sync_enabled: false,
            domain_verified: false,
            tracking_configured: false,
            manage_stock: false,
            feed_url: String::new(),
            base_country: String::new(),
            currency: "USD".to_string(),
            merchant_locale: "en_US".to_string(),
        }
    }
}

impl SyncSettings {
    /// Country to register the feed under, defaulting to US
    pub fn country(&self) -> &str {
        if self.base_country.is_empty() {
            "US"
        } else {
            &self.base_country
        }
    }
}

/// Resolves the canonical local feed configuration from shared settings
pub struct SettingsLocalFeedSource {
    settings: Arc<RwLock<SyncSettings>>,
}

impl SettingsLocalFeedSource {
    /// Create a source over a shared settings snapshot
    pub fn new(settings: Arc<RwLock<SyncSettings>>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl LocalFeedSource for SettingsLocalFeedSource {
    async fn local_feed_config(&self) -> Result<LocalFeedConfig, RegistrationError> {
        let snapshot = self.settings.read().clone();
        let locale = api_locale_for(&snapshot.merchant_locale)?;

        Ok(LocalFeedConfig {
            feed_url: snapshot.feed_url.clone(),
            country: snapshot.country().to_string(),
            locale,
            currency: snapshot.currency,
        })
    }
}
