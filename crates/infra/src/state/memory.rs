//! In-memory registration state store
//!
//! Backs the `RegistrationStateStore` port with a process-local map.
//! Used by tests and by hosts that persist state through their own
//! settings machinery.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use feedsync_core::RegistrationStateStore;
use feedsync_domain::Result;
use parking_lot::RwLock;

use super::keys;

/// Process-local key-value state store
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn get_bool(&self, key: &str) -> bool {
        self.values.read().get(key).and_then(serde_json::Value::as_bool).unwrap_or(false)
    }

    fn set_value(&self, key: &str, value: serde_json::Value) {
        self.values.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

#[async_trait]
impl RegistrationStateStore for MemoryStateStore {
    async fn feed_registered(&self) -> Result<Option<String>> {
        Ok(self
            .values
            .read()
            .get(keys::FEED_REGISTERED)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    async fn set_feed_registered(&self, feed_id: Option<&str>) -> Result<()> {
        match feed_id {
            Some(feed_id) => {
                self.set_value(keys::FEED_REGISTERED, serde_json::Value::String(feed_id.into()));
            }
            None => self.remove(keys::FEED_REGISTERED),
        }
        Ok(())
    }

    async fn feed_dirty(&self) -> Result<bool> {
        Ok(self.get_bool(keys::FEED_DIRTY))
    }

    async fn set_feed_dirty(&self, dirty: bool) -> Result<()> {
        self.set_value(keys::FEED_DIRTY, serde_json::Value::Bool(dirty));
        Ok(())
    }

    async fn create_feed_delay(&self) -> Result<Option<Duration>> {
        Ok(self
            .values
            .read()
            .get(keys::CREATE_FEED_DELAY_SECS)
            .and_then(serde_json::Value::as_u64)
            .map(Duration::from_secs))
    }

    async fn set_create_feed_delay(&self, delay: Option<Duration>) -> Result<()> {
        match delay {
            Some(delay) => self.set_value(
                keys::CREATE_FEED_DELAY_SECS,
                serde_json::Value::from(delay.as_secs()),
            ),
            None => self.remove(keys::CREATE_FEED_DELAY_SECS),
        }
        Ok(())
    }

    async fn merchant_locale_not_valid(&self) -> Result<bool> {
        Ok(self.get_bool(keys::MERCHANT_LOCALE_NOT_VALID))
    }

    async fn set_merchant_locale_not_valid(&self, value: bool) -> Result<()> {
        self.set_value(keys::MERCHANT_LOCALE_NOT_VALID, serde_json::Value::Bool(value));
        Ok(())
    }

    async fn merchant_connected_diff_platform(&self) -> Result<bool> {
        Ok(self.get_bool(keys::MERCHANT_CONNECTED_DIFF_PLATFORM))
    }

    async fn set_merchant_connected_diff_platform(&self, value: bool) -> Result<()> {
        self.set_value(keys::MERCHANT_CONNECTED_DIFF_PLATFORM, serde_json::Value::Bool(value));
        Ok(())
    }

    async fn clear_registration_state(&self) -> Result<()> {
        self.values.write().clear();
        Ok(())
    }
}
