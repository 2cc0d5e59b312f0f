//! SQLite-backed registration state store
//!
//! A pooled rusqlite key-value table holding the registration keys as
//! JSON values. Writes go through `INSERT ... ON CONFLICT` so every
//! setter is a single statement; the table is created on open.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use feedsync_core::RegistrationStateStore;
use feedsync_domain::{FeedSyncError, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

use super::keys;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS registration_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// Key-value state store backed by a pooled SQLite database
pub struct SqliteStateStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStateStore {
    /// Open (creating if needed) the state database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`FeedSyncError::Storage`] when the database cannot be
    /// opened or the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| FeedSyncError::Storage(format!("failed to build pool: {e}")))?;

        let store = Self { pool };
        store.with_conn(|conn| conn.execute(SCHEMA, []).map(|_| ()))?;
        debug!(path = %path.as_ref().display(), "opened registration state store");
        Ok(store)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> std::result::Result<T, rusqlite::Error>,
    ) -> Result<T> {
        let conn = self
            .pool
            .get()
            .map_err(|e| FeedSyncError::Storage(format!("failed to get connection: {e}")))?;
        f(&conn).map_err(|e| FeedSyncError::Storage(e.to_string()))
    }

    fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let raw: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM registration_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
        })?;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| FeedSyncError::Storage(format!("corrupt value for {key}: {e}"))),
            None => Ok(None),
        }
    }

    fn set_value(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let raw = value.to_string();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO registration_state (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, raw],
            )
            .map(|_| ())
        })
    }

    fn remove_value(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM registration_state WHERE key = ?1", params![key]).map(|_| ())
        })
    }

    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self.get_value(key)?.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_value(key, &serde_json::Value::Bool(value))
    }
}

#[async_trait]
impl RegistrationStateStore for SqliteStateStore {
    async fn feed_registered(&self) -> Result<Option<String>> {
        Ok(self
            .get_value(keys::FEED_REGISTERED)?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn set_feed_registered(&self, feed_id: Option<&str>) -> Result<()> {
        match feed_id {
            Some(feed_id) => self
                .set_value(keys::FEED_REGISTERED, &serde_json::Value::String(feed_id.into())),
            None => self.remove_value(keys::FEED_REGISTERED),
        }
    }

    async fn feed_dirty(&self) -> Result<bool> {
        self.get_bool(keys::FEED_DIRTY)
    }

    async fn set_feed_dirty(&self, dirty: bool) -> Result<()> {
        self.set_bool(keys::FEED_DIRTY, dirty)
    }

    async fn create_feed_delay(&self) -> Result<Option<Duration>> {
        Ok(self
            .get_value(keys::CREATE_FEED_DELAY_SECS)?
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs))
    }

    async fn set_create_feed_delay(&self, delay: Option<Duration>) -> Result<()> {
        match delay {
            Some(delay) => self
                .set_value(keys::CREATE_FEED_DELAY_SECS, &serde_json::Value::from(delay.as_secs())),
            None => self.remove_value(keys::CREATE_FEED_DELAY_SECS),
        }
    }

    async fn merchant_locale_not_valid(&self) -> Result<bool> {
        self.get_bool(keys::MERCHANT_LOCALE_NOT_VALID)
    }

    async fn set_merchant_locale_not_valid(&self, value: bool) -> Result<()> {
        self.set_bool(keys::MERCHANT_LOCALE_NOT_VALID, value)
    }

    async fn merchant_connected_diff_platform(&self) -> Result<bool> {
        self.get_bool(keys::MERCHANT_CONNECTED_DIFF_PLATFORM)
    }

    async fn set_merchant_connected_diff_platform(&self, value: bool) -> Result<()> {
        self.set_bool(keys::MERCHANT_CONNECTED_DIFF_PLATFORM, value)
    }

    async fn clear_registration_state(&self) -> Result<()> {
        self.with_conn(|conn| conn.execute("DELETE FROM registration_state", []).map(|_| ()))
    }
}
