//! Configuration structures
//!
//! Typed configuration consumed by the infrastructure layer. Loaded from
//! environment variables or a TOML file by `feedsync-infra::config`.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSyncConfig {
    /// Remote API client configuration
    pub api: ApiConfig,
    /// Reconciliation schedule configuration
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Remote API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the remote catalog API (e.g. "https://api.example.com/v5")
    pub base_url: String,
    /// Advertising account the feeds belong to
    pub ad_account_id: String,
    /// Timeout for API requests, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            ad_account_id: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Reconciliation schedule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between reconciliation ticks
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Seconds before the first tick after arming the schedule
    #[serde(default = "default_first_run_delay_seconds")]
    pub first_run_delay_seconds: u64,
    /// TTL for the cached remote feed listing, in seconds
    #[serde(default = "default_feeds_cache_ttl_seconds")]
    pub feeds_cache_ttl_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            first_run_delay_seconds: default_first_run_delay_seconds(),
            feeds_cache_ttl_seconds: default_feeds_cache_ttl_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_interval_seconds() -> u64 {
    constants::REGISTRATION_INTERVAL.as_secs()
}

fn default_first_run_delay_seconds() -> u64 {
    constants::REGISTRATION_FIRST_RUN_DELAY.as_secs()
}

fn default_feeds_cache_ttl_seconds() -> u64 {
    constants::FEEDS_CACHE_TTL.as_secs()
}
