//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from a TOML file
//! 3. Probes a small set of conventional paths for config files
//!
//! ## Environment Variables
//! - `FEEDSYNC_API_BASE_URL`: Base URL of the remote catalog API
//! - `FEEDSYNC_AD_ACCOUNT_ID`: Advertising account id
//! - `FEEDSYNC_API_TIMEOUT`: Request timeout in seconds (optional)
//! - `FEEDSYNC_SYNC_INTERVAL`: Reconciliation interval in seconds (optional)
//! - `FEEDSYNC_SYNC_FIRST_RUN_DELAY`: First-run delay in seconds (optional)
//! - `FEEDSYNC_FEEDS_CACHE_TTL`: Feed listing cache TTL in seconds (optional)

use std::path::{Path, PathBuf};

use feedsync_domain::{ApiConfig, FeedSyncConfig, FeedSyncError, Result, SyncConfig};
use tracing::{debug, info};

const CONFIG_FILE_CANDIDATES: &[&str] = &["feedsync.toml", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns [`FeedSyncError::Config`] if configuration cannot be loaded
/// from either source.
pub fn load() -> Result<FeedSyncConfig> {
    match load_from_env() {
        Ok(config) => {
            info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns [`FeedSyncError::Config`] if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<FeedSyncConfig> {
    let base_url = env_var("FEEDSYNC_API_BASE_URL")?;
    let ad_account_id = env_var("FEEDSYNC_AD_ACCOUNT_ID")?;

    let defaults = SyncConfig::default();
    let api_defaults = ApiConfig::default();

    Ok(FeedSyncConfig {
        api: ApiConfig {
            base_url,
            ad_account_id,
            timeout_seconds: env_u64("FEEDSYNC_API_TIMEOUT", api_defaults.timeout_seconds)?,
        },
        sync: SyncConfig {
            interval_seconds: env_u64("FEEDSYNC_SYNC_INTERVAL", defaults.interval_seconds)?,
            first_run_delay_seconds: env_u64(
                "FEEDSYNC_SYNC_FIRST_RUN_DELAY",
                defaults.first_run_delay_seconds,
            )?,
            feeds_cache_ttl_seconds: env_u64(
                "FEEDSYNC_FEEDS_CACHE_TTL",
                defaults.feeds_cache_ttl_seconds,
            )?,
        },
    })
}

/// Load configuration from a TOML file
///
/// With no explicit path, probes the conventional candidates in the
/// current directory.
///
/// # Errors
/// Returns [`FeedSyncError::Config`] when no file is found or the file
/// cannot be parsed.
pub fn load_from_file(path: Option<&Path>) -> Result<FeedSyncConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_file()
            .ok_or_else(|| FeedSyncError::Config("no configuration file found".to_string()))?,
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        FeedSyncError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let config: FeedSyncConfig = toml::from_str(&raw).map_err(|e| {
        FeedSyncError::Config(format!("failed to parse {}: {e}", path.display()))
    })?;

    info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_config_file() -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| FeedSyncError::Config(format!("missing environment variable {name}")))
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| FeedSyncError::Config(format!("invalid value for {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn file_config_parses_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://api.example.com/v5\"\nad_account_id = \"acct-1\""
        )
        .unwrap();

        let config = load_from_file(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/v5");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.sync.interval_seconds, 600);
    }

    #[test]
    fn file_config_honors_sync_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://api.example.com/v5\"\nad_account_id = \"acct-1\"\n\
             [sync]\ninterval_seconds = 120\nfirst_run_delay_seconds = 1"
        )
        .unwrap();

        let config = load_from_file(Some(file.path())).unwrap();
        assert_eq!(config.sync.interval_seconds, 120);
        assert_eq!(config.sync.first_run_delay_seconds, 1);
        assert_eq!(config.sync.feeds_cache_ttl_seconds, 60);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = load_from_file(Some(Path::new("/nonexistent/feedsync.toml")));
        assert!(matches!(result, Err(FeedSyncError::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [").unwrap();

        let result = load_from_file(Some(file.path()));
        assert!(matches!(result, Err(FeedSyncError::Config(_))));
    }
}
