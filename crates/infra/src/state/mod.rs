//! Registration state store implementations
//!
//! The registration engine persists a handful of process-wide keys
//! (registered feed id, dirty flag, creation backoff delay, merchant
//! error flags). Two adapters implement the `RegistrationStateStore`
//! port: a SQLite-backed store for real deployments and an in-memory
//! store for tests and embedding.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

/// Key names shared by every state store implementation
pub(crate) mod keys {
    pub const FEED_REGISTERED: &str = "feed_registered";
    pub const FEED_DIRTY: &str = "feed_dirty";
    pub const CREATE_FEED_DELAY_SECS: &str = "create_feed_delay_secs";
    pub const MERCHANT_LOCALE_NOT_VALID: &str = "merchant_locale_not_valid";
    pub const MERCHANT_CONNECTED_DIFF_PLATFORM: &str = "merchant_connected_diff_platform";
}
