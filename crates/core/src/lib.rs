//! # FeedSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the remote feed API, state
//!   store, local feed configuration, and catalog signals
//! - The feed registry (remote feed lifecycle operations + creation
//!   backoff)
//! - The registration controller (the per-tick reconciliation state
//!   machine)
//! - Locale mapping for the remote API
//!
//! ## Architecture Principles
//! - Only depends on `feedsync-common` and `feedsync-domain`
//! - No HTTP, database, or scheduler code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod locale;
pub mod registration;

// Re-export specific items to avoid ambiguity
pub use locale::{api_locale_for, LocaleError};
pub use registration::controller::{RegistrationController, TickOutcome};
pub use registration::errors::RegistrationError;
pub use registration::ports::{
    CatalogProbe, FeedFileProbe, LocalFeedSource, RegistrationStateStore, RemoteFeedApi,
};
pub use registration::registry::FeedRegistry;
