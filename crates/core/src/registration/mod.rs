//! Feed registration: ports, registry, and the reconciliation controller
//!
//! The registry translates local feed configuration into remote calls;
//! the controller decides, once per tick, whether to match, create,
//! enable, and clean up feeds. Both are pure over the port traits in
//! [`ports`].

pub mod backoff;
pub mod controller;
pub mod errors;
pub mod ports;
pub mod registry;

pub use backoff::CreateFeedBackoff;
pub use controller::{RegistrationController, TickOutcome};
pub use errors::RegistrationError;
pub use registry::FeedRegistry;
