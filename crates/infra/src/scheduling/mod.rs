//! Scheduling infrastructure for the recurring registration task
//!
//! One background task drives reconciliation:
//! - Explicit lifecycle management (start/stop)
//! - Join handle tracked, cancellation token support
//! - The tick itself never fails the task; at-least-once delivery holds
//!   because the loop outlives failed ticks

pub mod error;
pub mod registration_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use registration_scheduler::{
    RegistrationJob, RegistrationScheduler, RegistrationSchedulerConfig,
};
