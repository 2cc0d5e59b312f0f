//! Sync lifecycle ownership

pub mod orchestrator;

pub use orchestrator::SyncOrchestrator;
