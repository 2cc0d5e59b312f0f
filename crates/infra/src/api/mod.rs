//! Remote feed API adapter
//!
//! HTTP access to the remote catalog service: a thin authenticated JSON
//! client plus the feed endpoints, with the feed listing served through
//! a short-TTL cache with explicit invalidation.

pub mod auth;
pub mod client;
pub mod feeds;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use client::{ApiClient, ApiClientConfig};
pub use feeds::{RemoteFeedClient, RemoteFeedClientConfig};
