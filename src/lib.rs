//! Web backend template with a cache-backed fixed-window rate limiter
//!
//! The cache layer is a bounded, thread-safe key-value store with LRU
//! eviction and optional TTL expiry. The rate limiter counts hits per
//! caller and endpoint in that store, and the HTTP layer applies it as
//! per-route middleware and per-message on WebSocket connections.

pub mod admission;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod tasks;

pub use admission::{AdmissionConfig, AdmissionSettings};
pub use api::{create_router, AppState};
pub use cache::{CacheStore, EvictionPolicy};
pub use config::Config;
pub use ratelimit::{RateLimitRule, RateLimiter};
pub use tasks::spawn_cleanup_task;
