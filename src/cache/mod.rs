//! Cache Module
//!
//! Provides a generic, thread-safe, bounded in-memory cache with LRU eviction
//! and optional TTL expiration. It knows nothing about rate limiting.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;
mod value;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, EvictionPolicy, WriteBack};
pub use value::CounterValue;
