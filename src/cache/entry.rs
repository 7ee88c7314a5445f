//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with optional expiry.

// == Cache Entry ==
/// A stored value plus its timing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion timestamp (Unix milliseconds), None under capacity-only eviction
    pub inserted_at: Option<u64>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructors ==
    /// Creates an entry that never expires.
    pub fn persistent(value: V) -> Self {
        Self {
            value,
            inserted_at: None,
            expires_at: None,
        }
    }

    /// Creates an entry inserted at `now_ms` that expires `ttl_ms` later.
    pub fn expiring(value: V, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            inserted_at: Some(now_ms),
            expires_at: Some(now_ms.saturating_add(ttl_ms)),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is logically absent at `now_ms`.
    ///
    /// An entry stays live up to and including its expiry instant; it is
    /// expired only once `now_ms` is strictly past `expires_at`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms > expires,
            None => false,
        }
    }
}
