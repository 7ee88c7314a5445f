//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and optional
//! TTL expiration, guarded by a single lock per store.
//!
//! Every public operation takes the same mutex, so compound operations
//! (`get_or_set`, `increment`, `compute`) are linearizable. The price is that
//! unrelated keys contend on one lock, which becomes the bottleneck under high
//! key cardinality. Sharding the map by key hash (one lock per shard) keeps
//! the same contract and is the way to scale this.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, Clock, CounterValue, LruTracker, SystemClock};
use crate::error::{CacheError, Result};

// == Eviction Policy ==
/// How a store keeps itself bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Bounded size; each entry also expires `ttl` after it was last written.
    CapacityTtl { ttl: Duration },
    /// Bounded size, no expiry, pure LRU eviction on overflow.
    CapacityOnly,
}

impl EvictionPolicy {
    /// Entry lifetime, if this policy expires entries.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            EvictionPolicy::CapacityTtl { ttl } => Some(*ttl),
            EvictionPolicy::CapacityOnly => None,
        }
    }

    fn ttl_ms(&self) -> Option<u64> {
        match self {
            EvictionPolicy::CapacityTtl { ttl } => Some(ttl.as_millis() as u64),
            EvictionPolicy::CapacityOnly => None,
        }
    }
}

// == Write Back ==
/// What a [`CacheStore::compute`] closure wants stored after it ran.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteBack<V> {
    /// Leave the slot as it is
    Keep,
    /// Insert or overwrite the value
    Put(V),
    /// Remove the entry
    Remove,
}

// == Store Internals ==
#[derive(Debug)]
struct StoreInner<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// `(expires_at, key)` for every expiring entry, soonest first
    expiry: BTreeSet<(u64, String)>,
    /// Performance statistics
    stats: CacheStats,
}

impl<V> StoreInner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            expiry: BTreeSet::new(),
            stats: CacheStats::new(),
        }
    }

    /// Returns the entry for `key` if it is live, reclaiming it if expired.
    fn live(&mut self, key: &str, now: u64) -> Option<&mut CacheEntry<V>> {
        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
            return None;
        }
        self.entries.get_mut(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.lru.remove(key);
                if let Some(expires) = entry.expires_at {
                    self.expiry.remove(&(expires, key.to_string()));
                }
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, key: &str, value: V, now: u64, policy: EvictionPolicy, capacity: usize) {
        if !self.entries.contains_key(key) && self.entries.len() >= capacity {
            // One slot is enough: an expired entry goes first, otherwise the
            // least recently used live one.
            if self.reclaim_expired(now, 1) == 0 {
                if let Some(evicted) = self.lru.evict_oldest() {
                    self.remove(&evicted);
                    self.stats.record_eviction();
                    debug!("Cache EVICT: key={}", evicted);
                }
            }
        }

        let entry = match policy.ttl_ms() {
            Some(ttl) => CacheEntry::expiring(value, now, ttl),
            None => CacheEntry::persistent(value),
        };
        let expires = entry.expires_at;

        if let Some(old) = self.entries.insert(key.to_string(), entry) {
            if let Some(old_expires) = old.expires_at {
                self.expiry.remove(&(old_expires, key.to_string()));
            }
        }
        if let Some(expires) = expires {
            self.expiry.insert((expires, key.to_string()));
        }
        self.lru.touch(key);
    }

    /// Removes up to `limit` expired entries, soonest-expiring first.
    fn reclaim_expired(&mut self, now: u64, limit: usize) -> usize {
        let mut removed = 0;
        while removed < limit {
            let key = match self.expiry.first() {
                Some((expires, key)) if now > *expires => key.clone(),
                _ => break,
            };
            self.remove(&key);
            removed += 1;
        }
        self.stats.record_expirations(removed);
        removed
    }

    fn purge_expired(&mut self, now: u64) -> usize {
        self.reclaim_expired(now, usize::MAX)
    }
}

// == Cache Store ==
/// Thread-safe bounded cache shared by reference (`Arc<CacheStore<V>>`).
#[derive(Debug)]
pub struct CacheStore<V> {
    inner: Mutex<StoreInner<V>>,
    policy: EvictionPolicy,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructors ==
    /// Creates a store holding at most `capacity` entries, on wall-clock time.
    ///
    /// # Errors
    /// `CacheError::InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Result<Self> {
        Self::with_clock(capacity, policy, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(
        capacity: usize,
        policy: EvictionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        info!(
            "CacheStore initialized: policy={:?}, capacity={}",
            policy, capacity
        );
        Ok(Self {
            inner: Mutex::new(StoreInner::new()),
            policy,
            capacity,
            clock,
        })
    }

    // == Get ==
    /// Returns a clone of the live value for `key`, marking it recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();

        let value = inner.live(key, now).map(|entry| entry.value.clone());
        match value {
            Some(_) => {
                inner.stats.record_hit();
                inner.lru.touch(key);
                debug!("Cache HIT: key={}", key);
            }
            None => {
                inner.stats.record_miss();
                debug!("Cache MISS: key={}", key);
            }
        }
        value
    }

    // == Set ==
    /// Inserts or overwrites `key`. Overwriting refreshes the TTL.
    ///
    /// At capacity with a new key, the least recently used entry is evicted
    /// first.
    pub fn set(&self, key: &str, value: V) {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        inner.insert(key, value, now, self.policy, self.capacity);
        debug!(
            "Cache SET: key={}, size={}/{}",
            key,
            inner.entries.len(),
            self.capacity
        );
    }

    // == Delete ==
    /// Removes `key`. Returns true if a live entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        let removed = inner.live(key, now).is_some() && inner.remove(key);
        debug!("Cache DELETE: key={}, removed={}", key, removed);
        removed
    }

    // == Exists ==
    /// Checks for a live entry without touching recency.
    pub fn exists(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.inner.lock().live(key, now).is_some()
    }

    // == Get Or Set ==
    /// Returns the live value for `key`, inserting `default` first if absent.
    pub fn get_or_set(&self, key: &str, default: V) -> V {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();

        let found = inner.live(key, now).map(|entry| entry.value.clone());
        if let Some(value) = found {
            inner.stats.record_hit();
            inner.lru.touch(key);
            debug!("Cache GET_OR_SET: key={} found", key);
            return value;
        }

        inner.stats.record_miss();
        inner.insert(key, default.clone(), now, self.policy, self.capacity);
        debug!("Cache GET_OR_SET: key={} not found, setting default", key);
        default
    }

    // == Compute ==
    /// Atomic read-modify-write on one key.
    ///
    /// `f` receives the live value (if any) and the store's current time in
    /// Unix milliseconds; it returns what to write back and a result. The
    /// whole sequence runs under the store lock. If `f` fails nothing is
    /// written.
    ///
    /// # Deadlocks
    /// The store lock is not reentrant. `f` must not call back into this
    /// store; doing so blocks the calling thread forever.
    pub fn compute<R, F>(&self, key: &str, f: F) -> Result<R>
    where
        F: FnOnce(Option<&V>, u64) -> Result<(WriteBack<V>, R)>,
    {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();

        let current = inner.live(key, now).map(|entry| &entry.value);
        let found = current.is_some();
        let (write, out) = f(current, now)?;

        if found {
            inner.stats.record_hit();
        } else {
            inner.stats.record_miss();
        }

        match write {
            WriteBack::Keep => {
                if found {
                    inner.lru.touch(key);
                }
            }
            WriteBack::Put(value) => inner.insert(key, value, now, self.policy, self.capacity),
            WriteBack::Remove => {
                inner.remove(key);
            }
        }
        Ok(out)
    }

    // == Size ==
    /// Number of live entries.
    pub fn size(&self) -> usize {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        inner.purge_expired(now);
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Keys ==
    /// Snapshot of all live keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        let mut inner = self.inner.lock();
        inner.purge_expired(now);
        inner.entries.keys().cloned().collect()
    }

    // == Clear ==
    /// Removes every entry. Statistics counters are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.lru.clear();
        inner.expiry.clear();
        info!("Cache CLEARED: removed {} entries", removed);
    }

    // == Purge Expired ==
    /// Reclaims memory held by expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        self.inner.lock().purge_expired(now)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Clone + CounterValue> CacheStore<V> {
    // == Increment ==
    /// Adds `amount` to the integer at `key`, treating absent as zero.
    ///
    /// # Errors
    /// `NotNumeric` if the live value is not an integer, `Overflow` if the
    /// result does not fit in an `i64`.
    pub fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        self.compute(key, |current, _| {
            let old = match current {
                Some(value) => value
                    .as_counter()
                    .ok_or_else(|| CacheError::NotNumeric(key.to_string()))?,
                None => 0,
            };
            let new = old
                .checked_add(amount)
                .ok_or_else(|| CacheError::Overflow(key.to_string()))?;
            debug!(
                "Cache INCREMENT: key={}, old_value={}, new_value={}",
                key, old, new
            );
            Ok((WriteBack::Put(V::from_counter(new)), new))
        })
    }

    // == Decrement ==
    /// Subtracts `amount` from the integer at `key`, treating absent as zero.
    pub fn decrement(&self, key: &str, amount: i64) -> Result<i64> {
        let negated = amount
            .checked_neg()
            .ok_or_else(|| CacheError::Overflow(key.to_string()))?;
        self.increment(key, negated)
    }
}
