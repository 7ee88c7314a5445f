//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from a store.
//! Expiry is also enforced lazily on access; the sweep only bounds how long
//! dead entries occupy memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that purges expired entries from `store`
/// every `interval`.
///
/// # Arguments
/// * `store` - shared reference to the store to sweep
/// * `interval` - time between sweeps
/// * `name` - store name used in log lines
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.limits.clone(), Duration::from_secs(1), "rate_limits");
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(
    store: Arc<CacheStore<V>>,
    interval: Duration,
    name: &'static str,
) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep for {} every {:?}",
            name, interval
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = store.purge_expired();
            if removed > 0 {
                info!("Expiry sweep ({}): removed {} expired entries", name, removed);
            } else {
                debug!("Expiry sweep ({}): no expired entries found", name);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EvictionPolicy, ManualClock};

    fn ttl_store(clock: Arc<ManualClock>) -> Arc<CacheStore<String>> {
        Arc::new(
            CacheStore::with_clock(
                100,
                EvictionPolicy::CapacityTtl {
                    ttl: Duration::from_secs(10),
                },
                clock,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let store = ttl_store(clock.clone());
        store.set("expire_soon", "value".to_string());
        clock.advance(Duration::from_secs(11));

        let handle = spawn_cleanup_task(store.clone(), Duration::from_millis(20), "test");
        tokio::time::sleep(Duration::from_millis(150)).await;

        let stats = store.stats();
        assert_eq!(stats.total_entries, 0, "Expired entry should have been swept");
        assert_eq!(stats.expirations, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let store = ttl_store(clock.clone());
        store.set("long_lived", "value".to_string());
        clock.advance(Duration::from_secs(5));

        let handle = spawn_cleanup_task(store.clone(), Duration::from_millis(20), "test");
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get("long_lived"), Some("value".to_string()));
        assert_eq!(store.stats().expirations, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let store = ttl_store(Arc::new(ManualClock::new(0)));

        let handle = spawn_cleanup_task(store, Duration::from_secs(1), "test");
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
