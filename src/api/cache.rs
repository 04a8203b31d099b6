// src/api/cache.rs
//! In-memory response cache with TTL-based expiry.
//!
//! Entries are kept in insertion order. When the cache is full the oldest
//! inserted entry goes first; reads never reorder anything, so this is a
//! FIFO bound rather than an LRU. Cache operations never fail.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) <= self.ttl
    }
}

/// Bounded TTL cache keyed by request signature.
pub struct TtlCache<V> {
    entries: Mutex<IndexMap<String, CacheEntry<V>>>,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Returns the cached value if present and not expired.
    ///
    /// An expired entry is removed by the read that finds it.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        match entries.get(key) {
            None => return None,
            Some(entry) if entry.is_valid(now) => return Some(entry.value.clone()),
            Some(_) => {}
        }

        entries.shift_remove(key);
        log::debug!("Cache entry expired: {}", key);
        None
    }

    /// Stores `value` under `key`, replacing any previous entry whole.
    ///
    /// A replaced key counts as a fresh insertion for eviction order.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }

        let key = key.into();
        let mut entries = self.entries.lock();

        if entries.shift_remove(&key).is_none() && entries.len() >= self.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                log::debug!("Cache full ({}), evicted oldest: {}", self.capacity, evicted);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }
}

impl<V> TtlCache<V> {
    /// Removes `key`; returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().shift_remove(key).is_some()
    }

    /// Empties the whole cache.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Removes every expired entry and returns how many went.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether `key` holds a live entry. Does not evict.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .is_some_and(|entry| entry.is_valid(now))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Send + 'static> TtlCache<V> {
    /// Starts a background task that sweeps the cache every `every`.
    ///
    /// The task ends when `shutdown` is cancelled, when the cache is dropped,
    /// or when the returned handle is dropped. Returns `None` outside a
    /// tokio runtime or for a zero interval.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> Option<SweepHandle> {
        if every.is_zero() {
            return None;
        }
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let cache = Arc::downgrade(self);

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        let removed = cache.sweep();
                        if removed > 0 {
                            log::debug!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                }
            }
            log::debug!("Cache sweeper stopped");
        });

        Some(SweepHandle { task })
    }
}

/// Owns the sweeper task; dropping it stops the sweeper.
#[derive(Debug)]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn returns_values_until_ttl_elapses() {
        let cache = TtlCache::new(10);
        cache.set("posts?page=1", 1u32, MINUTE);

        tokio::time::advance(MINUTE).await;
        assert_eq!(cache.get("posts?page=1"), Some(1));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("posts?page=1"), None);
        // The expired read evicted the entry.
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_oldest_inserted_entry_when_full() {
        let cache = TtlCache::new(2);
        cache.set("a", "a", MINUTE);
        cache.set("b", "b", MINUTE);

        // Reading does not refresh position.
        assert_eq!(cache.get("a"), Some("a"));

        cache.set("c", "c", MINUTE);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_key_does_not_evict_and_moves_it_to_newest() {
        let cache = TtlCache::new(2);
        cache.set("a", 1, MINUTE);
        cache.set("b", 2, MINUTE);
        cache.set("a", 3, MINUTE);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(3));

        cache.set("c", 4, MINUTE);
        assert!(!cache.contains("b"));
        assert!(cache.contains("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn replacement_resets_the_ttl() {
        let cache = TtlCache::new(4);
        cache.set("k", 1, MINUTE);
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set("k", 2, MINUTE);
        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_and_clear() {
        let cache = TtlCache::new(4);
        cache.set("a", 1, MINUTE);
        cache.set("b", 2, MINUTE);

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = TtlCache::new(0);
        cache.set("a", 1, MINUTE);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let cache = TtlCache::new(4);
        cache.set("short", 1, Duration::from_secs(5));
        cache.set("long", 2, MINUTE);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("long"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_on_its_interval_and_stops_on_cancel() {
        let cache = Arc::new(TtlCache::new(4));
        let shutdown = CancellationToken::new();
        let handle = cache
            .spawn_sweeper(MINUTE, shutdown.clone())
            .expect("runtime is available");

        cache.set("never-read", 1, Duration::from_secs(10));
        tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;
        assert_eq!(cache.len(), 0);

        shutdown.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_finished());
    }

    #[test]
    fn sweeper_needs_a_runtime() {
        let cache = Arc::new(TtlCache::<u8>::new(1));
        assert!(cache
            .spawn_sweeper(MINUTE, CancellationToken::new())
            .is_none());
    }
}
