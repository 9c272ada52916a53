//! Bounded TTL cache with first-in-first-out eviction
//!
//! Eviction follows insertion order only. Reading an entry does not protect
//! it: once the bound is exceeded, the oldest-inserted key goes first even if
//! it was read a moment ago. This is FIFO, not LRU; switching to LRU would
//! change which answers survive under load and is left as a deliberate
//! future decision.

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::{key_preview, CacheCounters, CacheKey, CacheSnapshot, EntryPreview, EvictionReason},
};
use crate::error::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// In-memory cache with a maximum entry count and lazy TTL expiry
///
/// Keys are expected to be normalized already (see
/// [`normalize_key`](crate::cache::normalize_key)). Expired entries are only
/// removed when read; there is no background sweep.
///
/// The internal mutex is never held across an `.await`, so every operation
/// is atomic with respect to every other.
pub struct BoundedTtlCache<V> {
    /// Name used in log lines
    name: &'static str,

    /// Cache configuration
    config: CacheConfig,

    /// Internal storage
    store: Mutex<CacheStore<V>>,
}

/// Internal cache storage
struct CacheStore<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// Keys in the order they were first inserted
    insertion_order: VecDeque<CacheKey>,

    /// Hit, miss and eviction counters
    counters: CacheCounters,
}

impl<V> CacheStore<V> {
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.insertion_order.retain(|k| k != key);
        Some(entry)
    }
}

impl<V: Clone> BoundedTtlCache<V> {
    /// Create a new cache with the given configuration
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        info!(
            cache = name,
            ttl_secs = config.ttl.as_secs(),
            max_entries = config.max_entries,
            "Initializing bounded TTL cache"
        );

        Self {
            name,
            config,
            store: Mutex::new(CacheStore {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
                counters: CacheCounters::default(),
            }),
        }
    }

    /// Create a cache after validating its configuration
    pub fn try_new(name: &'static str, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(name, config))
    }

    /// Get a value from the cache
    ///
    /// An entry whose age has reached the TTL is removed and reported as a
    /// miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut store = self.lock();

        let expired = match store.entries.get(key) {
            None => {
                store.counters.misses += 1;
                debug!(cache = self.name, key, "Cache miss");
                return None;
            }
            Some(entry) => entry.is_expired(self.config.ttl),
        };

        if expired {
            store.remove_entry(key);
            store.counters.misses += 1;
            store.counters.evictions_ttl += 1;
            debug!(cache = self.name, key, reason = %EvictionReason::Expired, "Cache entry evicted");
            return None;
        }

        store.counters.hits += 1;
        debug!(cache = self.name, key, "Cache hit");
        store.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or overwrite a value
    ///
    /// Overwriting a key keeps its original place in the eviction order.
    /// After insertion the oldest-inserted entries are dropped until the size
    /// bound holds again.
    pub fn set(&self, key: CacheKey, value: V) {
        let mut store = self.lock();
        let entry = CacheEntry::new(value);

        if let Some(existing) = store.entries.get_mut(&key) {
            debug!(cache = self.name, key = %key, "Overwriting cache entry");
            *existing = entry;
        } else {
            debug!(cache = self.name, key = %key, "Inserting cache entry");
            store.insertion_order.push_back(key.clone());
            store.entries.insert(key, entry);
        }

        while store.entries.len() > self.config.max_entries {
            let Some(oldest) = store.insertion_order.pop_front() else {
                break;
            };
            store.entries.remove(&oldest);
            store.counters.evictions_fifo += 1;
            debug!(
                cache = self.name,
                key = %oldest,
                reason = %EvictionReason::CapacityExceeded,
                "Cache entry evicted"
            );
        }
    }

    /// Diagnostic snapshot; does not expire or reorder anything
    pub fn stats(&self) -> CacheSnapshot {
        let store = self.lock();

        let entries = store
            .insertion_order
            .iter()
            .filter_map(|key| {
                store.entries.get(key).map(|entry| EntryPreview {
                    key_preview: key_preview(key),
                    age_seconds: entry.age().as_secs(),
                })
            })
            .collect();

        CacheSnapshot {
            size: store.entries.len(),
            max_size: self.config.max_entries,
            ttl_seconds: self.config.ttl.as_secs(),
            counters: store.counters,
            entries,
        }
    }

    /// Check if a key is stored, expired or not, without touching counters
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Remove every entry, returning how many were dropped
    pub fn clear(&self) -> usize {
        let mut store = self.lock();

        let count = store.entries.len();
        store.entries.clear();
        store.insertion_order.clear();

        info!(cache = self.name, count, reason = %EvictionReason::Cleared, "Cleared cache");
        count
    }

    /// Get number of entries in cache
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore<V>> {
        // a panic mid-operation cannot leave the map half-written, so keep serving
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> std::fmt::Debug for BoundedTtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedTtlCache")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn small_cache(max_entries: usize) -> BoundedTtlCache<String> {
        let config = CacheConfig::builder()
            .ttl(Duration::from_secs(60))
            .max_entries(max_entries)
            .build();
        BoundedTtlCache::new("test", config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_basic_set_and_get() {
        let cache = small_cache(100);

        cache.set("key1".to_string(), "value1".to_string());

        assert_eq!(cache.get("key1"), Some("value1".to_string()));

        let stats = cache.stats();
        assert_eq!(stats.counters.hits, 1);
        assert_eq!(stats.counters.misses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_miss() {
        let cache = small_cache(100);

        assert_eq!(cache.get("nonexistent"), None);
        assert_eq!(cache.stats().counters.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiration_is_lazy() {
        let cache = small_cache(100);
        cache.set("key1".to_string(), "value1".to_string());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("key1").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        // still stored until someone reads it
        assert!(cache.contains_key("key1"));

        assert!(cache.get("key1").is_none());
        assert!(!cache.contains_key("key1"));

        let stats = cache.stats();
        assert_eq!(stats.counters.evictions_ttl, 1);
        assert_eq!(stats.size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_eviction_ignores_reads() {
        let cache = small_cache(3);

        cache.set("key1".to_string(), "value1".to_string());
        cache.set("key2".to_string(), "value2".to_string());
        cache.set("key3".to_string(), "value3".to_string());

        // reading key1 would save it under LRU, not under FIFO
        assert!(cache.get("key1").is_some());

        cache.set("key4".to_string(), "value4".to_string());

        assert_eq!(cache.len(), 3);
        assert!(cache.get("key1").is_none());
        assert!(cache.get("key2").is_some());
        assert!(cache.get("key3").is_some());
        assert!(cache.get("key4").is_some());
        assert_eq!(cache.stats().counters.evictions_fifo, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_keeps_insertion_position() {
        let cache = small_cache(2);

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.set("a".to_string(), "updated".to_string());
        assert_eq!(cache.len(), 2);

        cache.set("c".to_string(), "3".to_string());

        assert!(!cache.contains_key("a"));
        assert_eq!(cache.get("b"), Some("2".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_ttl() {
        let cache = small_cache(10);

        cache.set("a".to_string(), "old".to_string());
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set("a".to_string(), "new".to_string());
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.get("a"), Some("new".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_then_restored_moves_to_back() {
        let cache = small_cache(2);

        cache.set("a".to_string(), "1".to_string());
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.get("a").is_none());

        cache.set("b".to_string(), "2".to_string());
        cache.set("a".to_string(), "1".to_string());
        cache.set("c".to_string(), "3".to_string());

        assert!(!cache.contains_key("b"));
        assert!(cache.contains_key("a"));
        assert!(cache.contains_key("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_has_no_side_effects() {
        let cache = small_cache(10);
        cache.set("first".to_string(), "1".to_string());
        tokio::time::advance(Duration::from_secs(90)).await;
        cache.set("second".to_string(), "2".to_string());

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 10);
        assert_eq!(stats.ttl_seconds, 60);
        assert_eq!(stats.entries[0].key_preview, "first");
        assert_eq!(stats.entries[0].age_seconds, 90);
        assert_eq!(stats.entries[1].key_preview, "second");
        assert_eq!(stats.entries[1].age_seconds, 0);

        // the expired entry is still there and nothing was counted
        assert_eq!(cache.stats().size, 2);
        assert_eq!(stats.counters, CacheCounters::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear() {
        let cache = small_cache(10);
        cache.set("key1".to_string(), "value1".to_string());
        cache.set("key2".to_string(), "value2".to_string());

        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_try_new_rejects_zero_bound() {
        let config = CacheConfig::builder().max_entries(0).build();
        assert!(BoundedTtlCache::<String>::try_new("bad", config).is_err());
    }
}
