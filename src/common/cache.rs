//! Bounded in-memory key-value cache.
//!
//! Backs the mem local store, the tool catalog and the in-process workflow service.

use moka::sync::Cache;

/// Thread-safe in-memory cache with configurable capacity.
///
/// Entries past `capacity` are evicted by moka's TinyLFU policy, so callers must
/// size it for the working set they expect to read back.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Allocate a new [`MemCache`].
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity as u64),
        }
    }

    /// Insert or overwrite an entry.
    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    /// Get a copy of the entry stored under `key`.
    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    /// Remove the entry stored under `key`, returning it.
    pub fn remove(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.remove(key)
    }

    /// Snapshot of the current keys.
    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|(k, _)| (*k).clone()).collect()
    }
}
