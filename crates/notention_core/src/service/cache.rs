//! Bounded per-session cache.
//!
//! Owned by the component that uses it and dropped with it; nothing here is
//! process-global.

use lru::LruCache;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Least-recently-used cache keyed by string.
#[derive(Debug)]
pub struct SessionCache<V> {
    entries: LruCache<String, V>,
    stats: CacheStats,
}

impl<V> SessionCache<V> {
    /// Creates a cache; a zero capacity holds one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            stats: CacheStats::default(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&V> {
        let value = self.entries.get(key);
        if value.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        value
    }

    /// Returns the cached value, computing and storing it on a miss.
    pub fn get_or_insert_with(&mut self, key: &str, compute: impl FnOnce() -> V) -> &V {
        if self.entries.contains(key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        self.entries.get_or_insert(key.to_string(), compute)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.put(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.pop(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
