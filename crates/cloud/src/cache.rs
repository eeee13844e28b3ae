//! LRU cache for downloaded rasters, keyed by asset href.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

/// Thread-safe LRU cache of shared values.
pub struct AssetCache<V> {
    inner: Mutex<LruCache<String, Arc<V>>>,
}

impl<V> AssetCache<V> {
    /// Create a cache holding up to `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, value: Arc<V>) {
        self.lock().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Arc<V>>> {
        // A panic while holding the lock leaves the cache itself consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_insert_get() {
        let cache = AssetCache::new(2);
        cache.insert("a.tif".into(), Arc::new(vec![1, 2, 3]));
        assert_eq!(cache.get("a.tif").as_deref(), Some(&vec![1, 2, 3]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_eviction() {
        let cache = AssetCache::new(2);
        cache.insert("a".into(), Arc::new(1));
        cache.insert("b".into(), Arc::new(2));
        cache.insert("c".into(), Arc::new(3)); // evicts a

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }
}
