//! Cache trait seam.
//!
//! A small hierarchy shared by both engine variants so callers (the
//! memoization adapter, tests, generic warm-up helpers) can stay agnostic
//! about whether entries expire:
//!
//! | Trait             | Extends       | Purpose                          |
//! |-------------------|---------------|----------------------------------|
//! | `CoreCache`       | -             | get/insert/contains/len/clear    |
//! | `MutableCache`    | `CoreCache`   | arbitrary key removal            |
//! | `ConcurrentCache` | `Send + Sync` | marker for thread-safe wrappers  |
//!
//! Implementations require `K: Clone + Eq + Hash` (a key lives both in its
//! ring slot and in the index); value types are opaque to the engine.

/// Core operations every cache variant supports.
///
/// # Example
///
/// ```
/// use clockkit::traits::CoreCache;
/// use clockkit::policy::clock::ClockCache;
///
/// fn warm<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let mut cache = ClockCache::new(16);
/// warm(&mut cache, &[(1, "one".into()), (2, "two".into())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts a key-value pair, returning the previous value if the key
    /// was already cached.
    ///
    /// A fresh key may displace one existing entry according to the CLOCK
    /// sweep; refreshing an existing key never does.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Gets a reference to the value for `key`, marking its slot as
    /// recently referenced.
    ///
    /// A miss (or, for expiring caches, an expired hit) returns `None`.
    /// Use [`contains`](Self::contains) to probe without the side effect.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Returns `true` if `key` is live, without touching its reference bit.
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of entries currently occupying slots.
    fn len(&self) -> usize;

    /// Returns `true` if no slots are occupied.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed slot capacity.
    fn capacity(&self) -> usize;

    /// Resets the cache to its freshly constructed state, preserving
    /// capacity.
    fn clear(&mut self);
}

/// Caches supporting arbitrary key-based invalidation.
///
/// # Example
///
/// ```
/// use clockkit::traits::{CoreCache, MutableCache};
/// use clockkit::policy::clock::ClockCache;
///
/// let mut cache = ClockCache::new(8);
/// cache.insert("a", 1);
/// assert_eq!(cache.remove(&"a"), Some(1));
/// assert_eq!(cache.remove(&"a"), None); // absence is not an error
/// ```
pub trait MutableCache<K, V>: CoreCache<K, V> {
    /// Removes `key`, returning its value if it was cached.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes several keys, returning the removed values in input order.
    fn remove_batch(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|k| self.remove(k)).collect()
    }
}

/// Marker trait for caches that are safe to share across threads.
///
/// Implemented by the `Concurrent*` wrappers, whose `&self` methods
/// synchronize internally.
pub trait ConcurrentCache: Send + Sync {}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapCache {
        data: Vec<(u32, u32)>,
        capacity: usize,
    }

    impl CoreCache<u32, u32> for MapCache {
        fn insert(&mut self, key: u32, value: u32) -> Option<u32> {
            if let Some((_, v)) = self.data.iter_mut().find(|(k, _)| *k == key) {
                return Some(std::mem::replace(v, value));
            }
            if self.data.len() >= self.capacity {
                self.data.remove(0);
            }
            self.data.push((key, value));
            None
        }

        fn get(&mut self, key: &u32) -> Option<&u32> {
            self.data.iter().find(|(k, _)| k == key).map(|(_, v)| v)
        }

        fn contains(&self, key: &u32) -> bool {
            self.data.iter().any(|(k, _)| k == key)
        }

        fn len(&self) -> usize {
            self.data.len()
        }

        fn capacity(&self) -> usize {
            self.capacity
        }

        fn clear(&mut self) {
            self.data.clear();
        }
    }

    impl MutableCache<u32, u32> for MapCache {
        fn remove(&mut self, key: &u32) -> Option<u32> {
            let idx = self.data.iter().position(|(k, _)| k == key)?;
            Some(self.data.remove(idx).1)
        }
    }

    #[test]
    fn default_is_empty_tracks_len() {
        let mut cache = MapCache {
            data: Vec::new(),
            capacity: 2,
        };
        assert!(cache.is_empty());
        cache.insert(1, 10);
        assert!(!cache.is_empty());
    }

    #[test]
    fn default_remove_batch_preserves_order() {
        let mut cache = MapCache {
            data: Vec::new(),
            capacity: 4,
        };
        cache.insert(1, 10);
        cache.insert(2, 20);
        cache.insert(3, 30);
        let removed = cache.remove_batch(&[1, 99, 3]);
        assert_eq!(removed, vec![Some(10), None, Some(30)]);
        assert_eq!(cache.len(), 1);
    }
}
