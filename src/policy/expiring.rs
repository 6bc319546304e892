//! CLOCK cache with per-entry time-to-live and lazy expiration.
//!
//! Structurally identical to [`ClockCache`](crate::policy::clock::ClockCache)
//! with one addition: every entry carries an absolute expiry instant,
//! computed from a per-insert TTL or the cache-wide default. An entry past
//! its expiry is *logically* absent — `get`, `contains`, and `peek` report
//! a miss — but stays *physically* present, occupying its slot and index
//! entry, until the eviction sweep recycles the slot or the same key is
//! inserted again.
//!
//! A `get` that finds an expired entry clears the slot's reference bit as
//! a hint, making that slot an early victim for the next sweep. Nothing
//! scans for expired entries in the background; reclamation is entirely
//! lazy.
//!
//! ```text
//! get(key):
//!   index hit, now <  expires_at  → mark slot, return value
//!   index hit, now >= expires_at  → unmark slot, report miss, keep entry
//!   index miss                    → miss
//! ```

use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::ds::ClockRing;
use crate::error::ConfigError;
#[cfg(feature = "metrics")]
use crate::metrics::ClockMetrics;
use crate::traits::{CoreCache, MutableCache};

#[cfg(feature = "concurrency")]
use std::sync::Arc;
#[cfg(all(feature = "concurrency", feature = "metrics"))]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "concurrency")]
use parking_lot::RwLock;

#[cfg(feature = "concurrency")]
use crate::traits::ConcurrentCache;

#[derive(Debug)]
struct ExpiringEntry<V> {
    position: usize,
    value: V,
    expires_at: Instant,
}

impl<V> ExpiringEntry<V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Fixed-capacity CLOCK cache whose entries expire after a time-to-live.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use clockkit::policy::expiring::ExpiringClockCache;
///
/// let mut cache = ExpiringClockCache::new(8, Duration::from_secs(300));
/// cache.insert("session", "token");
/// assert_eq!(cache.get(&"session"), Some(&"token"));
///
/// // A zero TTL expires immediately: logically gone, slot still occupied.
/// cache.insert_with_ttl("flash", "gone", Duration::ZERO);
/// assert_eq!(cache.get(&"flash"), None);
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Debug)]
pub struct ExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    ring: ClockRing<K>,
    index: FxHashMap<K, ExpiringEntry<V>>,
    default_ttl: Duration,
    #[cfg(feature = "metrics")]
    metrics: ClockMetrics,
}

impl<K, V> ExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache with `capacity` slots and a default TTL applied by
    /// [`insert`](Self::insert).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for a
    /// non-panicking alternative.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        match Self::try_new(capacity, default_ttl) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a cache, rejecting invalid capacities.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    pub fn try_new(capacity: usize, default_ttl: Duration) -> Result<Self, ConfigError> {
        if capacity < 1 {
            return Err(ConfigError::InvalidCapacity { got: capacity });
        }
        Ok(Self {
            ring: ClockRing::new(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            default_ttl,
            #[cfg(feature = "metrics")]
            metrics: ClockMetrics::default(),
        })
    }

    /// Returns the fixed slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the TTL applied when no per-insert TTL is given.
    #[inline]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the number of occupied slots.
    ///
    /// Expired entries count until their slot is recycled: physical
    /// occupancy is what bounds capacity, not logical liveness.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no slots are occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is cached and not yet expired. Does not
    /// touch the reference bit.
    pub fn contains(&self, key: &K) -> bool {
        self.index
            .get(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Returns `key`'s unexpired value without marking its slot.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let entry = self.index.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(&entry.value)
    }

    /// Returns `key`'s value and marks its slot recently referenced.
    ///
    /// An expired hit reports a miss, clears the slot's reference bit so
    /// the sweep reclaims it early, and leaves the entry in place.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = Instant::now();
        match self.index.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.ring.unmark(entry.position);
                #[cfg(feature = "metrics")]
                {
                    self.metrics.misses += 1;
                    self.metrics.expired_misses += 1;
                }
                None
            },
            Some(entry) => {
                self.ring.mark(entry.position);
                #[cfg(feature = "metrics")]
                {
                    self.metrics.hits += 1;
                }
                Some(&entry.value)
            },
            None => {
                #[cfg(feature = "metrics")]
                {
                    self.metrics.misses += 1;
                }
                None
            },
        }
    }

    /// Lookup for the shared-lock read path; see
    /// [`ClockCache::get_shared`](crate::policy::clock::ClockCache::get_shared).
    pub fn get_shared(&self, key: &K) -> Option<&V> {
        let entry = self.index.get(key)?;
        if entry.is_expired(Instant::now()) {
            self.ring.unmark(entry.position);
            return None;
        }
        self.ring.mark(entry.position);
        Some(&entry.value)
    }

    /// Inserts `key` → `value` expiring after the default TTL.
    ///
    /// Returns the previous value if the key was cached, whether or not it
    /// had already expired.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_with_ttl(key, value, self.default_ttl)
    }

    /// Inserts `key` → `value` expiring after `ttl`.
    ///
    /// Same structural behavior as the non-expiring cache: an existing key
    /// (expired or not) is refreshed in place with a new expiry and marked
    /// referenced; a fresh key sweeps for a victim slot.
    pub fn insert_with_ttl(&mut self, key: K, value: V, ttl: Duration) -> Option<V> {
        let expires_at = Instant::now() + ttl;

        if let Some(entry) = self.index.get_mut(&key) {
            let old = std::mem::replace(&mut entry.value, value);
            entry.expires_at = expires_at;
            self.ring.mark(entry.position);
            #[cfg(feature = "metrics")]
            {
                self.metrics.updates += 1;
            }
            return Some(old);
        }

        let (pos, displaced) = self.ring.sweep();
        if let Some(old_key) = displaced {
            let removed = self.index.remove(&old_key);
            #[cfg(feature = "metrics")]
            if removed.is_some() {
                self.metrics.evictions += 1;
            }
            let _ = removed;
        }
        self.ring.install(pos, key.clone());
        self.index.insert(
            key,
            ExpiringEntry {
                position: pos,
                value,
                expires_at,
            },
        );
        #[cfg(feature = "metrics")]
        {
            self.metrics.inserts += 1;
        }
        None
    }

    /// Removes `key`, freeing its slot; returns the stored value even if
    /// it had expired. No-op on an absent key.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.index.remove(key)?;
        self.ring.free(entry.position);
        Some(entry.value)
    }

    /// Resets ring, index, and hand. Capacity and default TTL are kept.
    pub fn clear(&mut self) {
        self.ring.reset();
        self.index.clear();
    }

    /// Returns accumulated operation counters.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> &ClockMetrics {
        &self.metrics
    }

    /// Resets operation counters to zero.
    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&mut self) {
        self.metrics = ClockMetrics::default();
    }

    #[cfg(any(test, debug_assertions))]
    /// Asserts the ring/index cross-invariants; expired entries still
    /// claim their slot.
    pub fn debug_validate_invariants(&self) {
        assert!(self.index.len() <= self.capacity());
        assert_eq!(self.ring.occupied(), self.index.len());
        self.ring.debug_validate();
        for (key, entry) in &self.index {
            assert!(entry.position < self.capacity());
            assert!(
                self.ring.key_at(entry.position) == Some(key),
                "index entry points at a slot holding a different key"
            );
        }
    }
}

impl<K, V> CoreCache<K, V> for ExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        ExpiringClockCache::insert(self, key, value)
    }

    #[inline]
    fn get(&mut self, key: &K) -> Option<&V> {
        ExpiringClockCache::get(self, key)
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        ExpiringClockCache::contains(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        ExpiringClockCache::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        ExpiringClockCache::capacity(self)
    }

    fn clear(&mut self) {
        ExpiringClockCache::clear(self);
    }
}

impl<K, V> MutableCache<K, V> for ExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        ExpiringClockCache::remove(self, key)
    }
}

// ---------------------------------------------------------------------------
// Concurrent wrapper
// ---------------------------------------------------------------------------

#[cfg(feature = "concurrency")]
#[derive(Debug)]
struct Shared<K, V>
where
    K: Clone + Eq + Hash,
{
    core: RwLock<ExpiringClockCache<K, V>>,
    #[cfg(feature = "metrics")]
    read_hits: AtomicU64,
    #[cfg(feature = "metrics")]
    read_misses: AtomicU64,
}

/// Thread-safe expiring CLOCK cache; same locking discipline as
/// [`ConcurrentClockCache`](crate::policy::clock::ConcurrentClockCache).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use clockkit::policy::expiring::ConcurrentExpiringClockCache;
///
/// let cache = ConcurrentExpiringClockCache::new(32, Duration::from_secs(60));
/// cache.insert("k", 1);
/// assert_eq!(cache.get(&"k"), Some(1));
/// ```
#[cfg(feature = "concurrency")]
#[derive(Debug)]
pub struct ConcurrentExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    shared: Arc<Shared<K, V>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> Clone for ConcurrentExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a concurrent expiring cache.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for a
    /// non-panicking alternative.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        match Self::try_new(capacity, default_ttl) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a concurrent expiring cache, rejecting invalid capacities.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    pub fn try_new(capacity: usize, default_ttl: Duration) -> Result<Self, ConfigError> {
        let core = ExpiringClockCache::try_new(capacity, default_ttl)?;
        Ok(Self {
            shared: Arc::new(Shared {
                core: RwLock::new(core),
                #[cfg(feature = "metrics")]
                read_hits: AtomicU64::new(0),
                #[cfg(feature = "metrics")]
                read_misses: AtomicU64::new(0),
            }),
        })
    }

    /// Inserts with the default TTL under the write lock.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shared.core.write().insert(key, value)
    }

    /// Inserts with an explicit TTL under the write lock.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) -> Option<V> {
        self.shared.core.write().insert_with_ttl(key, value, ttl)
    }

    /// Gets a cloned unexpired value under a read lock, marking the slot.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Gets an unexpired value under a read lock and applies `f` inside
    /// the lock.
    pub fn get_with<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        let guard = self.shared.core.read();
        let result = guard.get_shared(key);

        #[cfg(feature = "metrics")]
        {
            if result.is_some() {
                self.shared.read_hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.shared.read_misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        result.map(f)
    }

    /// Returns a cloned unexpired value without marking the slot.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shared.core.read().peek(key).cloned()
    }

    /// Returns `true` if `key` is cached and not yet expired.
    pub fn contains(&self, key: &K) -> bool {
        self.shared.core.read().contains(key)
    }

    /// Removes `key` under the write lock; no-op if absent.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shared.core.write().remove(key)
    }

    /// Resets the cache under the write lock.
    pub fn clear(&self) {
        self.shared.core.write().clear();
    }

    /// Returns the number of occupied slots (expired entries included).
    pub fn len(&self) -> usize {
        self.shared.core.read().len()
    }

    /// Returns `true` if no slots are occupied.
    pub fn is_empty(&self) -> bool {
        self.shared.core.read().is_empty()
    }

    /// Returns the fixed slot capacity.
    pub fn capacity(&self) -> usize {
        self.shared.core.read().capacity()
    }

    /// Returns the TTL applied when no per-insert TTL is given.
    pub fn default_ttl(&self) -> Duration {
        self.shared.core.read().default_ttl()
    }

    /// Returns merged counters (core write path + wrapper read path).
    ///
    /// Expired hits observed on the read path are counted as plain misses;
    /// `expired_misses` only tracks the exclusive-access path.
    #[cfg(feature = "metrics")]
    pub fn metrics(&self) -> ClockMetrics {
        let mut m = self.shared.core.read().metrics().clone();
        m.hits += self.shared.read_hits.load(Ordering::Relaxed);
        m.misses += self.shared.read_misses.load(Ordering::Relaxed);
        m
    }

    /// Resets core and read-path counters to zero.
    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&self) {
        self.shared.core.write().reset_metrics();
        self.shared.read_hits.store(0, Ordering::Relaxed);
        self.shared.read_misses.store(0, Ordering::Relaxed);
    }

    #[cfg(any(test, debug_assertions))]
    /// Validates ring/index invariants under a read lock.
    pub fn debug_validate_invariants(&self) {
        self.shared.core.read().debug_validate_invariants();
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentCache for ConcurrentExpiringClockCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Occupancy never exceeds capacity even with expired entries.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_len_within_capacity(
            capacity in 1usize..32,
            ops in prop::collection::vec((0u8..32, 0u32..1000, prop::bool::ANY), 0..150)
        ) {
            let mut cache = ExpiringClockCache::new(capacity, Duration::from_secs(3600));
            for (key, value, expired) in ops {
                if expired {
                    cache.insert_with_ttl(key, value, Duration::ZERO);
                } else {
                    cache.insert(key, value);
                }
                prop_assert!(cache.len() <= cache.capacity());
            }
            cache.debug_validate_invariants();
        }

        /// A zero-TTL entry is never observable through the read API.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_expired_entries_are_invisible(
            capacity in 1usize..16,
            keys in prop::collection::vec(0u8..16, 1..50)
        ) {
            let mut cache = ExpiringClockCache::new(capacity, Duration::ZERO);
            for &key in &keys {
                cache.insert(key, key as u32);
            }
            for &key in &keys {
                prop_assert_eq!(cache.get(&key), None);
                prop_assert!(!cache.contains(&key));
                prop_assert_eq!(cache.peek(&key), None);
            }
            cache.debug_validate_invariants();
        }
    }
}
