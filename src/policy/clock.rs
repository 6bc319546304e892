//! Capacity-bounded CLOCK (second-chance) cache.
//!
//! Pairs a [`ClockRing`] (fixed slot array + atomic reference bits + hand)
//! with a key index mapping each live key to its slot position and value.
//! Recency is approximate: a hit sets one bit instead of moving a list
//! node, and the eviction sweep grants every referenced slot a second
//! chance before choosing a victim.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ClockCache<K, V>                          │
//! │                                                                  │
//! │  index: FxHashMap<K, IndexEntry>     ring: ClockRing<K>          │
//! │  ┌───────┬──────────────┐             [0]   [1]   [2]   [3]      │
//! │  │  "a"  │ pos 0, v_a   │──┐         ┌───┐ ┌───┐ ┌───┐ ┌───┐     │
//! │  │  "b"  │ pos 1, v_b   │──┼────────►│ a │ │ b │ │ c │ │   │     │
//! │  │  "c"  │ pos 2, v_c   │──┘         │ 1 │ │ 0 │ │ 1 │ │ 0 │     │
//! │  └───────┴──────────────┘            └───┘ └───┘ └───┘ └───┘     │
//! │                                              ▲                   │
//! │  invariant: ring slot at entry.position      └─ hand             │
//! │  holds exactly that entry's key                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! ```text
//! GET(key):     index hit → set ref bit → return value        O(1)
//! INSERT(key):  existing  → refresh value in place, set bit   O(1)
//!               fresh     → sweep for victim, displace its
//!                           index entry, install key, hand+1  O(1) amort.
//! REMOVE(key):  drop index entry, free slot, clear bit        O(1)
//! ```
//!
//! ## Thread safety
//!
//! [`ClockCache`] itself is single-threaded (`&mut self`). The
//! [`ConcurrentClockCache`] wrapper (feature `concurrency`) shares one core
//! behind a `parking_lot::RwLock`: structural mutations take the write
//! lock, while lookups take the **read** lock and set reference bits
//! through relaxed atomics, so readers proceed in parallel and only
//! perturb eviction order, never the ring/index invariant.

use std::hash::Hash;

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
struct IndexEntry<V> {
    position: usize,
    value: V,
}

/// Fixed-capacity cache evicting by the CLOCK second-chance algorithm.
///
/// # Example
///
/// ```
/// use clockkit::policy::clock::ClockCache;
///
/// let mut cache = ClockCache::new(3);
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// cache.insert("c", 3);
/// cache.insert("d", 4); // full: the sweep evicts "a"
///
/// // A hit marks "b" referenced, so the next eviction passes it over
/// // and takes the un-accessed "c" instead.
/// assert_eq!(cache.get(&"b"), Some(&2));
/// cache.insert("e", 5);
///
/// assert!(cache.contains(&"b"));
/// assert!(!cache.contains(&"c"));
/// ```
#[derive(Debug)]
pub struct ClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    ring: ClockRing<K>,
    index: FxHashMap<K, IndexEntry<V>>,
    #[cfg(feature = "metrics")]
    metrics: ClockMetrics,
}

impl<K, V> ClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a cache with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for a
    /// non-panicking alternative.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a cache with `capacity` slots, rejecting invalid capacities.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use clockkit::policy::clock::ClockCache;
    ///
    /// assert!(ClockCache::<u64, u64>::try_new(0).is_err());
    /// let cache = ClockCache::<u64, u64>::try_new(64).unwrap();
    /// assert_eq!(cache.capacity(), 64);
    /// ```
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity < 1 {
            return Err(ConfigError::InvalidCapacity { got: capacity });
        }
        Ok(Self {
            ring: ClockRing::new(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            #[cfg(feature = "metrics")]
            metrics: ClockMetrics::default(),
        })
    }

    /// Returns the fixed slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no slots are occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is cached. Does not touch the reference bit.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns `key`'s value without marking its slot referenced.
    ///
    /// Useful for monitoring without influencing eviction order.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|entry| &entry.value)
    }

    /// Returns `key`'s value and marks its slot recently referenced.
    ///
    /// The mark is observable only through future eviction decisions.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.index.get(key) {
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

    /// Lookup for the shared-lock read path: marks the reference bit
    /// through its atomic without requiring `&mut self`.
    ///
    /// Operation counters are not updated here; the concurrent wrapper
    /// accounts for its read path separately.
    pub fn get_shared(&self, key: &K) -> Option<&V> {
        let entry = self.index.get(key)?;
        self.ring.mark(entry.position);
        Some(&entry.value)
    }

    /// Inserts `key` → `value`, returning the previous value if the key
    /// was already cached.
    ///
    /// Refreshing an existing key updates its value in place and sets the
    /// reference bit; the ring does not move and nothing is evicted. A
    /// fresh key runs the eviction sweep, displaces the victim slot's
    /// index entry, and installs itself with the hand advanced past it.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(entry) = self.index.get_mut(&key) {
            let old = std::mem::replace(&mut entry.value, value);
            self.ring.mark(entry.position);
            #[cfg(feature = "metrics")]
            {
                self.metrics.updates += 1;
            }
            return Some(old);
        }

        let (pos, displaced) = self.ring.sweep();
        if let Some(old_key) = displaced {
            // Absence is tolerated: the occupant may have been invalidated
            // between sweeps.
            let removed = self.index.remove(&old_key);
            #[cfg(feature = "metrics")]
            if removed.is_some() {
                self.metrics.evictions += 1;
            }
            let _ = removed;
        }
        self.ring.install(pos, key.clone());
        self.index.insert(key, IndexEntry { position: pos, value });
        #[cfg(feature = "metrics")]
        {
            self.metrics.inserts += 1;
        }
        None
    }

    /// Removes `key`, freeing its slot and clearing the reference bit.
    ///
    /// Returns the removed value; `None` if the key was not cached, which
    /// is a normal outcome rather than an error.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.index.remove(key)?;
        self.ring.free(entry.position);
        Some(entry.value)
    }

    /// Resets ring, index, and hand to the freshly constructed state.
    /// Capacity is preserved.
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
    /// Asserts the ring/index cross-invariants:
    /// occupancy matches the index, every entry's slot holds its key, and
    /// the hand stays in bounds.
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

impl<K, V> CoreCache<K, V> for ClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        ClockCache::insert(self, key, value)
    }

    #[inline]
    fn get(&mut self, key: &K) -> Option<&V> {
        ClockCache::get(self, key)
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        ClockCache::contains(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        ClockCache::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        ClockCache::capacity(self)
    }

    fn clear(&mut self) {
        ClockCache::clear(self);
    }
}

impl<K, V> MutableCache<K, V> for ClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    #[inline]
    fn remove(&mut self, key: &K) -> Option<V> {
        ClockCache::remove(self, key)
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
    core: RwLock<ClockCache<K, V>>,
    #[cfg(feature = "metrics")]
    read_hits: AtomicU64,
    #[cfg(feature = "metrics")]
    read_misses: AtomicU64,
}

/// Thread-safe CLOCK cache sharing one core behind a `RwLock`.
///
/// Lookups (`get`, `get_with`, `peek`, `contains`) take a **read lock**
/// and mark reference bits atomically, so they run in parallel; structural
/// mutations (`insert`, `remove`, `clear`) take the write lock. Clones
/// share the same underlying cache.
///
/// # Example
///
/// ```
/// use std::thread;
/// use clockkit::policy::clock::ConcurrentClockCache;
///
/// let cache = ConcurrentClockCache::new(128);
/// cache.insert("answer", 42);
///
/// let reader = cache.clone();
/// thread::spawn(move || {
///     assert_eq!(reader.get(&"answer"), Some(42));
/// })
/// .join()
/// .unwrap();
/// ```
#[cfg(feature = "concurrency")]
#[derive(Debug)]
pub struct ConcurrentClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    shared: Arc<Shared<K, V>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> Clone for ConcurrentClockCache<K, V>
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
impl<K, V> ConcurrentClockCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a concurrent cache with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for a
    /// non-panicking alternative.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates a concurrent cache, rejecting invalid capacities.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        let core = ClockCache::try_new(capacity)?;
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

    /// Inserts a key-value pair under the write lock.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shared.core.write().insert(key, value)
    }

    /// Gets a cloned value under a read lock, marking the slot referenced.
    ///
    /// Requires `V: Clone`; for non-cloneable values use
    /// [`get_with`](Self::get_with).
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Gets a value under a read lock and applies `f` to it inside the
    /// lock, marking the slot referenced.
    ///
    /// # Example
    ///
    /// ```
    /// use clockkit::policy::clock::ConcurrentClockCache;
    ///
    /// let cache = ConcurrentClockCache::new(8);
    /// cache.insert("k", vec![1, 2, 3]);
    /// assert_eq!(cache.get_with(&"k", |v| v.len()), Some(3));
    /// ```
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

    /// Returns a cloned value without marking the slot referenced.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shared.core.read().peek(key).cloned()
    }

    /// Applies `f` to the value without marking or cloning.
    pub fn peek_with<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.shared.core.read().peek(key).map(f)
    }

    /// Returns `true` if `key` is cached.
    pub fn contains(&self, key: &K) -> bool {
        self.shared.core.read().contains(key)
    }

    /// Removes `key` under the write lock; no-op if absent.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shared.core.write().remove(key)
    }

    /// Removes several keys under one write lock acquisition.
    pub fn remove_batch(&self, keys: &[K]) -> Vec<Option<V>> {
        let mut core = self.shared.core.write();
        keys.iter().map(|k| core.remove(k)).collect()
    }

    /// Resets the cache under the write lock, preserving capacity.
    pub fn clear(&self) {
        self.shared.core.write().clear();
    }

    /// Returns the number of occupied slots.
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

    /// Returns merged counters: core write-path plus this wrapper's
    /// read-path hits and misses.
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
impl<K, V> ConcurrentCache for ConcurrentClockCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
