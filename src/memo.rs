//! Function memoization backed by a concurrent CLOCK cache.
//!
//! [`Memoized`] wraps a pure function and a
//! [`ConcurrentClockCache`](crate::policy::clock::ConcurrentClockCache):
//! repeated calls with the same argument return the cached result instead
//! of recomputing. Results are `Option`-free in the API because the cache
//! stores the computed value directly; a function that legitimately
//! returns `Option<T>` caches `None` like any other value.
//!
//! Concurrency caveat: two threads racing on the same uncached argument
//! may both compute it. The second insert refreshes the entry in place,
//! so the cache stays consistent; the duplicate work is accepted rather
//! than holding a lock across the user's function.
//!
//! ```
//! use clockkit::memo::Memoized;
//!
//! let squares = Memoized::new(64, |n: &u64| n * n);
//! assert_eq!(squares.call(12), 144);
//! assert_eq!(squares.call(12), 144); // served from cache
//! ```

use std::hash::Hash;

use crate::error::ConfigError;
use crate::policy::clock::ConcurrentClockCache;

/// A function with a bounded cache of its past results.
///
/// The wrapper is cheap to clone; clones share the underlying cache.
pub struct Memoized<A, R, F>
where
    A: Clone + Eq + Hash,
    R: Clone,
    F: Fn(&A) -> R,
{
    cache: ConcurrentClockCache<A, R>,
    func: F,
}

impl<A, R, F> Memoized<A, R, F>
where
    A: Clone + Eq + Hash,
    R: Clone,
    F: Fn(&A) -> R,
{
    /// Memoizes `func` with room for `capacity` distinct arguments.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) for a
    /// non-panicking alternative.
    pub fn new(capacity: usize, func: F) -> Self {
        match Self::try_new(capacity, func) {
            Ok(memo) => memo,
            Err(e) => panic!("{}", e),
        }
    }

    /// Memoizes `func`, rejecting invalid capacities.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    pub fn try_new(capacity: usize, func: F) -> Result<Self, ConfigError> {
        Ok(Self {
            cache: ConcurrentClockCache::try_new(capacity)?,
            func,
        })
    }

    /// Calls the function through the cache.
    ///
    /// A hit marks the entry recently referenced and returns a clone of
    /// the stored result; a miss computes, stores, and returns the result.
    pub fn call(&self, arg: A) -> R {
        if let Some(cached) = self.cache.get(&arg) {
            return cached;
        }
        let result = (self.func)(&arg);
        self.cache.insert(arg, result.clone());
        result
    }

    /// Drops the cached result for `arg`, forcing the next call to
    /// recompute. No-op if the argument was never cached.
    pub fn invalidate(&self, arg: &A) -> bool {
        self.cache.remove(arg).is_some()
    }

    /// Drops all cached results.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Returns the backing cache, e.g. for metrics or capacity checks.
    pub fn cache(&self) -> &ConcurrentClockCache<A, R> {
        &self.cache
    }
}

impl<A, R, F> std::fmt::Debug for Memoized<A, R, F>
where
    A: Clone + Eq + Hash,
    R: Clone,
    F: Fn(&A) -> R,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized").finish_non_exhaustive()
    }
}

impl<A, R, F> Clone for Memoized<A, R, F>
where
    A: Clone + Eq + Hash,
    R: Clone,
    F: Fn(&A) -> R + Clone,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            func: self.func.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn caches_computed_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo = Memoized::new(8, move |n: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            n * 2
        });

        assert_eq!(memo.call(21), 42);
        assert_eq!(memo.call(21), 42);
        assert_eq!(memo.call(21), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_arguments_compute_separately() {
        let memo = Memoized::new(8, |s: &String| s.len());
        assert_eq!(memo.call("one".to_string()), 3);
        assert_eq!(memo.call("three".to_string()), 5);
        assert_eq!(memo.cache().len(), 2);
    }

    #[test]
    fn capacity_bounds_retained_results() {
        let memo = Memoized::new(4, |n: &u32| n + 1);
        for i in 0..100 {
            assert_eq!(memo.call(i), i + 1);
        }
        assert!(memo.cache().len() <= 4);
    }

    #[test]
    fn none_results_are_cached_too() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo = Memoized::new(8, move |n: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            if *n >= 0 { Some(*n) } else { None }
        });

        assert_eq!(memo.call(-1), None);
        assert_eq!(memo.call(-1), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo = Memoized::new(8, move |n: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            *n
        });

        memo.call(7);
        assert!(memo.invalidate(&7));
        assert!(!memo.invalidate(&7));
        memo.call(7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn try_new_rejects_zero_capacity() {
        let err = Memoized::try_new(0, |n: &u32| *n).unwrap_err();
        assert_eq!(err, crate::error::ConfigError::InvalidCapacity { got: 0 });
    }

    #[test]
    fn clones_share_the_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let memo = Memoized::new(8, move |n: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            *n
        });
        let other = memo.clone();

        memo.call(1);
        other.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn threads_share_one_memo() {
        let memo = Memoized::new(32, |n: &u64| n.wrapping_mul(31));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let memo = memo.clone();
                std::thread::spawn(move || {
                    for i in 0..200u64 {
                        assert_eq!(memo.call(i % 16), (i % 16).wrapping_mul(31));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(memo.cache().len() <= 32);
    }
}
