// ==============================================
// CROSS-ENGINE INVARIANT TESTS (integration)
// ==============================================
//
// Behavioral consistency checks spanning both cache engines. Anything
// specific to one engine lives in that engine's unit tests; these verify
// the two variants agree on construction, trait behavior, and capacity
// accounting.

use std::time::Duration;

use clockkit::policy::clock::ClockCache;
use clockkit::policy::expiring::ExpiringClockCache;
use clockkit::traits::MutableCache;

const LONG: Duration = Duration::from_secs(3600);

mod construction {
    use super::*;
    use clockkit::error::ConfigError;

    #[test]
    fn zero_capacity_is_rejected_everywhere() {
        assert_eq!(
            ClockCache::<u32, u32>::try_new(0).unwrap_err(),
            ConfigError::InvalidCapacity { got: 0 }
        );
        assert_eq!(
            ExpiringClockCache::<u32, u32>::try_new(0, LONG).unwrap_err(),
            ConfigError::InvalidCapacity { got: 0 }
        );
    }

    #[cfg(feature = "concurrency")]
    #[test]
    fn zero_capacity_is_rejected_by_concurrent_wrappers() {
        use clockkit::memo::Memoized;
        use clockkit::policy::clock::ConcurrentClockCache;
        use clockkit::policy::expiring::ConcurrentExpiringClockCache;

        assert!(ConcurrentClockCache::<u32, u32>::try_new(0).is_err());
        assert!(ConcurrentExpiringClockCache::<u32, u32>::try_new(0, LONG).is_err());
        assert!(Memoized::try_new(0, |n: &u32| *n).is_err());
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn panicking_constructor_names_the_problem() {
        let _ = ClockCache::<u32, u32>::new(0);
    }

    #[test]
    fn capacity_one_is_valid() {
        let mut cache = ClockCache::new(1);
        cache.insert("only", 1);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
    }
}

mod generic_behavior {
    use super::*;

    // Both engines behind the same trait bound.
    fn churn<C: MutableCache<u32, u32>>(cache: &mut C) {
        for i in 0..200 {
            cache.insert(i, i * 2);
            assert!(cache.len() <= cache.capacity());
        }
        for i in 0..200 {
            if cache.contains(&i) {
                assert_eq!(cache.get(&i), Some(&(i * 2)));
            }
        }
        let survivors: Vec<u32> = (0..200).filter(|i| cache.contains(i)).collect();
        for key in &survivors {
            assert!(cache.remove(key).is_some());
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn clock_cache_through_trait() {
        churn(&mut ClockCache::new(7));
    }

    #[test]
    fn expiring_cache_through_trait() {
        churn(&mut ExpiringClockCache::new(7, LONG));
    }

    #[test]
    fn clear_preserves_capacity_in_both_engines() {
        let mut plain = ClockCache::new(5);
        let mut expiring = ExpiringClockCache::new(5, LONG);
        for i in 0..5u32 {
            plain.insert(i, i);
            expiring.insert(i, i);
        }
        plain.clear();
        expiring.clear();

        assert_eq!(plain.capacity(), 5);
        assert_eq!(expiring.capacity(), 5);
        assert!(plain.is_empty());
        assert!(expiring.is_empty());

        // Both refill to full capacity after a reset.
        for i in 10..15u32 {
            plain.insert(i, i);
            expiring.insert(i, i);
        }
        assert_eq!(plain.len(), 5);
        assert_eq!(expiring.len(), 5);
    }
}

mod eviction_agreement {
    use super::*;

    // With no expirations in play, the expiring engine must make the same
    // eviction decisions as the plain one.
    #[test]
    fn identical_traces_evict_identically() {
        let mut plain = ClockCache::new(3);
        let mut expiring = ExpiringClockCache::new(3, LONG);

        let trace: &[(u8, u32)] = &[
            (0, 1),
            (0, 2),
            (0, 3),
            (1, 2), // get key 2
            (0, 4),
            (0, 5),
            (1, 4),
            (0, 6),
        ];

        for &(op, key) in trace {
            match op {
                0 => {
                    plain.insert(key, key);
                    expiring.insert(key, key);
                },
                _ => {
                    plain.get(&key);
                    expiring.get(&key);
                },
            }
        }

        for key in 0..8u32 {
            assert_eq!(
                plain.contains(&key),
                expiring.contains(&key),
                "engines disagree on key {key}"
            );
        }
        plain.debug_validate_invariants();
        expiring.debug_validate_invariants();
    }
}
