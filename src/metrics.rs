//! Operation counters for the cache engines (feature `metrics`).
//!
//! Counters on the core types are plain fields bumped inside `&mut self`
//! operations. The concurrent wrappers count their shared-lock read path
//! with atomics and merge both views in their `metrics()` accessor.

/// Counters for CLOCK cache operations.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ClockMetrics {
    /// Lookups that returned a live value.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Lookups that found an entry past its expiry (also counted in
    /// `misses`). Always zero for the non-expiring cache.
    pub expired_misses: u64,
    /// Insertions of a previously unseen key.
    pub inserts: u64,
    /// In-place refreshes of an existing key.
    pub updates: u64,
    /// Entries displaced by the eviction sweep.
    pub evictions: u64,
}

impl ClockMetrics {
    /// Hit rate over all lookups, in `[0.0, 1.0]`; `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl std::fmt::Display for ClockMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ClockMetrics {{ hits: {}, misses: {}, hit_rate: {:.2}%, expired_misses: {}, \
             inserts: {}, updates: {}, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.expired_misses,
            self.inserts,
            self.updates,
            self.evictions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        let m = ClockMetrics::default();
        assert_eq!(m.hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_counts_hits_over_lookups() {
        let m = ClockMetrics {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((m.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn display_includes_all_counters() {
        let m = ClockMetrics {
            hits: 1,
            misses: 2,
            expired_misses: 1,
            inserts: 3,
            updates: 4,
            evictions: 5,
        };
        let text = m.to_string();
        for needle in ["hits: 1", "misses: 2", "inserts: 3", "updates: 4", "evictions: 5"] {
            assert!(text.contains(needle), "missing {needle} in {text}");
        }
    }
}
