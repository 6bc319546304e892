//! Convenience re-exports for typical usage.

pub use crate::ds::{ClockRing, SWEEP_BOUND};
pub use crate::error::ConfigError;
pub use crate::policy::clock::ClockCache;
pub use crate::policy::expiring::ExpiringClockCache;
pub use crate::traits::{ConcurrentCache, CoreCache, MutableCache};

#[cfg(feature = "concurrency")]
pub use crate::memo::Memoized;
#[cfg(feature = "concurrency")]
pub use crate::policy::clock::ConcurrentClockCache;
#[cfg(feature = "concurrency")]
pub use crate::policy::expiring::ConcurrentExpiringClockCache;

#[cfg(feature = "metrics")]
pub use crate::metrics::ClockMetrics;
