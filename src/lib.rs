//! clockkit: fixed-capacity CLOCK (second-chance) caching primitives.
//!
//! A slot ring with per-slot reference bits approximates LRU at O(1)
//! amortized cost per operation. [`policy::clock`] is the plain engine,
//! [`policy::expiring`] adds lazy per-entry expiration, and [`memo`]
//! wraps a function with a bounded result cache.

pub mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "concurrency")]
pub mod memo;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
