//! Cache engines built on the CLOCK ring.
//!
//! [`clock`] is the plain second-chance cache; [`expiring`] layers a
//! per-entry time-to-live on top of the same structure.

pub mod clock;
pub mod expiring;

pub use clock::ClockCache;
pub use expiring::ExpiringClockCache;

#[cfg(feature = "concurrency")]
pub use clock::ConcurrentClockCache;
#[cfg(feature = "concurrency")]
pub use expiring::ConcurrentExpiringClockCache;
