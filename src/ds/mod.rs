pub mod clock_ring;

pub use clock_ring::{ClockRing, SWEEP_BOUND};
