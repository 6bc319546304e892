//! Clock-sweep slot ring for second-chance eviction.
//!
//! A fixed-size circular array of key slots plus one atomic reference bit
//! per slot and a persistent hand cursor. The ring knows nothing about
//! values: cache types pair it with a key index that maps each key to the
//! slot position it occupies.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │                          ClockRing<K>                             │
//!   │                                                                   │
//!   │   slots: Box<[Option<K>]>      refs: Box<[AtomicBool]>            │
//!   │                                                                   │
//!   │     [0]     [1]     [2]     [3]     [4]                           │
//!   │    ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐                          │
//!   │    │ A │   │ B │   │ C │   │   │   │   │   keys (or empty)        │
//!   │    │ 1 │   │ 0 │   │ 1 │   │ 0 │   │ 0 │   reference bits         │
//!   │    └───┘   └───┘   └───┘   └───┘   └───┘                          │
//!   │              ▲                                                    │
//!   │              └── hand (persists across sweeps)                    │
//!   └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sweep
//!
//! ```text
//!   sweep():
//!     loop:
//!       if steps >= SWEEP_BOUND: force refs[hand] = 0
//!       if slots[hand] occupied and refs[hand] == 1:
//!         refs[hand] = 0            // second chance
//!         hand = (hand + 1) % cap
//!       else:
//!         return hand as victim (taking any displaced key)
//! ```
//!
//! The step bound guarantees termination in at most `SWEEP_BOUND + capacity`
//! examinations even if slots are perpetually re-marked by concurrent
//! readers mid-scan.
//!
//! ## Reference bits
//!
//! `mark`/`unmark`/`is_marked` take `&self` and use relaxed atomic accesses:
//! a reference bit is a single boolean with no ordering dependency on other
//! fields, so readers can set it while holding only a shared lock. A racy
//! bit write can at worst keep a slot alive for one extra sweep or retire it
//! one sweep early; it can never desynchronize slots from a key index.
//! Structural mutation (`sweep`, `install`, `free`, `reset`) takes
//! `&mut self` and is serialized by the owning cache.

use std::sync::atomic::{AtomicBool, Ordering};

/// Maximum number of referenced slots a single sweep will clear before it
/// forces a victim. Empirical constant carried over from the original
/// engine; its only formal property is that it bounds sweep work under
/// pathological all-referenced states.
pub const SWEEP_BOUND: usize = 107;

/// Fixed-size slot ring implementing the CLOCK (second-chance) victim
/// selection algorithm.
///
/// Holds keys only. The companion key index owned by the cache layer maps
/// each live key to its slot position; [`ClockRing::sweep`] hands back any
/// displaced key so the caller can drop the matching index entry.
#[derive(Debug)]
pub struct ClockRing<K> {
    slots: Box<[Option<K>]>,
    refs: Box<[AtomicBool]>,
    hand: usize,
}

impl<K> ClockRing<K> {
    /// Creates a ring with `capacity` slots, all empty, hand at 0.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Cache constructors validate capacity
    /// before building a ring.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ClockRing requires capacity >= 1");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let mut refs = Vec::with_capacity(capacity);
        refs.resize_with(capacity, || AtomicBool::new(false));
        Self {
            slots: slots.into_boxed_slice(),
            refs: refs.into_boxed_slice(),
            hand: 0,
        }
    }

    /// Returns the number of slots. Fixed for the lifetime of the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current hand position, always in `[0, capacity)`.
    #[inline]
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Returns the key occupying `pos`, if any.
    #[inline]
    pub fn key_at(&self, pos: usize) -> Option<&K> {
        self.slots[pos].as_ref()
    }

    /// Sets the reference bit at `pos`. Relaxed; callable under a shared lock.
    #[inline]
    pub fn mark(&self, pos: usize) {
        self.refs[pos].store(true, Ordering::Relaxed);
    }

    /// Clears the reference bit at `pos`. Relaxed; callable under a shared lock.
    #[inline]
    pub fn unmark(&self, pos: usize) {
        self.refs[pos].store(false, Ordering::Relaxed);
    }

    /// Returns the reference bit at `pos`.
    #[inline]
    pub fn is_marked(&self, pos: usize) -> bool {
        self.refs[pos].load(Ordering::Relaxed)
    }

    /// Runs the CLOCK sweep from the current hand and returns the victim
    /// slot position together with the key it displaced, if the slot was
    /// occupied.
    ///
    /// Referenced occupied slots lose their bit and are skipped; the first
    /// unreferenced or empty slot becomes the victim. After [`SWEEP_BOUND`]
    /// clears the flag at the current position is forced off so the scan
    /// terminates. The hand is left on the victim; [`ClockRing::install`]
    /// advances it past.
    pub fn sweep(&mut self) -> (usize, Option<K>) {
        let mut steps = 0usize;
        loop {
            let pos = self.hand;
            if steps >= SWEEP_BOUND {
                self.unmark(pos);
            }
            if self.slots[pos].is_some() && self.is_marked(pos) {
                self.unmark(pos);
                self.advance();
                steps += 1;
                continue;
            }
            let displaced = self.slots[pos].take();
            return (pos, displaced);
        }
    }

    /// Installs `key` into the empty slot at `pos` with its reference bit
    /// set, then advances the hand to `pos + 1 (mod capacity)`.
    pub fn install(&mut self, pos: usize, key: K) {
        debug_assert!(self.slots[pos].is_none(), "install into occupied slot");
        self.slots[pos] = Some(key);
        self.mark(pos);
        self.hand = (pos + 1) % self.capacity();
    }

    /// Empties the slot at `pos` and clears its reference bit, returning
    /// the key that occupied it.
    pub fn free(&mut self, pos: usize) -> Option<K> {
        self.unmark(pos);
        self.slots[pos].take()
    }

    /// Resets every slot to empty, every reference bit to 0, and the hand
    /// to 0. Capacity is preserved.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        for bit in self.refs.iter() {
            bit.store(false, Ordering::Relaxed);
        }
        self.hand = 0;
    }

    /// Returns the number of occupied slots. O(capacity); used by debug
    /// invariant checks and tests.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    #[inline]
    fn advance(&mut self) {
        self.hand = (self.hand + 1) % self.capacity();
    }

    #[cfg(any(test, debug_assertions))]
    /// Asserts ring-local invariants: the hand stays inside the slot array.
    pub fn debug_validate(&self) {
        assert!(self.hand < self.capacity());
    }
}
