//! Debounced pulse counter shared between a GPIO ISR and the flush loop.
//!
//! Reed-switch sensors (anemometer cups, rain-gauge bucket) bounce on every
//! closure.  Rather than a hardware RC filter, each counter rejects any edge
//! that arrives sooner than the fastest physically possible tick rate for its
//! sensor.
//!
//! Both fields are atomics so the counter is lock-free from interrupt
//! context and safe to drain from another core:
//!
//! - `next_eligible_us` advances with a compare-and-swap, so two producers
//!   racing on the same edge can never both count it.
//! - `count` is drained with an exchange-to-zero, so an edge landing between
//!   "read" and "reset" is never lost.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// What happened to a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// The edge was accepted and counted as one tick.
    Counted,
    /// The edge arrived inside the debounce interval and was dropped.
    Debounced,
    /// No counter is attached to the interrupting pin.
    UnknownPin,
}

/// Rate-limited tick accumulator.
#[derive(Debug)]
pub struct DebouncedCounter {
    /// Minimum spacing between two counted edges (µs).
    debounce_us: u64,
    /// An edge at or before this instant is bounce.
    next_eligible_us: AtomicU64,
    /// Ticks accumulated since the last drain.
    count: AtomicU32,
}

impl DebouncedCounter {
    pub const fn new(debounce_us: u64) -> Self {
        Self {
            debounce_us,
            next_eligible_us: AtomicU64::new(0),
            count: AtomicU32::new(0),
        }
    }

    pub fn debounce_us(&self) -> u64 {
        self.debounce_us
    }

    /// Register one edge observed at `now_us`.
    ///
    /// Interrupt-safe: no locks, no allocation, bounded time.  A rejected
    /// edge leaves both the count and the eligibility deadline untouched.
    pub fn on_edge(&self, now_us: u64) -> EdgeOutcome {
        let debounce_us = self.debounce_us;
        let accepted = self
            .next_eligible_us
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| {
                (now_us > next).then(|| now_us.saturating_add(debounce_us))
            })
            .is_ok();

        if accepted {
            self.count.fetch_add(1, Ordering::AcqRel);
            EdgeOutcome::Counted
        } else {
            EdgeOutcome::Debounced
        }
    }

    /// Return the accumulated tick count and reset it to zero.
    ///
    /// Destructive: a second call with no intervening edges returns 0.
    pub fn take_and_reset(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Ticks accumulated so far, without draining.
    pub fn pending(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Instant after which the next edge will be counted.
    pub fn next_eligible_us(&self) -> u64 {
        self.next_eligible_us.load(Ordering::Acquire)
    }
}
