//! Process-wide simulated time.
//!
//! The [`TickClock`] is the single source of truth for the current tick.
//! It is an explicitly owned atomic counter, shared by [`Arc`] between the
//! broadcaster and the administrative control surface, so every test can
//! build its own independent clock.
//!
//! `advance` and `reset` may race; the last writer wins. No consumer
//! depends on exact intermediate values.
//!
//! [`Arc`]: std::sync::Arc

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic tick counter, reset only on request.
#[derive(Debug, Default)]
pub struct TickClock {
    tick: AtomicU64,
}

impl TickClock {
    /// Create a clock starting at tick 0.
    pub const fn new() -> Self {
        Self {
            tick: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    const fn starting_at(tick: u64) -> Self {
        Self {
            tick: AtomicU64::new(tick),
        }
    }

    /// Advance by exactly one tick and return the new value.
    pub fn advance(&self) -> u64 {
        // fetch_add wraps on overflow, which realistic runtimes never reach.
        self.tick.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Return the current tick without mutating it.
    pub fn current(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }

    /// Set the counter back to 0 and return 0.
    pub fn reset(&self) -> u64 {
        self.tick.store(0, Ordering::Release);
        0
    }
}
