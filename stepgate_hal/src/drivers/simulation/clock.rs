//! Manually advanced microsecond clock.

use std::cell::Cell;

use stepgate_common::hal::MonotonicClock;
use stepgate_common::time::Micros;

/// Simulated free-running `u32` microsecond counter.
///
/// Time only moves when the owner calls [`advance`](Self::advance) or
/// [`set`](Self::set). Interior mutability lets a gate own the clock while
/// tests keep advancing it through a shared reference.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    /// Current counter value [µs]
    now: Cell<u32>,
}

impl SimClock {
    /// Clock starting at `start_us`.
    pub fn starting_at(start_us: u32) -> Self {
        Self {
            now: Cell::new(start_us),
        }
    }

    /// Current time as a timestamp.
    pub fn now(&self) -> Micros {
        Micros(self.now.get())
    }

    /// Move time forward by `delta_us`, wrapping at 2^32.
    pub fn advance(&self, delta_us: u32) {
        self.now.set(self.now.get().wrapping_add(delta_us));
    }

    /// Jump to an absolute counter value.
    pub fn set(&self, now_us: u32) {
        self.now.set(now_us);
    }
}

impl MonotonicClock for SimClock {
    fn now_micros(&self) -> u32 {
        self.now.get()
    }
}
