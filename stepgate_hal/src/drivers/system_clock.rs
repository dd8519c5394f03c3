//! `Instant`-backed microsecond clock.

use std::time::Instant;

use stepgate_common::hal::MonotonicClock;

/// Monotonic microsecond counter derived from [`std::time::Instant`].
///
/// Counts from construction and truncates to `u32`, so it wraps every
/// 2^32 µs exactly like a microcontroller `micros()` counter.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Counter origin
    origin: Instant,
}

impl SystemClock {
    /// Clock counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_micros(&self) -> u32 {
        // Truncation is the wrap.
        self.origin.elapsed().as_micros() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic_over_short_interval() {
        let clock = SystemClock::new();
        let a = clock.now_micros();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = clock.now_micros();
        assert!(b.wrapping_sub(a) >= 2_000);
    }
}
