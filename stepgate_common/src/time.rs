//! Wraparound-safe microsecond timestamps.
//!
//! The monotonic source is a free-running `u32` microsecond counter that
//! wraps roughly every 71.6 minutes. Elapsed time is always computed with
//! wrapping subtraction, so a comparison stays correct across the wrap as
//! long as the real interval is shorter than one full counter period.

use core::fmt;

/// A raw reading of the monotonic microsecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Micros(pub u32);

impl Micros {
    /// Zero timestamp.
    pub const ZERO: Self = Self(0);

    /// Raw counter value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Microseconds elapsed since `earlier`, wraparound-safe.
    #[inline]
    pub const fn since(self, earlier: Micros) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// True once at least `duration_us` has elapsed since `earlier`.
    #[inline]
    pub const fn has_elapsed(self, earlier: Micros, duration_us: u32) -> bool {
        self.since(earlier) >= duration_us
    }

    /// Timestamp `delta_us` later, wrapping at 2^32.
    #[inline]
    pub const fn wrapping_add(self, delta_us: u32) -> Self {
        Self(self.0.wrapping_add(delta_us))
    }
}

impl From<u32> for Micros {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}µs", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_without_wrap() {
        assert_eq!(Micros(1_500).since(Micros(1_000)), 500);
        assert_eq!(Micros(1_000).since(Micros(1_000)), 0);
    }

    #[test]
    fn since_across_wrap() {
        let before = Micros(u32::MAX - 9);
        let after = before.wrapping_add(25);
        assert_eq!(after.raw(), 15);
        assert_eq!(after.since(before), 25);
    }

    #[test]
    fn has_elapsed_is_inclusive() {
        let start = Micros(100);
        assert!(!Micros(119).has_elapsed(start, 20));
        assert!(Micros(120).has_elapsed(start, 20));
        assert!(Micros(5_000).has_elapsed(start, 20));
    }

    #[test]
    fn has_elapsed_across_wrap() {
        let start = Micros(u32::MAX - 5);
        assert!(!Micros(10).has_elapsed(start, 20));
        assert!(Micros(14).has_elapsed(start, 20));
    }

    #[test]
    fn zero_duration_always_elapsed() {
        assert!(Micros(7).has_elapsed(Micros(7), 0));
    }
}
