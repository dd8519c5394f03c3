//! Collaborator interfaces consumed by the step-driver gate.
//!
//! The gate never touches hardware directly. It samples one analog value,
//! writes three boolean lines and reads a free-running microsecond clock
//! through these traits, once per tick. None of the operations can fail:
//! the control loop has no I/O error channel.
//!
//! | Trait | Called | Contract |
//! |-------|--------|----------|
//! | [`AnalogInput`] | once per tick | raw sample in `[0, full_scale_count]` |
//! | [`DigitalOutput`] | three writes per tick | non-blocking level write |
//! | [`MonotonicClock`] | twice per tick | wraps at 2^32 µs |

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u8);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Source of raw analog samples.
pub trait AnalogInput {
    /// Read one raw sample.
    fn read_analog(&mut self) -> u16;
}

/// Sink for digital output levels.
pub trait DigitalOutput {
    /// Prepare `line` for output.
    ///
    /// Called once per line when the gate is constructed, before the first
    /// tick. The default implementation does nothing.
    fn configure_output(&mut self, _line: LineId) {}

    /// Drive `line` to `level`.
    fn write_digital(&mut self, line: LineId, level: bool);
}

/// Free-running microsecond counter.
pub trait MonotonicClock {
    /// Current counter value [µs], wrapping at 2^32.
    fn now_micros(&self) -> u32;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read_analog(&mut self) -> u16 {
        (**self).read_analog()
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for &mut T {
    fn configure_output(&mut self, line: LineId) {
        (**self).configure_output(line)
    }

    fn write_digital(&mut self, line: LineId, level: bool) {
        (**self).write_digital(line, level)
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_micros(&self) -> u32 {
        (**self).now_micros()
    }
}
