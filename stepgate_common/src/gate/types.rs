//! Core value types of the step-driver gate.

use serde::{Deserialize, Serialize};

/// Step index in `[0, max_steps]`.
pub type StepPosition = u32;

/// Commanded rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards higher step indices (direction line low).
    Forward,
    /// Towards step 0 (direction line high).
    Reverse,
}

impl Direction {
    /// Direction that moves `current` towards `target`, `None` when equal.
    #[inline]
    pub fn toward(target: StepPosition, current: StepPosition) -> Option<Self> {
        match target.cmp(&current) {
            core::cmp::Ordering::Greater => Some(Self::Forward),
            core::cmp::Ordering::Less => Some(Self::Reverse),
            core::cmp::Ordering::Equal => None,
        }
    }

    /// Logical level of the direction line for this direction.
    #[inline]
    pub const fn line_level(self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// Phase of the pulse sequencer.
///
/// `Active` waits out the period and raises the step line, `Inactive`
/// holds it high for the high time, `Pause` holds it low for the low
/// time and then commits the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulsePhase {
    /// Step line about to be asserted.
    #[default]
    Active,
    /// Step line asserted, timing out the high period.
    Inactive,
    /// Step line deasserted, timing out the low period.
    Pause,
}

/// A level change on the step line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Step line asserted.
    Rising,
    /// Step line deasserted.
    Falling,
}

/// The logical output triplet published every tick.
///
/// Levels are logical: polarity inversion is applied when the triplet is
/// written to physical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OutputState {
    /// Step pulse line.
    pub signal: bool,
    /// Driver enable line.
    pub enable: bool,
    /// Direction line (`true` = reverse).
    pub direction: bool,
}

/// Step and direction levels produced by the pulse sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PulseLevels {
    /// Step pulse line.
    pub signal: bool,
    /// Direction line (`true` = reverse).
    pub direction: bool,
}
