//! Position tracker.
//!
//! The authoritative step count. Starts at `max_steps` (the far end, so
//! homing always performs one full run to zero) and changes by exactly one
//! step per completed pulse cycle, saturating at both ends.

use stepgate_common::gate::config::validate_max_steps;
use stepgate_common::gate::error::GateError;
use stepgate_common::gate::types::{Direction, StepPosition};

/// Tracked absolute step position in `[0, max_steps]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionTracker {
    /// Current step index.
    position: StepPosition,
    /// Upper bound (steps per revolution).
    max_steps: u32,
}

impl PositionTracker {
    /// Tracker parked at the far end of a `max_steps` range.
    pub fn new(max_steps: u32) -> Result<Self, GateError> {
        validate_max_steps(max_steps)?;
        Ok(Self {
            position: max_steps,
            max_steps,
        })
    }

    /// Current step index.
    #[inline]
    pub fn current(&self) -> StepPosition {
        self.position
    }

    /// Upper bound of the range.
    #[inline]
    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Record one completed pulse cycle.
    ///
    /// Only the pulse sequencer calls this. Saturates at the bounds.
    pub(crate) fn commit(&mut self, direction: Direction) -> StepPosition {
        self.position = match direction {
            Direction::Forward => self.position.saturating_add(1).min(self.max_steps),
            Direction::Reverse => self.position.saturating_sub(1),
        };
        self.position
    }

    /// Change the range, clamping the current position into it.
    pub(crate) fn set_max_steps(&mut self, max_steps: u32) -> Result<(), GateError> {
        validate_max_steps(max_steps)?;
        self.max_steps = max_steps;
        self.position = self.position.min(max_steps);
        Ok(())
    }
}
