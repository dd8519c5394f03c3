//! Timestamp-driven step pulse sequencer.
//!
//! One call per tick, never blocking. Every transition is a comparison of
//! wraparound-safe elapsed time against a configured duration (`≥`, never
//! equality), so a late tick only delays an edge, it never loses one.
//!
//! ## Phases
//!
//! ```text
//!            period elapsed            high time elapsed
//!   Active ───────────────▶ Inactive ───────────────────▶ Pause
//!     ▲      (line high)                 (line low)         │
//!     └──────────────── low time elapsed: commit step ──────┘
//! ```
//!
//! - `pause_elapsed` (time since the line last went low ≥ low time) is
//!   evaluated once at the start of each tick, before dispatching on the
//!   phase. It gates the Pause → Active commit.
//! - A request in the other direction immediately resets the machine to
//!   `Active` with every timestamp set to `now`, so reversing always costs
//!   one full period of settle time before the first pulse in the new
//!   direction. A pulse in flight is abandoned without committing; if the
//!   line was high the reset drops it in the same tick.
//! - `None` (already at target) freezes the outputs; the phase stays where
//!   it is.

use stepgate_common::gate::config::{PulseTimingConfig, validate_frequency};
use stepgate_common::gate::error::GateError;
use stepgate_common::gate::types::{Direction, Edge, PulseLevels, PulsePhase};
use stepgate_common::time::Micros;
use tracing::{debug, trace};

use crate::tracker::PositionTracker;

// ─── Pure Transition ────────────────────────────────────────────────

/// Complete sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerState {
    /// Current phase.
    pub phase: PulsePhase,
    /// Direction of the last request; reference for reversal detection.
    pub direction: Direction,
    /// Logical level of the step line.
    pub signal: bool,
    /// Last rising edge, or the last reset.
    pub pulse_start: Micros,
    /// Last transition of the line to low, or the last reset.
    pub low_start: Micros,
}

impl SequencerState {
    /// Fresh state: `Active`, line low, every timestamp at `now`.
    pub const fn new(now: Micros) -> Self {
        Self {
            phase: PulsePhase::Active,
            direction: Direction::Forward,
            signal: false,
            pulse_start: now,
            low_start: now,
        }
    }

    /// Output levels implied by this state.
    #[inline]
    pub const fn levels(&self) -> PulseLevels {
        PulseLevels {
            signal: self.signal,
            direction: self.direction.line_level(),
        }
    }
}

/// Side effects of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effects {
    /// Edge emitted on the step line.
    pub edge: Option<Edge>,
    /// Step to record in the position tracker.
    pub commit: Option<Direction>,
    /// The machine was reset for a direction change.
    pub reversed: bool,
}

/// Advance `state` by one tick requesting `direction` at `now`.
pub fn transition(
    state: SequencerState,
    direction: Direction,
    now: Micros,
    timing: &PulseTimingConfig,
) -> (SequencerState, Effects) {
    let pause_elapsed = now.has_elapsed(state.low_start, timing.low_time_us);
    let mut next = state;
    let mut effects = Effects::default();

    if direction != state.direction {
        next = SequencerState {
            direction,
            ..SequencerState::new(now)
        };
        if state.signal {
            effects.edge = Some(Edge::Falling);
        }
        effects.reversed = true;
        return (next, effects);
    }

    match state.phase {
        PulsePhase::Active => {
            if now.has_elapsed(state.pulse_start, timing.period_us()) {
                next.signal = true;
                next.pulse_start = now;
                next.phase = PulsePhase::Inactive;
                effects.edge = Some(Edge::Rising);
            }
        }
        PulsePhase::Inactive => {
            if now.has_elapsed(state.pulse_start, timing.high_time_us) {
                if state.signal {
                    effects.edge = Some(Edge::Falling);
                }
                next.signal = false;
                next.low_start = now;
                next.phase = PulsePhase::Pause;
            }
        }
        PulsePhase::Pause => {
            if pause_elapsed {
                effects.commit = Some(state.direction);
                next.phase = PulsePhase::Active;
            }
        }
    }

    (next, effects)
}

// ─── Sequencer ──────────────────────────────────────────────────────

/// Stateful pulse sequencer driving a [`PositionTracker`].
#[derive(Debug, Clone)]
pub struct PulseSequencer {
    /// Machine state.
    state: SequencerState,
    /// Pulse timing, mutable between ticks.
    timing: PulseTimingConfig,
}

impl PulseSequencer {
    /// Sequencer in its initial state at `now`.
    pub fn new(timing: PulseTimingConfig, now: Micros) -> Result<Self, GateError> {
        timing.validate()?;
        Ok(Self {
            state: SequencerState::new(now),
            timing,
        })
    }

    /// Run one tick.
    ///
    /// `None` means the tracker is already at the target: nothing moves.
    /// A committed step is applied to `tracker` before returning.
    pub fn advance(
        &mut self,
        direction: Option<Direction>,
        now: Micros,
        tracker: &mut PositionTracker,
    ) -> PulseLevels {
        let Some(direction) = direction else {
            return self.state.levels();
        };

        let (next, effects) = transition(self.state, direction, now, &self.timing);
        self.state = next;

        if effects.reversed {
            debug!("Direction -> {:?} at {}, settling", direction, now);
        }
        if let Some(edge) = effects.edge {
            trace!("Step line {:?} at {}", edge, now);
        }
        if let Some(committed) = effects.commit {
            let position = tracker.commit(committed);
            trace!("Step {:?} committed, position {}", committed, position);
        }

        self.state.levels()
    }

    /// Drop the step line without touching phase or timestamps.
    pub fn release_line(&mut self) {
        self.state.signal = false;
    }

    /// Current levels.
    #[inline]
    pub fn levels(&self) -> PulseLevels {
        self.state.levels()
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> PulsePhase {
        self.state.phase
    }

    /// Full state snapshot.
    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Active timing.
    #[inline]
    pub fn timing(&self) -> &PulseTimingConfig {
        &self.timing
    }

    /// Replace the timing.
    pub fn set_timing(&mut self, timing: PulseTimingConfig) -> Result<(), GateError> {
        timing.validate()?;
        self.timing = timing;
        Ok(())
    }

    /// Set the pulse frequency [Hz]; 0 is rejected.
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), GateError> {
        validate_frequency(frequency_hz)?;
        self.timing.frequency_hz = frequency_hz;
        Ok(())
    }

    /// Set the minimum high time [µs].
    pub fn set_high_time(&mut self, high_time_us: u32) {
        self.timing.high_time_us = high_time_us;
    }

    /// Set the minimum low time [µs].
    pub fn set_low_time(&mut self, low_time_us: u32) {
        self.timing.low_time_us = low_time_us;
    }
}
