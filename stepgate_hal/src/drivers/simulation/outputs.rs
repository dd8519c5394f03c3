//! Simulated digital output bank.
//!
//! Records the physical level of every line, counts writes and level
//! transitions, and optionally forwards every write to a [`StepperModel`].

use std::collections::{BTreeMap, BTreeSet};

use stepgate_common::hal::{DigitalOutput, LineId};
use tracing::{debug, trace};

use super::stepper::StepperModel;

/// Digital output simulator.
#[derive(Debug, Clone, Default)]
pub struct SimOutputBank {
    /// Last written level per line
    levels: BTreeMap<LineId, bool>,
    /// Lines prepared for output
    configured: BTreeSet<LineId>,
    /// Level changes per line
    transitions: BTreeMap<LineId, u64>,
    /// Total writes
    writes: u64,
    /// Writes to lines never configured
    unconfigured_writes: u64,
    /// Optional driver behind the lines
    stepper: Option<StepperModel>,
}

impl SimOutputBank {
    /// Empty bank without a driver model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank forwarding every write to `stepper`.
    pub fn with_stepper(stepper: StepperModel) -> Self {
        Self {
            stepper: Some(stepper),
            ..Self::default()
        }
    }

    /// Last written level of `line`, `None` if never written.
    pub fn level(&self, line: LineId) -> Option<bool> {
        self.levels.get(&line).copied()
    }

    /// Whether `line` was configured as an output.
    pub fn is_configured(&self, line: LineId) -> bool {
        self.configured.contains(&line)
    }

    /// Number of level changes seen on `line`.
    pub fn transitions(&self, line: LineId) -> u64 {
        self.transitions.get(&line).copied().unwrap_or(0)
    }

    /// Total number of writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Writes to lines that were never configured.
    pub fn unconfigured_writes(&self) -> u64 {
        self.unconfigured_writes
    }

    /// Attached driver model.
    pub fn stepper(&self) -> Option<&StepperModel> {
        self.stepper.as_ref()
    }
}

impl DigitalOutput for SimOutputBank {
    fn configure_output(&mut self, line: LineId) {
        if self.configured.insert(line) {
            debug!("Output {} configured", line);
        }
    }

    fn write_digital(&mut self, line: LineId, level: bool) {
        self.writes += 1;
        if !self.configured.contains(&line) {
            self.unconfigured_writes += 1;
        }

        let previous = self.levels.insert(line, level);
        if previous.is_some_and(|p| p != level) {
            *self.transitions.entry(line).or_insert(0) += 1;
            trace!("Output {} -> {}", line, level);
        }

        if let Some(stepper) = self.stepper.as_mut() {
            stepper.observe(line, level);
        }
    }
}
