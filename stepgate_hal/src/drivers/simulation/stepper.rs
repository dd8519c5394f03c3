//! Step/direction driver model.
//!
//! Emulates the driver chip sitting behind the three output lines: a step
//! is taken on every logical rising edge of the step line while the
//! driver is enabled, in the direction currently present on the direction
//! line. Used to check the tracked position against what a real driver
//! would have done.

use stepgate_common::gate::config::LineConfig;
use stepgate_common::hal::LineId;
use tracing::trace;

/// Simulated stepper driver fed by physical line levels.
#[derive(Debug, Clone)]
pub struct StepperModel {
    /// Line assignment and polarity
    lines: LineConfig,
    /// Last physical level of the step line
    step_level: bool,
    /// Last physical level of the direction line
    direction_level: bool,
    /// Last physical level of the enable line
    enable_level: bool,
    /// Shaft position [steps]
    position: i64,
    /// Steps taken
    steps: u64,
    /// Rising edges ignored because the driver was disabled
    ignored_edges: u64,
    /// Direction changes while the step line was asserted
    direction_glitches: u64,
}

impl StepperModel {
    /// Driver at `position` wired according to `lines`.
    ///
    /// All lines start at their inactive logical level.
    pub fn new(lines: LineConfig, position: i64) -> Self {
        Self {
            lines,
            step_level: lines.step_inverted,
            direction_level: false,
            enable_level: lines.enable_active_low,
            position,
            steps: 0,
            ignored_edges: 0,
            direction_glitches: 0,
        }
    }

    /// Feed a physical line write into the model.
    pub fn observe(&mut self, line: LineId, level: bool) {
        if line == self.lines.step {
            let was_active = self.step_level != self.lines.step_inverted;
            let is_active = level != self.lines.step_inverted;
            self.step_level = level;
            if is_active && !was_active {
                self.on_rising_edge();
            }
        } else if line == self.lines.direction {
            if level != self.direction_level && self.step_active() {
                self.direction_glitches += 1;
            }
            self.direction_level = level;
        } else if line == self.lines.enable {
            self.enable_level = level;
        }
    }

    fn on_rising_edge(&mut self) {
        if !self.enabled() {
            self.ignored_edges += 1;
            return;
        }
        self.position += if self.direction_level { -1 } else { 1 };
        self.steps += 1;
        trace!("Driver step -> {}", self.position);
    }

    /// Whether the step input is currently asserted.
    pub fn step_active(&self) -> bool {
        self.step_level != self.lines.step_inverted
    }

    /// Whether the driver is enabled.
    pub fn enabled(&self) -> bool {
        self.enable_level != self.lines.enable_active_low
    }

    /// Shaft position [steps].
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Number of steps taken.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Rising edges received while disabled.
    pub fn ignored_edges(&self) -> u64 {
        self.ignored_edges
    }

    /// Direction changes seen while the step input was asserted.
    pub fn direction_glitches(&self) -> u64 {
        self.direction_glitches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> LineConfig {
        LineConfig::default()
    }

    fn pulse(model: &mut StepperModel, lines: &LineConfig) {
        model.observe(lines.step, !lines.step_inverted);
        model.observe(lines.step, lines.step_inverted);
    }

    #[test]
    fn counts_rising_edges_forward() {
        let l = lines();
        let mut model = StepperModel::new(l, 0);
        model.observe(l.enable, true);
        pulse(&mut model, &l);
        pulse(&mut model, &l);
        assert_eq!(model.position(), 2);
        assert_eq!(model.steps(), 2);
    }

    #[test]
    fn direction_line_reverses() {
        let l = lines();
        let mut model = StepperModel::new(l, 10);
        model.observe(l.enable, true);
        model.observe(l.direction, true);
        pulse(&mut model, &l);
        assert_eq!(model.position(), 9);
    }

    #[test]
    fn repeated_high_is_one_edge() {
        let l = lines();
        let mut model = StepperModel::new(l, 0);
        model.observe(l.enable, true);
        model.observe(l.step, true);
        model.observe(l.step, true);
        assert_eq!(model.steps(), 1);
    }

    #[test]
    fn disabled_driver_ignores_edges() {
        let l = lines();
        let mut model = StepperModel::new(l, 5);
        pulse(&mut model, &l);
        assert_eq!(model.position(), 5);
        assert_eq!(model.ignored_edges(), 1);
    }

    #[test]
    fn inverted_polarities() {
        let l = LineConfig {
            step_inverted: true,
            enable_active_low: true,
            ..LineConfig::default()
        };
        let mut model = StepperModel::new(l, 0);
        assert!(!model.enabled());
        model.observe(l.enable, false);
        assert!(model.enabled());
        // Physical low is the asserted level.
        model.observe(l.step, false);
        assert_eq!(model.steps(), 1);
        model.observe(l.step, true);
        assert_eq!(model.steps(), 1);
    }

    #[test]
    fn direction_change_while_high_is_flagged() {
        let l = lines();
        let mut model = StepperModel::new(l, 0);
        model.observe(l.enable, true);
        model.observe(l.step, true);
        model.observe(l.direction, true);
        assert_eq!(model.direction_glitches(), 1);
    }
}
