//! Step-driver gate: the per-tick orchestrator.
//!
//! Owns the mapper, the sequencer, the tracker and the three collaborators.
//! Each [`tick`](StepDriverGate::tick):
//!
//! 1. reads the clock once (the tick timestamp),
//! 2. samples the analog input and maps it to a target step,
//! 3. derives the direction from target vs. tracked position,
//! 4. advances the sequencer (which may commit a step),
//! 5. publishes the output triplet,
//! 6. reads the clock again and records the tick duration.
//!
//! While the enable line is logically low the sequencer is not advanced: a
//! disabled driver ignores pulses, so none are generated or counted.

use stepgate_common::gate::config::{GateConfig, validate_analog_band};
use stepgate_common::gate::error::GateError;
use stepgate_common::gate::types::{Direction, OutputState, PulsePhase, StepPosition};
use stepgate_common::hal::{AnalogInput, DigitalOutput, MonotonicClock};
use stepgate_common::time::Micros;
use tracing::{debug, info};

use crate::mapper::PositionMapper;
use crate::sequencer::PulseSequencer;
use crate::tracker::PositionTracker;

/// Summary of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Tick timestamp.
    pub now: Micros,
    /// Target step computed this tick.
    pub target: StepPosition,
    /// Tracked position after the tick.
    pub position: StepPosition,
    /// Direction requested from the sequencer (`None` when idle or disabled).
    pub direction: Option<Direction>,
    /// Logical outputs published this tick.
    pub output: OutputState,
    /// Tick duration [µs].
    pub duration_us: u32,
}

/// Analog position follower driving one step/direction/enable triplet.
pub struct StepDriverGate<A, O, C> {
    config: GateConfig,
    analog: A,
    outputs: O,
    clock: C,
    mapper: PositionMapper,
    sequencer: PulseSequencer,
    tracker: PositionTracker,
    output: OutputState,
    last_tick_us: u32,
    ticks: u64,
}

impl<A, O, C> StepDriverGate<A, O, C>
where
    A: AnalogInput,
    O: DigitalOutput,
    C: MonotonicClock,
{
    /// Validate `config`, configure the output lines and publish the
    /// initial levels.
    pub fn new(config: GateConfig, analog: A, mut outputs: O, clock: C) -> Result<Self, GateError> {
        config.validate()?;

        for line in config.lines.all() {
            outputs.configure_output(line);
        }

        let now = Micros(clock.now_micros());
        let sequencer = PulseSequencer::new(config.pulse, now)?;
        let tracker = PositionTracker::new(config.motor.max_steps)?;
        let mapper = PositionMapper::new(config.motor.homing);
        let output = OutputState {
            signal: false,
            enable: config.motor.enabled,
            direction: sequencer.levels().direction,
        };

        let mut gate = Self {
            config,
            analog,
            outputs,
            clock,
            mapper,
            sequencer,
            tracker,
            output,
            last_tick_us: 0,
            ticks: 0,
        };
        gate.publish();

        info!(
            "Gate ready: {} steps, {} Hz, band {}..{} mV, homing={}",
            config.motor.max_steps,
            config.pulse.frequency_hz,
            config.analog.min_mv,
            config.analog.max_mv,
            config.motor.homing
        );
        Ok(gate)
    }

    /// Run one non-blocking control step.
    pub fn tick(&mut self) -> TickReport {
        let start = Micros(self.clock.now_micros());

        let raw = self.analog.read_analog();
        let target = self.mapper.map(
            raw,
            &self.config.analog,
            self.tracker.max_steps(),
            self.tracker.current(),
        );

        let direction = if self.output.enable {
            Direction::toward(target, self.tracker.current())
        } else {
            None
        };

        let levels = self.sequencer.advance(direction, start, &mut self.tracker);
        self.output.signal = levels.signal;
        self.output.direction = levels.direction;
        self.publish();

        let end = Micros(self.clock.now_micros());
        self.last_tick_us = end.since(start);
        self.ticks += 1;

        TickReport {
            now: start,
            target,
            position: self.tracker.current(),
            direction,
            output: self.output,
            duration_us: self.last_tick_us,
        }
    }

    /// Drop the step and enable lines immediately.
    ///
    /// Phase, timestamps and position are kept; calling it again has no
    /// further effect. [`set_enable`](Self::set_enable) resumes stepping.
    pub fn stop(&mut self) {
        if self.output.enable || self.output.signal {
            info!("Gate stopped at step {}", self.tracker.current());
        }
        self.output.enable = false;
        self.output.signal = false;
        self.sequencer.release_line();
        self.publish();
    }

    /// Write the logical outputs to the physical lines.
    ///
    /// The direction line only changes while the step line is low: a low
    /// step level is written first, a high one after direction and enable.
    fn publish(&mut self) {
        let lines = self.config.lines;
        let step = self.output.signal ^ lines.step_inverted;
        if !self.output.signal {
            self.outputs.write_digital(lines.step, step);
        }
        self.outputs
            .write_digital(lines.direction, self.output.direction);
        self.outputs
            .write_digital(lines.enable, self.output.enable ^ lines.enable_active_low);
        if self.output.signal {
            self.outputs.write_digital(lines.step, step);
        }
    }

    // ─── Configuration ──────────────────────────────────────────────

    /// Set the pulse frequency [Hz].
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), GateError> {
        self.sequencer
            .set_frequency(frequency_hz)
            .inspect_err(|e| debug!("Rejected: {e}"))?;
        self.config.pulse.frequency_hz = frequency_hz;
        info!("Pulse frequency -> {} Hz", frequency_hz);
        Ok(())
    }

    /// Set the minimum step-line high time [µs].
    pub fn set_high_time(&mut self, high_time_us: u32) {
        self.sequencer.set_high_time(high_time_us);
        self.config.pulse.high_time_us = high_time_us;
        info!("High time -> {} µs", high_time_us);
    }

    /// Set the minimum step-line low time [µs].
    pub fn set_low_time(&mut self, low_time_us: u32) {
        self.sequencer.set_low_time(low_time_us);
        self.config.pulse.low_time_us = low_time_us;
        info!("Low time -> {} µs", low_time_us);
    }

    /// Set both ends of the analog band [mV].
    pub fn set_analog_range(&mut self, min_mv: f32, max_mv: f32) -> Result<(), GateError> {
        validate_analog_band(min_mv, max_mv).inspect_err(|e| debug!("Rejected: {e}"))?;
        self.config.analog.min_mv = min_mv;
        self.config.analog.max_mv = max_mv;
        info!("Analog band -> {}..{} mV", min_mv, max_mv);
        Ok(())
    }

    /// Set the voltage mapped to step 0 [mV].
    pub fn set_analog_min(&mut self, min_mv: f32) -> Result<(), GateError> {
        self.set_analog_range(min_mv, self.config.analog.max_mv)
    }

    /// Set the voltage mapped to `max_steps` [mV].
    pub fn set_analog_max(&mut self, max_mv: f32) -> Result<(), GateError> {
        self.set_analog_range(self.config.analog.min_mv, max_mv)
    }

    /// Change the step range. The tracked position is clamped into it.
    pub fn set_max_steps(&mut self, max_steps: u32) -> Result<(), GateError> {
        self.tracker
            .set_max_steps(max_steps)
            .inspect_err(|e| debug!("Rejected: {e}"))?;
        self.config.motor.max_steps = max_steps;
        info!("Max steps -> {}", max_steps);
        Ok(())
    }

    /// Invert the physical step level from the next publish on.
    pub fn set_step_inverted(&mut self, inverted: bool) {
        self.config.lines.step_inverted = inverted;
        info!("Step line inverted -> {}", inverted);
    }

    /// Drive the logical enable line. Published immediately.
    pub fn set_enable(&mut self, enable: bool) {
        if self.output.enable != enable {
            info!("Driver enable -> {}", enable);
        }
        self.output.enable = enable;
        self.publish();
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// Tracked step position.
    #[inline]
    pub fn position(&self) -> StepPosition {
        self.tracker.current()
    }

    /// Duration of the last tick [µs].
    #[inline]
    pub fn last_tick_micros(&self) -> u32 {
        self.last_tick_us
    }

    /// Effective voltage of the last tick [mV].
    #[inline]
    pub fn voltage_mv(&self) -> f32 {
        self.mapper.voltage_mv()
    }

    /// Target step of the last tick.
    #[inline]
    pub fn target_step(&self) -> StepPosition {
        self.mapper.target()
    }

    /// Whether the startup homing run is still in progress.
    #[inline]
    pub fn is_homing(&self) -> bool {
        self.mapper.is_homing()
    }

    /// Current sequencer phase.
    #[inline]
    pub fn phase(&self) -> PulsePhase {
        self.sequencer.phase()
    }

    /// Logical outputs as last published.
    #[inline]
    pub fn output_state(&self) -> OutputState {
        self.output
    }

    /// Whether the driver is logically enabled.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.output.enable
    }

    /// Active configuration, including runtime changes.
    #[inline]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Ticks executed so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // ─── Collaborators ──────────────────────────────────────────────

    /// Analog source, e.g. to change a simulated input.
    pub fn analog_mut(&mut self) -> &mut A {
        &mut self.analog
    }

    /// Output sink.
    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    /// Clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepgate_common::gate::config::MotorConfig;
    use stepgate_hal::{SimAnalogInput, SimClock, SimOutputBank};

    type SimGate = StepDriverGate<SimAnalogInput, SimOutputBank, SimClock>;

    fn gate_with(config: GateConfig, raw: u16) -> SimGate {
        StepDriverGate::new(
            config,
            SimAnalogInput::raw(&config.analog, raw),
            SimOutputBank::new(),
            SimClock::default(),
        )
        .unwrap()
    }

    fn no_homing() -> GateConfig {
        GateConfig {
            motor: MotorConfig {
                homing: false,
                ..MotorConfig::default()
            },
            ..GateConfig::default()
        }
    }

    #[test]
    fn construction_configures_and_publishes() {
        let gate = gate_with(GateConfig::default(), 0);
        let lines = gate.config().lines;
        for line in lines.all() {
            assert!(gate.outputs().is_configured(line));
        }
        assert_eq!(gate.outputs().level(lines.step), Some(false));
        assert_eq!(gate.outputs().level(lines.direction), Some(false));
        assert_eq!(gate.outputs().level(lines.enable), Some(true));
        assert_eq!(gate.outputs().unconfigured_writes(), 0);
        assert_eq!(gate.position(), 200);
        assert!(gate.is_homing());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = GateConfig::default();
        config.pulse.frequency_hz = 0;
        let result = StepDriverGate::new(
            config,
            SimAnalogInput::raw(&config.analog, 0),
            SimOutputBank::new(),
            SimClock::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn idle_at_target_keeps_outputs() {
        // 5000 mV -> 200, already there.
        let mut gate = gate_with(no_homing(), 1023);
        let report = gate.tick();
        assert_eq!(report.target, 200);
        assert_eq!(report.direction, None);
        assert!(!report.output.signal);
        assert_eq!(gate.phase(), PulsePhase::Active);
    }

    #[test]
    fn first_step_timing() {
        let mut gate = gate_with(no_homing(), 0);
        let report = gate.tick();
        assert_eq!(report.direction, Some(Direction::Reverse));
        assert!(report.output.direction);

        gate.clock().set(19_999);
        assert!(!gate.tick().output.signal);
        gate.clock().set(20_000);
        assert!(gate.tick().output.signal);
        gate.clock().set(20_019);
        assert!(gate.tick().output.signal);
        gate.clock().set(20_020);
        assert!(!gate.tick().output.signal);
        assert_eq!(gate.phase(), PulsePhase::Pause);
        gate.clock().set(20_040);
        assert_eq!(gate.tick().position, 199);
    }

    #[test]
    fn stop_is_idempotent_and_keeps_position() {
        let mut gate = gate_with(no_homing(), 0);
        gate.tick();
        gate.clock().set(20_000);
        gate.tick();
        assert!(gate.output_state().signal);
        let phase = gate.phase();

        gate.stop();
        let after_first = (gate.output_state(), gate.position(), gate.phase());
        gate.stop();
        assert_eq!(
            (gate.output_state(), gate.position(), gate.phase()),
            after_first
        );
        assert!(!after_first.0.enable);
        assert!(!after_first.0.signal);
        assert_eq!(after_first.2, phase);

        let lines = gate.config().lines;
        assert_eq!(gate.outputs().level(lines.enable), Some(false));
        assert_eq!(gate.outputs().level(lines.step), Some(false));
    }

    #[test]
    fn disabled_gate_does_not_step() {
        let mut gate = gate_with(no_homing(), 0);
        gate.set_enable(false);
        for _ in 0..100 {
            gate.clock().advance(1_000);
            let report = gate.tick();
            assert_eq!(report.direction, None);
            assert!(!report.output.signal);
        }
        assert_eq!(gate.position(), 200);

        gate.set_enable(true);
        gate.tick();
        assert_eq!(gate.phase(), PulsePhase::Active);
        gate.clock().advance(20_000);
        assert!(gate.tick().output.signal);
    }

    #[test]
    fn polarity_applied_on_publish() {
        let mut config = no_homing();
        config.lines.step_inverted = true;
        config.lines.enable_active_low = true;
        let mut gate = gate_with(config, 0);
        let lines = gate.config().lines;
        assert_eq!(gate.outputs().level(lines.step), Some(true));
        assert_eq!(gate.outputs().level(lines.enable), Some(false));

        gate.tick();
        gate.clock().set(20_000);
        assert!(gate.tick().output.signal);
        assert_eq!(gate.outputs().level(lines.step), Some(false));

        gate.set_step_inverted(false);
        gate.tick();
        assert_eq!(gate.outputs().level(lines.step), Some(true));
    }

    #[test]
    fn setters_validate_and_apply() {
        let mut gate = gate_with(no_homing(), 1023);

        assert!(gate.set_frequency(0).is_err());
        assert_eq!(gate.config().pulse.frequency_hz, 50);
        gate.set_frequency(100).unwrap();
        assert_eq!(gate.config().pulse.frequency_hz, 100);

        assert!(gate.set_analog_range(1000.0, 1000.0).is_err());
        assert!(gate.set_analog_min(6000.0).is_err());
        assert!(gate.set_analog_max(100.0).is_err());
        gate.set_analog_range(0.0, 2500.0).unwrap();
        gate.set_analog_max(5000.0).unwrap();
        gate.set_analog_min(1000.0).unwrap();
        assert_eq!(gate.config().analog.min_mv, 1000.0);
        assert_eq!(gate.config().analog.max_mv, 5000.0);

        assert!(gate.set_max_steps(0).is_err());
        gate.set_max_steps(50).unwrap();
        assert_eq!(gate.position(), 50);
        assert_eq!(gate.tick().target, 50);

        gate.set_high_time(40);
        gate.set_low_time(60);
        assert_eq!(gate.config().pulse.high_time_us, 40);
        assert_eq!(gate.config().pulse.low_time_us, 60);
    }

    #[test]
    fn diagnostics_follow_input() {
        let mut gate = gate_with(no_homing(), 1023);
        gate.tick();
        assert_eq!(gate.voltage_mv(), 5000.0);
        assert_eq!(gate.target_step(), 200);
        assert_eq!(gate.ticks(), 1);
        assert_eq!(gate.last_tick_micros(), 0);

        gate.analog_mut().set_millivolts(2750.0);
        gate.tick();
        assert_eq!(gate.target_step(), 100);
    }
}
