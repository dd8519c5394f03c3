//! Per-section configuration of a step-driver gate.
//!
//! All sections deserialize from TOML with defaults for every field and
//! reject unknown keys. `validate()` enforces the rules that keep the tick
//! path free of division by zero: frequency ≥ 1, a non-empty analog band,
//! at least one step.

use serde::{Deserialize, Serialize};

use super::error::GateError;
use crate::consts::{
    ANALOG_MAX_MV_DEFAULT, ANALOG_MIN_MV_DEFAULT, DIRECTION_LINE_DEFAULT, ENABLE_LINE_DEFAULT,
    FREQUENCY_HZ_DEFAULT, FREQUENCY_HZ_MIN, FULL_SCALE_COUNT_DEFAULT, FULL_SCALE_MV_DEFAULT,
    HIGH_TIME_US_DEFAULT, LOW_TIME_US_DEFAULT, MAX_STEPS_DEFAULT, MICROS_PER_SECOND,
    STEP_LINE_DEFAULT,
};
use crate::hal::LineId;

// ─── Pulse Timing ───────────────────────────────────────────────────

/// Step pulse timing.
///
/// # TOML Example
///
/// ```toml
/// [pulse]
/// frequency_hz = 50
/// high_time_us = 20
/// low_time_us = 20
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PulseTimingConfig {
    /// Step pulse frequency [Hz], at least 1.
    pub frequency_hz: u32,
    /// Minimum high time of the step line [µs].
    pub high_time_us: u32,
    /// Minimum low time after a pulse before the step commits [µs].
    pub low_time_us: u32,
}

impl Default for PulseTimingConfig {
    fn default() -> Self {
        Self {
            frequency_hz: FREQUENCY_HZ_DEFAULT,
            high_time_us: HIGH_TIME_US_DEFAULT,
            low_time_us: LOW_TIME_US_DEFAULT,
        }
    }
}

impl PulseTimingConfig {
    /// Build a validated timing configuration.
    pub fn new(frequency_hz: u32, high_time_us: u32, low_time_us: u32) -> Result<Self, GateError> {
        let timing = Self {
            frequency_hz,
            high_time_us,
            low_time_us,
        };
        timing.validate()?;
        Ok(timing)
    }

    /// Pulse period [µs] derived from the frequency.
    #[inline]
    pub fn period_us(&self) -> u32 {
        MICROS_PER_SECOND / self.frequency_hz.max(FREQUENCY_HZ_MIN)
    }

    /// Reject a zero frequency.
    pub fn validate(&self) -> Result<(), GateError> {
        validate_frequency(self.frequency_hz)
    }
}

/// Frequency rule shared by the loader and the runtime setter.
pub fn validate_frequency(frequency_hz: u32) -> Result<(), GateError> {
    if frequency_hz < FREQUENCY_HZ_MIN {
        return Err(GateError::invalid(
            "frequency_hz",
            format!("{frequency_hz} Hz is below the minimum of {FREQUENCY_HZ_MIN} Hz"),
        ));
    }
    Ok(())
}

// ─── Analog Mapping ─────────────────────────────────────────────────

/// Analog input scaling and the voltage band that maps onto the step range.
///
/// # TOML Example
///
/// ```toml
/// [analog]
/// full_scale_count = 1023
/// full_scale_mv = 5000.0
/// min_mv = 500.0
/// max_mv = 5000.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalogConfig {
    /// Highest raw sample value of the converter.
    pub full_scale_count: u16,
    /// Voltage represented by `full_scale_count` [mV].
    pub full_scale_mv: f32,
    /// Voltage mapped to step 0 [mV].
    pub min_mv: f32,
    /// Voltage mapped to `max_steps` [mV].
    pub max_mv: f32,
}

impl Default for AnalogConfig {
    fn default() -> Self {
        Self {
            full_scale_count: FULL_SCALE_COUNT_DEFAULT,
            full_scale_mv: FULL_SCALE_MV_DEFAULT,
            min_mv: ANALOG_MIN_MV_DEFAULT,
            max_mv: ANALOG_MAX_MV_DEFAULT,
        }
    }
}

impl AnalogConfig {
    /// Millivolts per step for the given step count.
    #[inline]
    pub fn step_resolution_mv(&self, max_steps: u32) -> f32 {
        (self.max_mv - self.min_mv) / max_steps as f32
    }

    /// Check converter scaling and the voltage band.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.full_scale_count == 0 {
            return Err(GateError::invalid("full_scale_count", "must be > 0"));
        }
        if !self.full_scale_mv.is_finite() || self.full_scale_mv <= 0.0 {
            return Err(GateError::invalid(
                "full_scale_mv",
                format!("{} mV must be finite and > 0", self.full_scale_mv),
            ));
        }
        validate_analog_band(self.min_mv, self.max_mv)
    }
}

/// Band rule shared by the loader and the runtime setters.
pub fn validate_analog_band(min_mv: f32, max_mv: f32) -> Result<(), GateError> {
    if !min_mv.is_finite() {
        return Err(GateError::invalid("min_mv", format!("{min_mv} is not finite")));
    }
    if !max_mv.is_finite() {
        return Err(GateError::invalid("max_mv", format!("{max_mv} is not finite")));
    }
    if max_mv <= min_mv {
        return Err(GateError::invalid(
            "max_mv",
            format!("max {max_mv} mV must be greater than min {min_mv} mV"),
        ));
    }
    Ok(())
}

// ─── Motor ──────────────────────────────────────────────────────────

/// Motor range and startup behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotorConfig {
    /// Steps per revolution; the tracked position lives in `[0, max_steps]`.
    pub max_steps: u32,
    /// Initial logical level of the enable line.
    pub enabled: bool,
    /// Run to the zero end-stop before following the analog input.
    pub homing: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS_DEFAULT,
            enabled: true,
            homing: true,
        }
    }
}

impl MotorConfig {
    /// Reject a zero step range.
    pub fn validate(&self) -> Result<(), GateError> {
        validate_max_steps(self.max_steps)
    }
}

/// Step-range rule shared by the loader and the runtime setter.
pub fn validate_max_steps(max_steps: u32) -> Result<(), GateError> {
    if max_steps == 0 {
        return Err(GateError::invalid("max_steps", "must be >= 1"));
    }
    Ok(())
}

// ─── Output Lines ───────────────────────────────────────────────────

/// Output line assignment and polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineConfig {
    /// Step pulse line.
    pub step: LineId,
    /// Direction line.
    pub direction: LineId,
    /// Driver enable line.
    pub enable: LineId,
    /// Write the step line inverted (active-low step input).
    pub step_inverted: bool,
    /// Write the enable line inverted (active-low enable input).
    pub enable_active_low: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            step: LineId(STEP_LINE_DEFAULT),
            direction: LineId(DIRECTION_LINE_DEFAULT),
            enable: LineId(ENABLE_LINE_DEFAULT),
            step_inverted: false,
            enable_active_low: false,
        }
    }
}

impl LineConfig {
    /// The three lines: step, direction, enable.
    pub fn all(&self) -> [LineId; 3] {
        [self.step, self.direction, self.enable]
    }

    /// Reject shared line ids.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.step == self.direction || self.step == self.enable {
            return Err(GateError::invalid(
                "step",
                format!("line {} is assigned twice", self.step),
            ));
        }
        if self.direction == self.enable {
            return Err(GateError::invalid(
                "direction",
                format!("line {} is assigned twice", self.direction),
            ));
        }
        Ok(())
    }
}

// ─── Aggregate ──────────────────────────────────────────────────────

/// Everything a gate needs at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Pulse timing.
    pub pulse: PulseTimingConfig,
    /// Analog mapping.
    pub analog: AnalogConfig,
    /// Motor range and startup.
    pub motor: MotorConfig,
    /// Output lines.
    pub lines: LineConfig,
}

impl GateConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), GateError> {
        self.pulse.validate()?;
        self.analog.validate()?;
        self.motor.validate()?;
        self.lines.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn period_from_frequency() {
        assert_eq!(PulseTimingConfig::default().period_us(), 20_000);
        let fast = PulseTimingConfig::new(1_000, 20, 20).unwrap();
        assert_eq!(fast.period_us(), 1_000);
    }

    #[test]
    fn zero_frequency_rejected() {
        let err = PulseTimingConfig::new(0, 20, 20).unwrap_err();
        assert_eq!(err.field(), "frequency_hz");
    }

    #[test]
    fn equal_band_rejected() {
        let analog = AnalogConfig {
            min_mv: 1000.0,
            max_mv: 1000.0,
            ..Default::default()
        };
        assert_eq!(analog.validate().unwrap_err().field(), "max_mv");
    }

    #[test]
    fn inverted_band_rejected() {
        assert!(validate_analog_band(3000.0, 1000.0).is_err());
        assert!(validate_analog_band(f32::NAN, 1000.0).is_err());
        assert!(validate_analog_band(0.0, 1.0).is_ok());
    }

    #[test]
    fn zero_full_scale_rejected() {
        let analog = AnalogConfig {
            full_scale_count: 0,
            ..Default::default()
        };
        assert_eq!(analog.validate().unwrap_err().field(), "full_scale_count");
    }

    #[test]
    fn step_resolution_default() {
        let analog = AnalogConfig::default();
        assert!((analog.step_resolution_mv(200) - 22.5).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_max_steps_rejected() {
        let motor = MotorConfig {
            max_steps: 0,
            ..Default::default()
        };
        assert!(motor.validate().is_err());
    }

    #[test]
    fn duplicate_lines_rejected() {
        let lines = LineConfig {
            direction: LineId(STEP_LINE_DEFAULT),
            ..Default::default()
        };
        assert_eq!(lines.validate().unwrap_err().field(), "step");

        let lines = LineConfig {
            enable: LineId(DIRECTION_LINE_DEFAULT),
            ..Default::default()
        };
        assert_eq!(lines.validate().unwrap_err().field(), "direction");
    }
}
