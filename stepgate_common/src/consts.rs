//! System-wide constants for the StepGate workspace.
//!
//! Single source of truth for defaults and numeric limits.
//! Imported by all crates; no duplication permitted.

/// Microseconds per second, used to derive the pulse period.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// Default steps per revolution (MaxSteps).
pub const MAX_STEPS_DEFAULT: u32 = 200;

/// Default step pulse frequency [Hz].
pub const FREQUENCY_HZ_DEFAULT: u32 = 50;

/// Lowest accepted step pulse frequency [Hz].
pub const FREQUENCY_HZ_MIN: u32 = 1;

/// Default minimum high time of a step pulse [µs].
pub const HIGH_TIME_US_DEFAULT: u32 = 20;

/// Default minimum low time after a step pulse [µs].
pub const LOW_TIME_US_DEFAULT: u32 = 20;

/// Full-scale count of the default 10-bit ADC.
pub const FULL_SCALE_COUNT_DEFAULT: u16 = 1023;

/// Voltage represented by the full-scale count [mV].
pub const FULL_SCALE_MV_DEFAULT: f32 = 5000.0;

/// Default lower analog threshold [mV].
pub const ANALOG_MIN_MV_DEFAULT: f32 = 500.0;

/// Default upper analog threshold [mV].
pub const ANALOG_MAX_MV_DEFAULT: f32 = 5000.0;

/// Default scheduler tick period [µs].
pub const TICK_PERIOD_US_DEFAULT: u32 = 10;

/// Default number of ticks between runner status log lines.
pub const STATUS_INTERVAL_DEFAULT: u64 = 100_000;

/// Default line id of the step output.
pub const STEP_LINE_DEFAULT: u8 = 3;

/// Default line id of the direction output.
pub const DIRECTION_LINE_DEFAULT: u8 = 4;

/// Default line id of the enable output.
pub const ENABLE_LINE_DEFAULT: u8 = 5;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/stepgate.toml";
