//! Analog sample → target step mapping, with startup homing.
//!
//! ## Mapping
//!
//! ```text
//! voltage    = linear_map(raw, 0, full_scale_count, 0, full_scale_mv)
//! resolution = (max_mv − min_mv) / max_steps          [mV per step]
//! target     = floor((voltage − min_mv) / resolution)  if min_mv ≤ voltage ≤ max_mv
//!            = 0                                       otherwise
//! ```
//!
//! The resolution is recomputed on every call so configuration changes take
//! effect on the next tick. A voltage outside the band is not an error: the
//! target falls back to step 0, retreating towards the home end.
//!
//! ## Homing
//!
//! While homing, the voltage is overridden to 0 regardless of the sample,
//! which drives the target to 0. The flag clears permanently the first time
//! the tracked position is observed at 0.

use stepgate_common::gate::config::AnalogConfig;
use stepgate_common::gate::types::StepPosition;
use tracing::info;

/// Linear interpolation of `x` from `[in_min, in_max]` onto `[out_min, out_max]`.
#[inline]
pub fn linear_map(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (x - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Convert a raw converter sample to millivolts.
#[inline]
pub fn raw_to_millivolts(raw: u16, analog: &AnalogConfig) -> f32 {
    linear_map(
        raw as f32,
        0.0,
        analog.full_scale_count as f32,
        0.0,
        analog.full_scale_mv,
    )
}

/// Target step for a voltage, 0 outside `[min_mv, max_mv]`.
pub fn target_for_voltage(voltage_mv: f32, analog: &AnalogConfig, max_steps: u32) -> StepPosition {
    if !(analog.min_mv..=analog.max_mv).contains(&voltage_mv) {
        return 0;
    }
    let resolution = analog.step_resolution_mv(max_steps);
    let steps = ((voltage_mv - analog.min_mv) / resolution).floor();
    // Float-to-int casts saturate; the min() keeps the top of the band in range.
    (steps as StepPosition).min(max_steps)
}

/// Per-tick target computation with the one-time homing phase.
#[derive(Debug, Clone)]
pub struct PositionMapper {
    /// Homing still in progress.
    homing: bool,
    /// Effective voltage of the last mapping [mV].
    voltage_mv: f32,
    /// Result of the last mapping.
    target: StepPosition,
}

impl PositionMapper {
    /// Mapper that homes first when `homing` is set.
    pub fn new(homing: bool) -> Self {
        Self {
            homing,
            voltage_mv: 0.0,
            target: 0,
        }
    }

    /// Whether the homing phase is still running.
    #[inline]
    pub fn is_homing(&self) -> bool {
        self.homing
    }

    /// Effective voltage used by the last mapping [mV].
    #[inline]
    pub fn voltage_mv(&self) -> f32 {
        self.voltage_mv
    }

    /// Target produced by the last mapping.
    #[inline]
    pub fn target(&self) -> StepPosition {
        self.target
    }

    /// Map one raw sample to a target step.
    ///
    /// `position` is the currently tracked position; it only matters while
    /// homing, to detect arrival at the end-stop.
    pub fn map(
        &mut self,
        raw: u16,
        analog: &AnalogConfig,
        max_steps: u32,
        position: StepPosition,
    ) -> StepPosition {
        let mut voltage = raw_to_millivolts(raw, analog);

        if self.homing {
            voltage = 0.0;
            if position == 0 {
                self.homing = false;
                info!("Homing complete, following analog input");
            }
        }

        self.voltage_mv = voltage;
        self.target = target_for_voltage(voltage, analog, max_steps);
        self.target
    }
}
