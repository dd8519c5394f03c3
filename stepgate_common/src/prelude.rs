//! Prelude module for common re-exports.
//!
//! ```rust
//! use stepgate_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, LogLevel, RunnerConfig, SharedConfig, StepGateConfig, load_config,
};
pub use crate::gate::config::{
    AnalogConfig, GateConfig, LineConfig, MotorConfig, PulseTimingConfig,
};

// ─── Gate Types ─────────────────────────────────────────────────────
pub use crate::gate::error::GateError;
pub use crate::gate::types::{
    Direction, Edge, OutputState, PulseLevels, PulsePhase, StepPosition,
};

// ─── Collaborators ──────────────────────────────────────────────────
pub use crate::hal::{AnalogInput, DigitalOutput, LineId, MonotonicClock};
pub use crate::time::Micros;
