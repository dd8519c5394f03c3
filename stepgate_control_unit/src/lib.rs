//! # StepGate Control Unit Library
//!
//! Non-blocking analog position follower for a step/direction/enable
//! stepper driver. Each tick samples an analog voltage, maps it onto a step
//! index and moves the motor one pulse cycle at a time towards it, without
//! ever sleeping or busy-waiting.
//!
//! ## Components
//!
//! 1. **PositionMapper** ([`mapper`]): raw sample → target step, with the
//!    startup homing run to step 0
//! 2. **PulseSequencer** ([`sequencer`]): timestamp-driven
//!    Active → Inactive → Pause pulse machine
//! 3. **PositionTracker** ([`tracker`]): authoritative step count
//! 4. **StepDriverGate** ([`gate`]): per-tick orchestrator over the
//!    collaborator traits
//! 5. **CycleRunner** ([`cycle`]): fixed-rate outer loop with RT setup
//!
//! ## Example
//!
//! ```rust
//! use stepgate_common::prelude::*;
//! use stepgate_control_unit::gate::StepDriverGate;
//! use stepgate_hal::{SimAnalogInput, SimClock, SimOutputBank};
//!
//! let config = GateConfig::default();
//! let mut gate = StepDriverGate::new(
//!     config,
//!     SimAnalogInput::constant_mv(&config.analog, 2750.0),
//!     SimOutputBank::new(),
//!     SimClock::default(),
//! )
//! .unwrap();
//!
//! // Homing: the first target is always 0.
//! assert_eq!(gate.tick().target, 0);
//! assert!(gate.is_homing());
//! ```

pub mod cycle;
pub mod gate;
pub mod mapper;
pub mod sequencer;
pub mod tracker;
