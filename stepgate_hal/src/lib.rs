//! # StepGate HAL Library
//!
//! Collaborator implementations for the step-driver gate.
//!
//! The gate consumes three narrow traits from `stepgate_common::hal`:
//! an analog sample source, a digital output sink and a free-running
//! microsecond clock. This crate provides software implementations of all
//! three so the control unit can run and be tested without hardware.
//!
//! # Module Structure
//!
//! - [`drivers::simulation`] - Simulated analog source, output bank with a
//!   stepper-driver model, manually advanced clock
//! - [`drivers::system_clock`] - `Instant`-backed microsecond clock
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 stepgate_control_unit (gate)                 │
//! └───────┬──────────────────────┬───────────────────────┬───────┘
//!         │ AnalogInput          │ DigitalOutput         │ MonotonicClock
//!         ▼                      ▼                       ▼
//! ┌───────────────┐   ┌────────────────────────┐  ┌──────────────┐
//! │ SimAnalogInput│   │ SimOutputBank          │  │ SimClock /   │
//! │ (waveform)    │   │  └─ StepperModel       │  │ SystemClock  │
//! └───────────────┘   └────────────────────────┘  └──────────────┘
//! ```

#![deny(missing_docs)]

pub mod drivers;

pub use crate::drivers::simulation::{
    AnalogWaveform, SimAnalogInput, SimClock, SimOutputBank, StepperModel,
};
pub use crate::drivers::system_clock::SystemClock;
