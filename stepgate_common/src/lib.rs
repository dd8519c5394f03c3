//! StepGate Common Library
//!
//! Shared constants, configuration loading and the narrow collaborator
//! interfaces used by every StepGate crate.
//!
//! # Module Structure
//!
//! - [`consts`] - Defaults and limits (single source of truth)
//! - [`config`] - TOML configuration file, loader trait and errors
//! - [`gate`] - Step-driver gate types, section configs and errors
//! - [`hal`] - Collaborator traits (analog input, digital output, clock)
//! - [`time`] - Wraparound-safe microsecond timestamps
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use stepgate_common::prelude::*;
//!
//! let timing = PulseTimingConfig::default();
//! assert_eq!(timing.period_us(), 20_000);
//! ```

pub mod config;
pub mod consts;
pub mod gate;
pub mod hal;
pub mod prelude;
pub mod time;
