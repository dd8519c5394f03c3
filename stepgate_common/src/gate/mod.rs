//! Step-driver gate shared types.
//!
//! Types shared between the control unit, the simulation HAL and
//! configuration loading: directions, pulse phases, output levels,
//! per-section configuration and the configuration error type.

pub mod config;
pub mod error;
pub mod types;
