//! Configuration loading traits and types.
//!
//! This module provides the TOML configuration file of a StepGate
//! process and a standardized way to load it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use stepgate_common::config::{load_config, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = load_config(Path::new("config/stepgate.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{STATUS_INTERVAL_DEFAULT, TICK_PERIOD_US_DEFAULT};
use crate::gate::config::{AnalogConfig, GateConfig, LineConfig, MotorConfig, PulseTimingConfig};
use crate::gate::error::GateError;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<GateError> for ConfigError {
    fn from(e: GateError) -> Self {
        Self::ValidationError(e.to_string())
    }
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-tick edge tracing.
    Trace,
    /// Debug information (reversals, rejected settings).
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common fields shared by every StepGate process.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "stepgate-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "stepgate".to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outer scheduling loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Interval between ticks [µs].
    pub tick_period_us: u32,
    /// Ticks between status log lines (0 disables status logging).
    pub status_interval: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_period_us: TICK_PERIOD_US_DEFAULT,
            status_interval: STATUS_INTERVAL_DEFAULT,
        }
    }
}

impl RunnerConfig {
    /// Reject a zero tick period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_us == 0 {
            return Err(ConfigError::ValidationError(
                "tick_period_us must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete StepGate configuration file.
///
/// Every section is optional and falls back to defaults.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "stepgate-01"
///
/// [pulse]
/// frequency_hz = 50
///
/// [analog]
/// min_mv = 500.0
/// max_mv = 5000.0
///
/// [motor]
/// max_steps = 200
///
/// [lines]
/// step = 3
/// direction = 4
/// enable = 5
///
/// [runner]
/// tick_period_us = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepGateConfig {
    /// Shared process settings.
    pub shared: SharedConfig,
    /// Pulse timing.
    pub pulse: PulseTimingConfig,
    /// Analog mapping.
    pub analog: AnalogConfig,
    /// Motor range and startup.
    pub motor: MotorConfig,
    /// Output lines.
    pub lines: LineConfig,
    /// Scheduling loop.
    pub runner: RunnerConfig,
}

impl StepGateConfig {
    /// The gate-facing sections.
    pub fn gate(&self) -> GateConfig {
        GateConfig {
            pulse: self.pulse,
            analog: self.analog,
            motor: self.motor,
            lines: self.lines,
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.gate().validate()?;
        self.runner.validate()?;
        Ok(())
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

/// Load and validate a StepGate configuration file.
pub fn load_config(path: &Path) -> Result<StepGateConfig, ConfigError> {
    let config = StepGateConfig::load(path)?;
    config.validate()?;
    tracing::debug!(
        "Loaded {} (max_steps={}, {} Hz)",
        path.display(),
        config.motor.max_steps,
        config.pulse.frequency_hz
    );
    Ok(config)
}
