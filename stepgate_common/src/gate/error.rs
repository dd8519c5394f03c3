//! Gate error type.
//!
//! The taxonomy is deliberately narrow: the tick path has no failure
//! modes, so the only error is a configuration value that would make the
//! per-tick arithmetic undefined (division by zero, inverted range).

use thiserror::Error;

/// Errors raised when configuring a step-driver gate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    /// A configuration value was rejected.
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfiguration {
        /// Name of the rejected field.
        field: &'static str,
        /// Human-readable rejection reason.
        reason: String,
    },
}

impl GateError {
    /// Shorthand constructor for [`GateError::InvalidConfiguration`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { field, .. } => field,
        }
    }
}
