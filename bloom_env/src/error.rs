//! Error types shared by every Ebb & Bloom crate.

use thiserror::Error;

/// Errors raised by the genesis core and its harness.
///
/// The numerical engines only ever raise [`BloomError::InvalidParameter`].
/// Physical edge cases (extinction, close encounters, sterile systems) are
/// valid outcomes and never surface here.
#[derive(Debug, Error)]
pub enum BloomError {
    /// A parameter was out of its admissible range (negative rate, `dt <= 0`, ...)
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    /// Harness configuration could not be loaded or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Export or config file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BloomError {
    /// Creates an invalid-parameter error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(msg: impl std::fmt::Display) -> Self {
        Self::Config(msg.to_string())
    }

    /// Returns true for [`BloomError::InvalidParameter`].
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

/// Result alias used across the workspace.
pub type BloomResult<T> = Result<T, BloomError>;

/// Fails unless `value` is finite and strictly positive.
pub fn ensure_positive(name: &'static str, value: f64) -> BloomResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(BloomError::invalid(name, format!("must be finite and > 0, got {}", value)))
    }
}

/// Fails unless `value` is finite and not negative.
pub fn ensure_non_negative(name: &'static str, value: f64) -> BloomResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(BloomError::invalid(name, format!("must be finite and >= 0, got {}", value)))
    }
}

/// Fails unless `value` is finite.
pub fn ensure_finite(name: &'static str, value: f64) -> BloomResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BloomError::invalid(name, format!("must be finite, got {}", value)))
    }
}
