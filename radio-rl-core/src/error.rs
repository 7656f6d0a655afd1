//! Errors in the library.
use thiserror::Error;

/// Errors raised by environments, replay buffers, agents and records.
///
/// Trait methods return [`anyhow::Result`]; callers that need to branch on
/// the cause can recover this type with `downcast_ref::<RadioRlError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RadioRlError {
    /// The length of a state, action or batch row does not match the expected one.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the offending quantity.
        what: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The replay buffer holds fewer transitions than requested.
    #[error("insufficient samples: required {required}, available {available}")]
    InsufficientSamples {
        /// Requested batch size.
        required: usize,
        /// Number of stored transitions.
        available: usize,
    },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A non-finite value was produced.
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl RadioRlError {
    /// Returns [`RadioRlError::DimensionMismatch`] if `actual != expected`.
    pub fn check_dim(what: &str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch {
                what: what.to_string(),
                expected,
                actual,
            })
        }
    }

    /// Returns [`RadioRlError::NumericDomain`] if `value` is NaN or infinite.
    pub fn check_finite(what: &str, value: f64) -> Result<f64, Self> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NumericDomain(format!("{} is not finite ({})", what, value)))
        }
    }
}
