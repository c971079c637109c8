//! Error types for grid construction.

use std::error::Error;
use std::fmt;

/// Errors detected while constructing or validating a [`WaveGrid`](crate::WaveGrid).
#[derive(Clone, Debug, PartialEq)]
pub enum GridError {
    /// The interior would be empty: both extents must be at least 3.
    DomainTooSmall {
        /// Row extent found.
        rows: u64,
        /// Column extent found.
        cols: u64,
    },
    /// A field buffer does not match `rows * cols`.
    SizeMismatch {
        /// Which field ("displacement" or "velocity").
        field: &'static str,
        /// Expected cell count.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },
    /// The damping coefficient is negative or not finite.
    InvalidDamping {
        /// The rejected value.
        value: f64,
    },
    /// The simulated time is negative or not finite.
    InvalidTime {
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainTooSmall { rows, cols } => {
                write!(f, "domain {rows}x{cols} has no interior (need at least 3x3)")
            }
            Self::SizeMismatch {
                field,
                expected,
                actual,
            } => {
                write!(f, "{field} field has {actual} cells, expected {expected}")
            }
            Self::InvalidDamping { value } => {
                write!(f, "damping coefficient must be finite and >= 0, got {value}")
            }
            Self::InvalidTime { value } => {
                write!(f, "simulated time must be finite and >= 0, got {value}")
            }
        }
    }
}

impl Error for GridError {}
