//! Error types for state file I/O.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors from reading, validating, or writing `.wo` state files.
#[derive(Debug)]
pub enum StateError {
    /// The file could not be opened.
    BadFile {
        /// The offending path.
        path: PathBuf,
        /// The underlying open error.
        source: io::Error,
    },
    /// The file is shorter than its header promises.
    Truncated {
        /// Bytes required by the header.
        expected: u64,
        /// Bytes actually present.
        actual: u64,
    },
    /// The file is longer than its header promises.
    TrailingData {
        /// Bytes required by the header.
        expected: u64,
        /// Bytes actually present.
        actual: u64,
    },
    /// The dimensionality field is not 2.
    UnsupportedDim {
        /// The dimensionality found in the header.
        found: u64,
    },
    /// The extents describe a domain with an empty interior.
    DomainTooSmall {
        /// Row extent found.
        rows: u64,
        /// Column extent found.
        cols: u64,
    },
    /// The header fields are structurally unusable (overflowing extents,
    /// negative damping, and similar).
    InvalidHeader {
        /// Human-readable description of what is wrong.
        detail: String,
    },
    /// The atomic rename could not complete even after one retry. The
    /// previous destination file, if any, is left untouched.
    CheckpointFailed {
        /// The destination path.
        path: PathBuf,
        /// The second rename's error.
        source: io::Error,
    },
    /// Any other I/O failure during read or write.
    Io(io::Error),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadFile { path, source } => {
                write!(f, "cannot open state file {}: {source}", path.display())
            }
            Self::Truncated { expected, actual } => {
                write!(f, "state file truncated: need {expected} bytes, found {actual}")
            }
            Self::TrailingData { expected, actual } => {
                write!(
                    f,
                    "state file has trailing data: expected {expected} bytes, found {actual}"
                )
            }
            Self::UnsupportedDim { found } => {
                write!(f, "unsupported dimensionality {found} (only 2D is supported)")
            }
            Self::DomainTooSmall { rows, cols } => {
                write!(f, "domain {rows}x{cols} has no interior (need at least 3x3)")
            }
            Self::InvalidHeader { detail } => write!(f, "invalid state header: {detail}"),
            Self::CheckpointFailed { path, source } => {
                write!(
                    f,
                    "checkpoint rename to {} failed after retry: {source}",
                    path.display()
                )
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BadFile { source, .. } | Self::CheckpointFailed { source, .. } => Some(source),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StateError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
