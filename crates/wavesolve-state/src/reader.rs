//! Reading and validating `.wo` state files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use wavesolve_core::{Extents, WaveGrid};

use crate::codec::{read_f64_le, read_f64_slice, read_u64_le};
use crate::error::StateError;
use crate::{header_len, DIMENSIONS};

/// The decoded fixed-size header of a state file.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Extents in row-major order; exactly two entries once validated.
    pub extents: Extents,
    /// Damping coefficient γ (disk field name `c`).
    pub damping: f64,
    /// Simulated time (elapsed or remaining, per driver convention).
    pub time: f64,
}

impl Header {
    /// Row extent.
    pub fn rows(&self) -> u64 {
        self.extents[0]
    }

    /// Column extent.
    pub fn cols(&self) -> u64 {
        self.extents[1]
    }

    /// Total cell count, or an error if it overflows.
    pub fn cells(&self) -> Result<u64, StateError> {
        self.rows()
            .checked_mul(self.cols())
            .ok_or_else(|| StateError::InvalidHeader {
                detail: format!("extents {}x{} overflow", self.rows(), self.cols()),
            })
    }

    /// Byte length a file with this header must have.
    pub fn expected_file_len(&self) -> Result<u64, StateError> {
        self.cells()?
            .checked_mul(16)
            .and_then(|b| b.checked_add(header_len(DIMENSIONS)))
            .ok_or_else(|| StateError::InvalidHeader {
                detail: format!("extents {}x{} overflow", self.rows(), self.cols()),
            })
    }
}

/// Decode and validate the header from a readable stream.
///
/// # Errors
///
/// `UnsupportedDim` when N != 2, `DomainTooSmall` when either extent is
/// below 3, `Truncated` on a short header (the byte counts are reported by
/// the caller, which knows the file size).
pub fn read_header(r: &mut dyn Read) -> Result<Header, StateError> {
    let dims = read_u64_le(r)?;
    if dims != DIMENSIONS {
        return Err(StateError::UnsupportedDim { found: dims });
    }
    let mut extents = Extents::new();
    for _ in 0..dims {
        extents.push(read_u64_le(r)?);
    }
    let damping = read_f64_le(r)?;
    let time = read_f64_le(r)?;

    let header = Header {
        extents,
        damping,
        time,
    };
    if header.rows() < 3 || header.cols() < 3 {
        return Err(StateError::DomainTooSmall {
            rows: header.rows(),
            cols: header.cols(),
        });
    }
    header.cells()?;
    Ok(header)
}

/// Load a complete state file into a [`WaveGrid`].
///
/// The file's byte length must equal exactly `24 + 8N + 16·rows·cols`;
/// short files are `Truncated`, oversize files are `TrailingData`.
pub fn read_state(path: &Path) -> Result<WaveGrid, StateError> {
    let file = File::open(path).map_err(|source| StateError::BadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let actual_len = file.metadata()?.len();
    let mut r = BufReader::new(file);

    let header = read_header(&mut r).map_err(|e| match e {
        // A header cut short manifests as an unexpected EOF.
        StateError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            StateError::Truncated {
                expected: header_len(DIMENSIONS),
                actual: actual_len,
            }
        }
        other => other,
    })?;

    let expected_len = header.expected_file_len()?;
    if actual_len < expected_len {
        return Err(StateError::Truncated {
            expected: expected_len,
            actual: actual_len,
        });
    }
    if actual_len > expected_len {
        return Err(StateError::TrailingData {
            expected: expected_len,
            actual: actual_len,
        });
    }

    let cells = header.cells()? as usize;
    let u = read_f64_slice(&mut r, cells)?;
    let v = read_f64_slice(&mut r, cells)?;

    WaveGrid::new(
        header.rows(),
        header.cols(),
        header.damping,
        header.time,
        u,
        v,
    )
    .map_err(|e| StateError::InvalidHeader {
        detail: e.to_string(),
    })
}
