//! Collective positional I/O on shared state files.
//!
//! rsmpi exposes no MPI-IO bindings, so the collective file operations
//! are realised with per-rank positional reads/writes on the shared
//! filesystem, fenced by collectives: every rank reads its own slab, and
//! on write rank 0 lays down the header and pre-sizes the temp file (the
//! broadcast of that outcome orders it before the slab writes), every
//! rank writes exactly its real rows at their byte offsets, and an
//! all-reduce folds the write outcomes before rank 0 performs the atomic
//! rename (with one retry, as everywhere else) and broadcasts its result
//! so all ranks agree on success.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader};
use std::os::unix::fs::FileExt;
use std::path::Path;

use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use wavesolve_state::codec::{read_f64_slice, write_f64_le, write_f64_slice, write_u64_le};
use wavesolve_state::writer::tmp_path;
use wavesolve_state::{read_header, Header, StateError};

use crate::domain::DomainLayout;

/// Byte offset of a row of the displacement field.
fn u_offset(header: &Header, row: u64) -> u64 {
    wavesolve_state::header_len(wavesolve_state::DIMENSIONS) + 8 * (row * header.cols())
}

/// Byte offset of a row of the velocity field.
fn v_offset(header: &Header, row: u64) -> Result<u64, StateError> {
    Ok(wavesolve_state::header_len(wavesolve_state::DIMENSIONS)
        + 8 * (header.cells()? + row * header.cols()))
}

/// Read and validate the header; every rank calls this independently
/// (the read-at-all of the original protocol).
pub fn read_shared_header(path: &Path) -> Result<Header, StateError> {
    let file = File::open(path).map_err(|source| StateError::BadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let actual = file.metadata()?.len();
    let header = read_header(&mut BufReader::new(file))?;
    let expected = header.expected_file_len()?;
    if actual < expected {
        return Err(StateError::Truncated { expected, actual });
    }
    if actual > expected {
        return Err(StateError::TrailingData { expected, actual });
    }
    Ok(header)
}

/// Read exactly this rank's real rows into a fresh slab of both fields.
///
/// Halo rows come back zeroed; the first halo exchange fills them before
/// anything reads them.
pub fn read_slab(
    path: &Path,
    header: &Header,
    layout: &DomainLayout,
) -> Result<(Vec<f64>, Vec<f64>), StateError> {
    let file = File::open(path).map_err(|source| StateError::BadFile {
        path: path.to_path_buf(),
        source,
    })?;
    if layout.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let cols = layout.cols as usize;
    let real_cells = layout.real_rows() as usize * cols;
    let skip = layout.real_offset_rows() * cols;
    let mut read_field = |offset: u64| -> Result<Vec<f64>, StateError> {
        let mut bytes = vec![0u8; real_cells * 8];
        file.read_exact_at(&mut bytes, offset)?;
        let real = read_f64_slice(&mut bytes.as_slice(), real_cells)?;
        let mut slab = vec![0.0; layout.slab_cells()];
        slab[skip..skip + real_cells].copy_from_slice(&real);
        Ok(slab)
    };
    let u = read_field(u_offset(header, layout.real_first))?;
    let v = read_field(v_offset(header, layout.real_first)?)?;
    Ok((u, v))
}

/// Collectively write a complete state file, atomically.
///
/// `time` is whatever the calling driver tracks in the header's `t` slot
/// (remaining time for this engine). Returns the same result on every
/// rank.
pub fn write_state_collective(
    world: &SimpleCommunicator,
    path: &Path,
    header: &Header,
    u: &[f64],
    v: &[f64],
    time: f64,
    layout: &DomainLayout,
) -> Result<(), StateError> {
    let tmp = tmp_path(path);
    let root = world.process_at_rank(0);
    let rank0 = world.rank() == 0;

    // Rank 0 lays down the header and pre-sizes the file so positional
    // writes never race file growth.
    let mut prepared: u8 = 1;
    if rank0 {
        prepared = match prepare_tmp(&tmp, header, time) {
            Ok(()) => 1,
            Err(e) => {
                log::warn!("checkpoint header write to {} failed: {e}", tmp.display());
                0
            }
        };
    }
    root.broadcast_into(&mut prepared);
    if prepared == 0 {
        return Err(StateError::CheckpointFailed {
            path: path.to_path_buf(),
            source: io::Error::other("header write failed on rank 0"),
        });
    }

    let mut wrote: u8 = 1;
    if !layout.is_empty() {
        wrote = match write_real_rows(&tmp, header, u, v, layout) {
            Ok(()) => 1,
            Err(e) => {
                log::warn!("rank {} slab write failed: {e}", layout.rank);
                0
            }
        };
    }
    // Everyone must have finished writing before the rename; fold the
    // per-rank outcomes so all ranks agree.
    let mut all_wrote: u8 = 0;
    world.all_reduce_into(&wrote, &mut all_wrote, mpi::collective::SystemOperation::min());
    if all_wrote == 0 {
        if rank0 {
            let _ = std::fs::remove_file(&tmp);
        }
        return Err(StateError::CheckpointFailed {
            path: path.to_path_buf(),
            source: io::Error::other("slab write failed on some rank"),
        });
    }

    let mut renamed: u8 = 1;
    if rank0 {
        renamed = match rename_with_retry(&tmp, path) {
            Ok(()) => 1,
            Err(e) => {
                log::warn!("checkpoint rename to {} failed: {e}", path.display());
                0
            }
        };
    }
    root.broadcast_into(&mut renamed);
    if renamed == 0 {
        return Err(StateError::CheckpointFailed {
            path: path.to_path_buf(),
            source: io::Error::other("rename failed on rank 0"),
        });
    }
    Ok(())
}

fn prepare_tmp(tmp: &Path, header: &Header, time: f64) -> Result<(), StateError> {
    let mut file = File::create(tmp).map_err(|source| StateError::BadFile {
        path: tmp.to_path_buf(),
        source,
    })?;
    write_u64_le(&mut file, header.extents.len() as u64)?;
    for &m in header.extents.iter() {
        write_u64_le(&mut file, m)?;
    }
    write_f64_le(&mut file, header.damping)?;
    write_f64_le(&mut file, time)?;
    file.set_len(header.expected_file_len()?)?;
    file.sync_all()?;
    Ok(())
}

fn write_real_rows(
    tmp: &Path,
    header: &Header,
    u: &[f64],
    v: &[f64],
    layout: &DomainLayout,
) -> Result<(), StateError> {
    let file = OpenOptions::new().write(true).open(tmp)?;
    let cols = layout.cols as usize;
    let skip = layout.real_offset_rows() * cols;
    let count = layout.real_rows() as usize * cols;

    let mut bytes = Vec::with_capacity(count * 8);
    write_f64_slice(&mut bytes, &u[skip..skip + count])?;
    file.write_all_at(&bytes, u_offset(header, layout.real_first))?;

    bytes.clear();
    write_f64_slice(&mut bytes, &v[skip..skip + count])?;
    file.write_all_at(&bytes, v_offset(header, layout.real_first)?)?;

    file.sync_all()?;
    Ok(())
}

fn rename_with_retry(tmp: &Path, path: &Path) -> Result<(), StateError> {
    match std::fs::rename(tmp, path) {
        Ok(()) => Ok(()),
        Err(first) => {
            log::warn!(
                "rename of {} over {} failed ({first}); removing destination and retrying",
                tmp.display(),
                path.display()
            );
            let _ = std::fs::remove_file(path);
            std::fs::rename(tmp, path).map_err(|source| {
                let _ = std::fs::remove_file(tmp);
                StateError::CheckpointFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
    }
}
