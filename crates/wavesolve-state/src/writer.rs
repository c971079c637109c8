//! Writing `.wo` state files, plainly or atomically.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use wavesolve_core::WaveGrid;

use crate::codec::{write_f64_le, write_f64_slice, write_u64_le};
use crate::error::StateError;

/// Serialise the grid to `path`, fsyncing before return.
///
/// This overwrites in place and is *not* atomic; checkpoint paths go
/// through [`write_state_atomic`].
pub fn write_state(grid: &WaveGrid, path: &Path) -> Result<(), StateError> {
    let file = File::create(path).map_err(|source| StateError::BadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut w = BufWriter::new(file);

    write_u64_le(&mut w, grid.extents().len() as u64)?;
    for &m in grid.extents().iter() {
        write_u64_le(&mut w, m)?;
    }
    write_f64_le(&mut w, grid.damping())?;
    write_f64_le(&mut w, grid.time())?;
    write_f64_slice(&mut w, grid.u())?;
    write_f64_slice(&mut w, grid.v())?;

    let file = w.into_inner().map_err(|e| StateError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}

/// The temporary sibling used during atomic writes: `<path>.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Serialise the grid to `<path>.tmp` and rename it over `path`.
///
/// If the rename fails, the existing destination is removed and the rename
/// retried once. A second failure surfaces as `CheckpointFailed` with the
/// temp file cleaned up; whatever was previously at `path` is not
/// corrupted (the content only ever arrives via rename).
pub fn write_state_atomic(grid: &WaveGrid, path: &Path) -> Result<(), StateError> {
    let tmp = tmp_path(path);
    if let Err(e) = write_state(grid, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(first) => {
            log::warn!(
                "rename of {} over {} failed ({first}); removing destination and retrying",
                tmp.display(),
                path.display()
            );
            let _ = fs::remove_file(path);
            fs::rename(&tmp, path).map_err(|source| {
                let _ = fs::remove_file(&tmp);
                StateError::CheckpointFailed {
                    path: path.to_path_buf(),
                    source,
                }
            })
        }
    }
}
