//! Wall-clock checkpoint cadence and the two-file checkpoint write.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use wavesolve_core::WaveGrid;
use wavesolve_state::{snapshot_name, write_state_atomic};

/// Decides, from wall-clock time alone, when a periodic checkpoint is due.
///
/// The "last checkpoint" timestamp starts at construction (driver start),
/// so the first checkpoint lands one full interval into the run.
#[derive(Debug)]
pub struct CheckpointPolicy {
    interval: Option<Duration>,
    last: Instant,
}

impl CheckpointPolicy {
    /// A policy writing every `interval`; `None` never writes.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// A policy that never writes.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// True when at least one interval has elapsed since the last `true`
    /// return (or since construction). Resets the timestamp on `true`.
    pub fn should_write(&mut self) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let now = Instant::now();
        if now.duration_since(self.last) >= interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Where the snapshot for simulated time `t` lives: beside the canonical
/// output.
pub fn snapshot_path(output: &Path, t: f64) -> PathBuf {
    match output.parent() {
        Some(dir) => dir.join(snapshot_name(t)),
        None => snapshot_name(t).into(),
    }
}

/// Write the canonical output plus a time-stamped snapshot next to it.
///
/// Both writes are atomic. Failures are logged and swallowed: losing a
/// periodic checkpoint is strictly preferable to aborting a long run.
pub fn write_checkpoint(grid: &WaveGrid, output: &Path) {
    if let Err(e) = write_state_atomic(grid, output) {
        log::warn!("periodic checkpoint to {} failed: {e}", output.display());
        return;
    }
    let snapshot = snapshot_path(output, grid.time());
    if let Err(e) = write_state_atomic(grid, &snapshot) {
        log::warn!("snapshot write to {} failed: {e}", snapshot.display());
    }
}
