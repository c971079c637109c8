//! The integration driver: energy-check, step, checkpoint, repeat.

use std::path::Path;

use wavesolve_core::WaveGrid;
use wavesolve_state::{write_state_atomic, StateError};

use crate::checkpoint::{snapshot_path, write_checkpoint, CheckpointPolicy};
use crate::config::SolverConfig;
use crate::pool::WorkerPool;

/// Fraction of the interior cell count used as the stopping threshold.
pub const STOP_ENERGY_PER_CELL: f64 = 0.001;

/// What a completed run looked like.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    /// Steps taken in this process lifetime (not counting restarted work).
    pub steps: u64,
    /// Simulated time at termination.
    pub final_time: f64,
    /// Energy at termination (<= the stopping threshold).
    pub final_energy: f64,
}

/// Integrate `grid` until its energy drops to `0.001 * interior_cells`,
/// checkpointing on the configured wall-clock cadence, then write the
/// final state to `output` plus a final time-stamped snapshot.
///
/// The termination check runs strictly between steps, so a grid that
/// already satisfies the threshold is written back without stepping.
///
/// # Errors
///
/// Only the final canonical write is fatal; periodic checkpoint and final
/// snapshot failures are logged and the run continues (the canonical
/// output already carries the terminal state).
pub fn solve(grid: WaveGrid, output: &Path, config: &SolverConfig) -> Result<RunSummary, StateError> {
    let e_stop = STOP_ENERGY_PER_CELL * grid.interior_cells() as f64;
    let mut policy = CheckpointPolicy::new(config.checkpoint_interval);
    let mut pool = WorkerPool::new(grid, config.threads);
    log::info!(
        "integrating with {} workers, E_stop = {e_stop:.6e}",
        pool.workers()
    );

    let mut steps = 0u64;
    let final_energy = loop {
        let energy = pool.energy();
        if energy <= e_stop {
            break energy;
        }
        pool.step();
        steps += 1;
        if policy.should_write() {
            write_checkpoint(pool.grid(), output);
        }
    };

    let grid = pool.shutdown();
    write_state_atomic(&grid, output)?;

    let snapshot = snapshot_path(output, grid.time());
    if let Err(e) = write_state_atomic(&grid, &snapshot) {
        log::warn!("final snapshot write to {} failed: {e}", snapshot.display());
    }

    log::info!(
        "terminated after {steps} steps at t = {:.4} with E = {final_energy:.6e}",
        grid.time()
    );
    Ok(RunSummary {
        steps,
        final_time: grid.time(),
        final_energy,
    })
}
