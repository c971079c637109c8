//! The distributed integration driver.
//!
//! Remaining-time semantics: the header's `t` is read as the simulation
//! time still to run. The driver plans `⌊t/dt⌋` steps, refreshes halos
//! before every Laplacian phase, terminates early when the all-reduced
//! energy falls to the stopping threshold, and counts `t` down by `dt`
//! per completed step. Every rank takes every decision from the same
//! collective values, so no rank keeps stepping after another exits.

use std::path::Path;
use std::time::Duration;

use mpi::collective::SystemOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use wavesolve_core::{DEFAULT_DT, DEFAULT_WAVE_SPEED_SQ};
use wavesolve_engine::checkpoint::snapshot_path;
use wavesolve_engine::driver::STOP_ENERGY_PER_CELL;
use wavesolve_engine::CheckpointPolicy;
use wavesolve_state::{Header, StateError};

use crate::domain::{local_energy, step_slab, DomainLayout};
use crate::exchange::exchange_halos;
use crate::pio::{read_shared_header, read_slab, write_state_collective};

/// Outcome of a distributed run, identical on every rank.
#[derive(Clone, Copy, Debug)]
pub struct DistSummary {
    /// Steps executed.
    pub steps: u64,
    /// Remaining simulation time recorded in the final header.
    pub remaining: f64,
    /// Global energy at exit.
    pub final_energy: f64,
}

/// Sum the rank-local energy partials into the same global value on
/// every rank.
fn global_energy(
    world: &SimpleCommunicator,
    u: &[f64],
    v: &[f64],
    layout: &DomainLayout,
) -> f64 {
    let local = local_energy(u, v, layout);
    let mut global = 0.0;
    world.all_reduce_into(&local, &mut global, SystemOperation::sum());
    global
}

/// Run the distributed solver over `world`.
///
/// Loads from `output` when it already exists (restart preference),
/// otherwise from `input`; writes the final state to `output` plus a
/// final time-stamped snapshot beside it.
pub fn run(
    world: &SimpleCommunicator,
    input: &Path,
    output: &Path,
    interval: Option<Duration>,
) -> Result<DistSummary, StateError> {
    let rank = world.rank() as u64;
    let size = world.size() as u64;
    let rank0 = rank == 0;

    // Restart preference, decided once on rank 0 so every rank opens the
    // same file even mid-checkpoint.
    let mut resume: u8 = if rank0 { u8::from(output.exists()) } else { 0 };
    world.process_at_rank(0).broadcast_into(&mut resume);
    let source = if resume == 1 { output } else { input };
    if rank0 && resume == 1 {
        log::info!("resuming from existing output {}", output.display());
    }

    let header = read_shared_header(source)?;
    let layout = DomainLayout::new(header.rows(), header.cols(), rank, size);
    let (mut u, mut v) = read_slab(source, &header, &layout)?;
    let mut lap = vec![0.0; u.len()];

    let dt = DEFAULT_DT;
    let c2 = DEFAULT_WAVE_SPEED_SQ;
    let damping = header.damping;
    let interior = (header.rows() - 2) * (header.cols() - 2);
    let e_stop = STOP_ENERGY_PER_CELL * interior as f64;

    let mut remaining = header.time;
    let planned = (remaining / dt).floor() as u64;
    let mut policy = CheckpointPolicy::new(interval);

    if rank0 {
        log::info!(
            "{size} ranks over {}x{} rows, {planned} steps planned, E_stop = {e_stop:.6e}",
            header.rows(),
            header.cols()
        );
    }

    exchange_halos(world, &mut u, &layout);
    exchange_halos(world, &mut v, &layout);

    let mut steps = 0u64;
    let mut energy = global_energy(world, &u, &v, &layout);
    while steps < planned && energy > e_stop {
        step_slab(&mut u, &mut v, &mut lap, &layout, dt, c2, damping);
        exchange_halos(world, &mut u, &layout);
        exchange_halos(world, &mut v, &layout);
        remaining = (remaining - dt).max(0.0);
        steps += 1;

        // Cadence from rank 0's clock so every rank writes or skips
        // together.
        let mut due: u8 = if rank0 { u8::from(policy.should_write()) } else { 0 };
        world.process_at_rank(0).broadcast_into(&mut due);
        if due == 1 {
            checkpoint(world, output, &header, &u, &v, remaining, &layout);
        }

        energy = global_energy(world, &u, &v, &layout);
    }

    write_state_collective(world, output, &header, &u, &v, remaining, &layout)?;
    let snapshot = snapshot_path(output, remaining);
    if let Err(e) = write_state_collective(world, &snapshot, &header, &u, &v, remaining, &layout) {
        if rank0 {
            log::warn!("final snapshot write to {} failed: {e}", snapshot.display());
        }
    }

    if rank0 {
        log::info!(
            "finished after {steps} steps, remaining t = {remaining:.4}, E = {energy:.6e}"
        );
    }
    Ok(DistSummary {
        steps,
        remaining,
        final_energy: energy,
    })
}

/// Periodic checkpoint: canonical output plus a time-stamped snapshot.
/// Failures are logged on rank 0 and the run continues.
fn checkpoint(
    world: &SimpleCommunicator,
    output: &Path,
    header: &Header,
    u: &[f64],
    v: &[f64],
    remaining: f64,
    layout: &DomainLayout,
) {
    let rank0 = world.rank() == 0;
    if let Err(e) = write_state_collective(world, output, header, u, v, remaining, layout) {
        if rank0 {
            log::warn!("periodic checkpoint to {} failed: {e}", output.display());
        }
        return;
    }
    let snapshot = snapshot_path(output, remaining);
    if let Err(e) = write_state_collective(world, &snapshot, header, u, v, remaining, layout) {
        if rank0 {
            log::warn!("snapshot write to {} failed: {e}", snapshot.display());
        }
    }
}
