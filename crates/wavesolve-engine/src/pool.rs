//! Long-lived worker pool with a single phase barrier.
//!
//! The pool owns the grid and spawns one worker per interior row band.
//! Workers block on a shared barrier of party `workers + 1` (the driver is
//! the extra party). Each driver command is one atomic opcode published
//! before a barrier arrival:
//!
//! ```text
//! driver                         workers (each on its own band)
//! op = STEP;  barrier ───────────▶ laplacian(band)
//!             barrier ◀─────────── (all bands done)
//!             barrier ───────────▶ velocity(band)
//!             barrier ◀───────────
//!             barrier ───────────▶ displacement(band)
//!             barrier ◀───────────
//! ```
//!
//! The barrier gives every phase-k write a happens-before edge to every
//! phase-k+1 read, so no lock or atomic protects the grid itself: within
//! a phase each worker writes only its own band of exactly one field and
//! reads fields no one is writing.
//!
//! Energy is evaluated in parallel the same way: workers compute their
//! band's partial sum and send `(band_index, partial)` over a channel; the
//! driver reduces the partials in band order, so the summation order is
//! fixed for a given worker count.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use wavesolve_core::{partition_interior, Band, WaveGrid};
use wavesolve_kernels::{band_energy, displacement_band, laplacian_band, velocity_band};

const OP_STEP: u8 = 0;
const OP_ENERGY: u8 = 1;
const OP_SHUTDOWN: u8 = 2;

/// Raw views of the three field buffers, shared with the workers.
///
/// The pointers target the grids' heap buffers, which are allocated once
/// at construction and never resized, so they stay valid for the pool's
/// lifetime wherever the `WaveGrid` value itself moves.
struct SharedFields {
    u: *mut f64,
    v: *mut f64,
    lap: *mut f64,
    rows: usize,
    cols: usize,
    dt: f64,
    wave_speed_sq: f64,
    damping: f64,
}

// SAFETY: the pointers are only dereferenced under the pool's phase
// protocol — each worker touches a fixed disjoint row band per writable
// field, the barrier orders phases, and the driver never aliases the
// buffers while workers are mid-phase.
unsafe impl Send for SharedFields {}
unsafe impl Sync for SharedFields {}

impl SharedFields {
    fn cells(&self) -> usize {
        self.rows * self.cols
    }
}

/// One worker's slice of the protocol loop.
fn worker_loop(
    shared: Arc<SharedFields>,
    band: Band,
    index: usize,
    barrier: Arc<Barrier>,
    op: Arc<AtomicU8>,
    partials: Sender<(usize, f64)>,
) {
    let cols = shared.cols;
    let band_cells = band.len() * cols;
    let band_off = band.start * cols;

    loop {
        barrier.wait();
        match op.load(Ordering::Acquire) {
            OP_SHUTDOWN => break,
            OP_STEP => {
                // Phase L: read whole U, write own band of L.
                // SAFETY: no worker writes U during this phase; L bands are
                // disjoint; the barrier below sequences the phases.
                {
                    let u = unsafe { std::slice::from_raw_parts(shared.u, shared.cells()) };
                    let lap_band = unsafe {
                        std::slice::from_raw_parts_mut(shared.lap.add(band_off), band_cells)
                    };
                    laplacian_band(u, cols, &band, lap_band);
                }
                barrier.wait();

                // Phase V: read own band of L, write own band of V.
                // SAFETY: both views cover only this worker's band.
                {
                    let lap_band = unsafe {
                        std::slice::from_raw_parts(shared.lap.add(band_off), band_cells)
                    };
                    let v_band = unsafe {
                        std::slice::from_raw_parts_mut(shared.v.add(band_off), band_cells)
                    };
                    velocity_band(
                        lap_band,
                        v_band,
                        cols,
                        &band,
                        shared.dt,
                        shared.wave_speed_sq,
                        shared.damping,
                    );
                }
                barrier.wait();

                // Phase U: read own band of V, write own band of U.
                // SAFETY: both views cover only this worker's band.
                {
                    let v_band = unsafe {
                        std::slice::from_raw_parts(shared.v.add(band_off), band_cells)
                    };
                    let u_band = unsafe {
                        std::slice::from_raw_parts_mut(shared.u.add(band_off), band_cells)
                    };
                    displacement_band(v_band, u_band, cols, &band, shared.dt);
                }
                barrier.wait();
            }
            OP_ENERGY => {
                // SAFETY: shared reads only; no phase writes fields while
                // the ENERGY opcode is live.
                let partial = {
                    let u = unsafe { std::slice::from_raw_parts(shared.u, shared.cells()) };
                    let v = unsafe { std::slice::from_raw_parts(shared.v, shared.cells()) };
                    band_energy(u, v, shared.rows, cols, &band)
                };
                // The driver blocks on exactly one message per band; a
                // dropped receiver only happens on teardown.
                let _ = partials.send((index, partial));
            }
            other => unreachable!("unknown pool opcode {other}"),
        }
    }
}

/// The grid plus its worker threads.
///
/// Dropping the pool shuts the workers down; [`shutdown`](Self::shutdown)
/// does the same and hands the grid back.
pub struct WorkerPool {
    grid: Option<WaveGrid>,
    bands: Vec<Band>,
    barrier: Arc<Barrier>,
    op: Arc<AtomicU8>,
    partials_rx: Receiver<(usize, f64)>,
    scratch: Vec<f64>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Partition the interior over at most `threads` bands and spawn one
    /// long-lived worker per band.
    pub fn new(mut grid: WaveGrid, threads: usize) -> Self {
        let bands = partition_interior(grid.rows(), threads.max(1));
        let shared = Arc::new(SharedFields {
            u: grid.u_mut().as_mut_ptr(),
            v: grid.v_mut().as_mut_ptr(),
            lap: grid.lap_mut().as_mut_ptr(),
            rows: grid.rows(),
            cols: grid.cols(),
            dt: grid.dt(),
            wave_speed_sq: grid.wave_speed_sq(),
            damping: grid.damping(),
        });
        let barrier = Arc::new(Barrier::new(bands.len() + 1));
        let op = Arc::new(AtomicU8::new(OP_STEP));
        let (tx, rx) = unbounded();

        let workers = bands
            .iter()
            .enumerate()
            .map(|(index, &band)| {
                let shared = Arc::clone(&shared);
                let barrier = Arc::clone(&barrier);
                let op = Arc::clone(&op);
                let tx = tx.clone();
                thread::Builder::new()
                    .name(format!("wave-worker-{index}"))
                    .spawn(move || worker_loop(shared, band, index, barrier, op, tx))
                    .expect("spawn worker thread")
            })
            .collect();

        let scratch = vec![0.0; bands.len()];
        Self {
            grid: Some(grid),
            bands,
            barrier,
            op,
            partials_rx: rx,
            scratch,
            workers,
        }
    }

    /// Number of bands (== live workers).
    pub fn workers(&self) -> usize {
        self.bands.len()
    }

    /// The grid, readable between commands.
    pub fn grid(&self) -> &WaveGrid {
        self.grid.as_ref().expect("grid present until shutdown")
    }

    /// Execute one three-phase step and advance the simulated time by `dt`.
    pub fn step(&mut self) {
        self.op.store(OP_STEP, Ordering::Release);
        self.barrier.wait(); // release workers into phase L
        self.barrier.wait(); // phase L complete
        self.barrier.wait(); // phase V complete
        self.barrier.wait(); // phase U complete
        self.grid
            .as_mut()
            .expect("grid present until shutdown")
            .advance_time();
    }

    /// Evaluate the energy functional in parallel, reducing the per-band
    /// partials in band order.
    pub fn energy(&mut self) -> f64 {
        self.op.store(OP_ENERGY, Ordering::Release);
        self.barrier.wait();
        for _ in 0..self.bands.len() {
            let (index, partial) = self
                .partials_rx
                .recv()
                .expect("worker alive while pool holds the op barrier");
            self.scratch[index] = partial;
        }
        self.scratch.iter().sum()
    }

    /// Stop the workers and reclaim the grid.
    pub fn shutdown(mut self) -> WaveGrid {
        self.join_workers();
        self.grid.take().expect("grid present until shutdown")
    }

    fn join_workers(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.op.store(OP_SHUTDOWN, Ordering::Release);
        self.barrier.wait();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_grid() -> WaveGrid {
        let mut grid = WaveGrid::zeroed(5, 5, 0.1).unwrap();
        grid.u_mut()[2 * 5 + 2] = 1.0;
        grid
    }

    #[test]
    fn one_step_matches_hand_computation() {
        let mut pool = WorkerPool::new(impulse_grid(), 2);
        pool.step();
        let grid = pool.shutdown();
        assert_eq!(grid.v()[2 * 5 + 2], -0.02);
        assert_eq!(grid.u()[2 * 5 + 2], 0.9998);
        assert_eq!(grid.lap()[2 * 5 + 2], -2.0);
        assert!((grid.time() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn energy_matches_serial_reduction() {
        let mut pool = WorkerPool::new(impulse_grid(), 3);
        let parallel = pool.energy();
        let grid = pool.shutdown();
        let serial = wavesolve_kernels::energy(grid.u(), grid.v(), grid.rows(), grid.cols());
        assert!((parallel - serial).abs() < 1e-12);
        assert_eq!(parallel, 1.0);
    }

    #[test]
    fn worker_count_clamps_to_interior_rows() {
        let pool = WorkerPool::new(impulse_grid(), 64);
        assert_eq!(pool.workers(), 3);
    }

    #[test]
    fn drop_without_shutdown_joins_workers() {
        let mut pool = WorkerPool::new(impulse_grid(), 2);
        pool.step();
        drop(pool); // must not hang
    }
}
