//! wavesolve: a damped linear wave simulated on a 2D rectangular grid
//! with fixed boundaries, advanced by explicit finite differences until
//! its mechanical energy falls below a stopping threshold.
//!
//! This is the facade crate re-exporting the public API of the
//! sub-crates; for most users adding `wavesolve` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use wavesolve::prelude::*;
//!
//! // A 5x5 state with a displacement impulse at the centre.
//! let mut grid = WaveGrid::zeroed(5, 5, 0.1).unwrap();
//! grid.u_mut()[2 * 5 + 2] = 1.0;
//!
//! // One three-phase step over two worker bands.
//! let mut pool = WorkerPool::new(grid, 2);
//! let before = pool.energy();
//! pool.step();
//! let grid = pool.shutdown();
//! assert!(before > 0.0);
//! assert_eq!(grid.u()[2 * 5 + 2], 0.9998);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`grid`] | `wavesolve-core` | `WaveGrid`, row partitioning, core errors |
//! | [`kernels`] | `wavesolve-kernels` | Stencil kernels and the energy functional |
//! | [`state`] | `wavesolve-state` | `.wo` codec, atomic writes, snapshot names |
//! | [`engine`] | `wavesolve-engine` | Worker pool, checkpoint policy, driver |
//! | [`dist`] | `wavesolve-mpi` | Distributed layout and (behind `mpi`) the MPI engine |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Grid state and partitioning (`wavesolve-core`).
pub use wavesolve_core as grid;

/// Stencil kernels and the energy functional (`wavesolve-kernels`).
pub use wavesolve_kernels as kernels;

/// The `.wo` binary state format (`wavesolve-state`).
pub use wavesolve_state as state;

/// Shared-memory engine and integration driver (`wavesolve-engine`).
pub use wavesolve_engine as engine;

/// Distributed-memory engine (`wavesolve-mpi`).
pub use wavesolve_mpi as dist;

/// Common imports for typical usage.
pub mod prelude {
    pub use wavesolve_core::{Band, GridError, WaveGrid};
    pub use wavesolve_engine::{solve, CheckpointPolicy, RunSummary, SolverConfig, WorkerPool};
    pub use wavesolve_kernels::energy;
    pub use wavesolve_state::{read_state, snapshot_name, write_state_atomic, StateError};
}
