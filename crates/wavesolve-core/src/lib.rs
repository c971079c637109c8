//! Core state for the wavesolve solver.
//!
//! This crate owns the [`WaveGrid`] — the 2D displacement, velocity, and
//! scratch Laplacian fields together with the physical constants — and the
//! row-partitioning helpers that both the shared-memory worker pool and the
//! distributed engine build on. It performs no I/O and spawns no threads.

pub mod error;
pub mod grid;
pub mod partition;

pub use error::GridError;
pub use grid::{Extents, WaveGrid, DEFAULT_DT, DEFAULT_WAVE_SPEED_SQ};
pub use partition::{partition_interior, split_rows, Band};
