//! Distributed-memory execution for the wavesolve solver.
//!
//! Processes partition the row dimension into nearly-equal contiguous
//! ranges; each rank owns its *real* rows plus up to two *halo* rows
//! mirroring its neighbours' edge rows. Halos are refreshed by a pair of
//! tagged sendrecv exchanges per step, the energy termination test is a
//! sum all-reduce (so every rank takes the same decision), and state
//! files are read and written with collective positional I/O — every rank
//! touches exactly its real rows at their byte offsets in the shared
//! file.
//!
//! Unlike the shared-memory engine, this driver reads the on-disk `t`
//! field as *remaining* simulation time: it plans `⌊t/dt⌋` steps, counts
//! `t` down by `dt` per step, and records the remaining time actually
//! reached (possibly zero) in every file it writes.
//!
//! Everything that needs a running MPI environment sits behind the `mpi`
//! cargo feature; the domain layout, the local slab update, and the local
//! energy partial are pure and unit-tested without it.

pub mod domain;

#[cfg(feature = "mpi")]
pub mod exchange;
#[cfg(feature = "mpi")]
pub mod pio;
#[cfg(feature = "mpi")]
pub mod solver;

pub use domain::{local_energy, step_slab, DomainLayout};
