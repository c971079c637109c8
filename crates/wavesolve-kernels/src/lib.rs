//! Pure compute kernels for the damped wave update.
//!
//! Every kernel operates on a row band `[start, end)` with
//! `1 <= start < end <= rows - 1` and touches only columns `1..cols-1`;
//! boundary cells are never written. Kernels allocate nothing and perform
//! no I/O, which is what makes the three-phase engine protocol race-free:
//! each phase writes exactly one field over disjoint bands while reading
//! fields finalised in an earlier phase.
//!
//! Applied in the fixed order Laplacian → velocity → displacement, the
//! kernels advance the state by one time step:
//!
//! ```text
//! L[i,j] = 0.5 * (U[i-1,j] + U[i+1,j] + U[i,j-1] + U[i,j+1] - 4*U[i,j])
//! V[i,j] += (c² * L[i,j] - γ * V[i,j]) * dt
//! U[i,j] += V[i,j] * dt
//! ```
//!
//! The 0.5 factor on the four-neighbour sum (rather than the textbook
//! 0.25) is the convention every existing `.wo` state file was produced
//! with; the surplus constant is absorbed into c². The exact arithmetic
//! grouping above is likewise load-bearing for bit-for-bit restart
//! compatibility and must not be reassociated.

pub mod energy;
pub mod stencil;

pub use energy::{band_energy, energy, row_grad_down, row_grad_right, row_kinetic};
pub use stencil::{displacement_band, laplacian_band, velocity_band};
