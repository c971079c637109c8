//! The mechanical energy functional and its per-row building blocks.
//!
//! ```text
//! E = Σ interior           0.5  * V[i,j]²
//!   + Σ i in [1,R-2)       0.25 * (U[i,j] - U[i+1,j])²   for j in [1,C-1)
//!   + Σ i in [1,R-1)       0.25 * (U[i,j] - U[i,j+1])²   for j in [1,C-2)
//! ```
//!
//! The functional is exposed as row-level terms so that all three callers
//! — the serial path, the per-band worker partials, and the distributed
//! per-rank partials (where the row below the last real row lives in a
//! halo) — reduce exactly the same quantities, differing only in
//! floating-point summation order.

use wavesolve_core::Band;

/// Kinetic term of one interior row: `0.5 * v²` over columns `1..cols-1`.
pub fn row_kinetic(v_row: &[f64]) -> f64 {
    let cols = v_row.len();
    let mut e = 0.0;
    for &vv in &v_row[1..cols - 1] {
        e += 0.5 * vv * vv;
    }
    e
}

/// Downward-gradient term between a row and the row below it:
/// `0.25 * (u[i,j] - u[i+1,j])²` over columns `1..cols-1`.
pub fn row_grad_down(u_row: &[f64], u_below: &[f64]) -> f64 {
    debug_assert_eq!(u_row.len(), u_below.len());
    let cols = u_row.len();
    let mut e = 0.0;
    for j in 1..cols - 1 {
        let d = u_row[j] - u_below[j];
        e += 0.25 * d * d;
    }
    e
}

/// Rightward-gradient term within one row:
/// `0.25 * (u[i,j] - u[i,j+1])²` over columns `1..cols-2`.
pub fn row_grad_right(u_row: &[f64]) -> f64 {
    let cols = u_row.len();
    let mut e = 0.0;
    for j in 1..cols - 2 {
        let d = u_row[j] - u_row[j + 1];
        e += 0.25 * d * d;
    }
    e
}

/// Energy contribution of one band of interior rows.
///
/// Summing `band_energy` over a partition of the interior yields the full
/// functional: the kinetic and rightward terms cover every band row, the
/// downward term covers band rows below which another interior row exists
/// (`i < rows - 2`), reading that row from `u` regardless of which band
/// owns it.
pub fn band_energy(u: &[f64], v: &[f64], rows: usize, cols: usize, band: &Band) -> f64 {
    debug_assert!(band.start >= 1 && band.end <= rows - 1);
    let mut e = 0.0;
    for i in band.start..band.end {
        let row = i * cols;
        e += row_kinetic(&v[row..row + cols]);
        if i < rows - 2 {
            e += row_grad_down(&u[row..row + cols], &u[row + cols..row + 2 * cols]);
        }
        e += row_grad_right(&u[row..row + cols]);
    }
    e
}

/// The full energy functional, reduced serially over the whole interior.
pub fn energy(u: &[f64], v: &[f64], rows: usize, cols: usize) -> f64 {
    band_energy(
        u,
        v,
        rows,
        cols,
        &Band {
            start: 1,
            end: rows - 1,
        },
    )
}
