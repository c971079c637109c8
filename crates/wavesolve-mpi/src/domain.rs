//! Per-rank domain layout and the rank-local compute paths.
//!
//! A rank's *slab* is its real rows plus the adjacent halo rows, stored
//! contiguously. All functions here are pure: the MPI plumbing only moves
//! rows between slabs and reduces scalars.

use wavesolve_core::{split_rows, Band};
use wavesolve_kernels::{
    displacement_band, laplacian_band, row_grad_down, row_grad_right, row_kinetic, velocity_band,
};

/// Which global rows a rank owns and how its local slab is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainLayout {
    /// This process's rank.
    pub rank: u64,
    /// Total process count.
    pub size: u64,
    /// Global row extent.
    pub rows: u64,
    /// Global column extent.
    pub cols: u64,
    /// First real (owned) row, global indexing.
    pub real_first: u64,
    /// One past the last real row, global indexing.
    pub real_last: u64,
    /// A halo row above the real rows (present iff a lower-ranked
    /// neighbour owns the row `real_first - 1`).
    pub halo_above: bool,
    /// A halo row below the real rows.
    pub halo_below: bool,
}

impl DomainLayout {
    /// Decompose `rows` across `size` ranks and describe `rank`'s share.
    pub fn new(rows: u64, cols: u64, rank: u64, size: u64) -> Self {
        let (real_first, real_last) = split_rows(rows, rank, size);
        let owns_rows = real_last > real_first;
        Self {
            rank,
            size,
            rows,
            cols,
            real_first,
            real_last,
            halo_above: owns_rows && real_first > 0,
            halo_below: owns_rows && real_last < rows,
        }
    }

    /// Number of rows this rank owns.
    pub fn real_rows(&self) -> u64 {
        self.real_last - self.real_first
    }

    /// True when the rank owns no rows (more ranks than rows).
    pub fn is_empty(&self) -> bool {
        self.real_rows() == 0
    }

    /// First slab row, global indexing (the top halo if present).
    pub fn slab_first(&self) -> u64 {
        self.real_first - u64::from(self.halo_above)
    }

    /// One past the last slab row, global indexing.
    pub fn slab_last(&self) -> u64 {
        self.real_last + u64::from(self.halo_below)
    }

    /// Rows in the local slab (real + halos).
    pub fn slab_rows(&self) -> u64 {
        self.slab_last() - self.slab_first()
    }

    /// Cells in the local slab.
    pub fn slab_cells(&self) -> usize {
        (self.slab_rows() * self.cols) as usize
    }

    /// Slab-local index of the first real row.
    pub fn real_offset_rows(&self) -> usize {
        usize::from(self.halo_above)
    }

    /// The rows this rank must update — its real rows intersected with
    /// the global interior — as a slab-local band. `None` when empty.
    pub fn interior_band(&self) -> Option<Band> {
        let g0 = self.real_first.max(1);
        let g1 = self.real_last.min(self.rows - 1);
        if g0 >= g1 {
            return None;
        }
        Some(Band {
            start: (g0 - self.slab_first()) as usize,
            end: (g1 - self.slab_first()) as usize,
        })
    }
}

/// Advance one rank's slab by one three-phase step.
///
/// Halos must have been refreshed since the last displacement update;
/// boundary rows and empty slabs are left untouched.
pub fn step_slab(
    u: &mut [f64],
    v: &mut [f64],
    lap: &mut [f64],
    layout: &DomainLayout,
    dt: f64,
    c2: f64,
    damping: f64,
) {
    let Some(band) = layout.interior_band() else {
        return;
    };
    let cols = layout.cols as usize;
    let off = band.start * cols;
    let len = band.len() * cols;

    laplacian_band(u, cols, &band, &mut lap[off..off + len]);
    velocity_band(&lap[off..off + len], &mut v[off..off + len], cols, &band, dt, c2, damping);
    displacement_band(&v[off..off + len], &mut u[off..off + len], cols, &band, dt);
}

/// This rank's contribution to the global energy functional.
///
/// Covers exactly the real rows: the kinetic and rightward-gradient terms
/// for every owned interior row, and the downward-gradient term wherever
/// the global row index is below `rows - 2` (the row below may be a
/// halo). Summed across ranks this reproduces the serial functional up to
/// floating-point ordering.
pub fn local_energy(u: &[f64], v: &[f64], layout: &DomainLayout) -> f64 {
    let Some(band) = layout.interior_band() else {
        return 0.0;
    };
    let cols = layout.cols as usize;
    let mut e = 0.0;
    for l in band.start..band.end {
        let row = l * cols;
        let g = layout.slab_first() + l as u64;
        e += row_kinetic(&v[row..row + cols]);
        if g < layout.rows - 2 {
            e += row_grad_down(&u[row..row + cols], &u[row + cols..row + 2 * cols]);
        }
        e += row_grad_right(&u[row..row + cols]);
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavesolve_kernels::energy;

    /// Extract rank slabs from a global field.
    fn slab_of(global: &[f64], layout: &DomainLayout) -> Vec<f64> {
        let cols = layout.cols as usize;
        let a = layout.slab_first() as usize * cols;
        let b = layout.slab_last() as usize * cols;
        global[a..b].to_vec()
    }

    /// Copy every rank's edge rows into its neighbours' halos — the
    /// serial stand-in for the sendrecv exchange.
    fn serial_exchange(global_shape: (u64, u64), slabs: &mut [Vec<f64>], layouts: &[DomainLayout]) {
        let cols = global_shape.1 as usize;
        for i in 0..layouts.len() {
            let me = &layouts[i];
            if me.is_empty() {
                continue;
            }
            if me.halo_above {
                let donor = &layouts[i - 1];
                let edge_local = (me.real_first - 1 - donor.slab_first()) as usize * cols;
                let row: Vec<f64> = slabs[i - 1][edge_local..edge_local + cols].to_vec();
                slabs[i][..cols].copy_from_slice(&row);
            }
            if me.halo_below {
                let donor = &layouts[i + 1];
                let edge_local = (me.real_last - donor.slab_first()) as usize * cols;
                let row: Vec<f64> = slabs[i + 1][edge_local..edge_local + cols].to_vec();
                let tail = slabs[i].len() - cols;
                slabs[i][tail..].copy_from_slice(&row);
            }
        }
    }

    fn sample_field(rows: usize, cols: usize, salt: usize) -> Vec<f64> {
        let mut f = vec![0.0; rows * cols];
        for i in 1..rows - 1 {
            for j in 1..cols - 1 {
                f[i * cols + j] = (((i * 31 + j * 7 + salt) % 23) as f64) * 0.04 - 0.4;
            }
        }
        f
    }

    #[test]
    fn layouts_tile_the_grid() {
        for size in [1u64, 2, 3, 5, 12] {
            let mut cursor = 0;
            for rank in 0..size {
                let l = DomainLayout::new(10, 6, rank, size);
                assert_eq!(l.real_first, cursor);
                cursor = l.real_last;
                if !l.is_empty() {
                    assert_eq!(l.halo_above, l.real_first > 0);
                    assert_eq!(l.halo_below, l.real_last < 10);
                    assert_eq!(
                        l.slab_rows(),
                        l.real_rows() + u64::from(l.halo_above) + u64::from(l.halo_below)
                    );
                }
            }
            assert_eq!(cursor, 10);
        }
    }

    #[test]
    fn empty_rank_has_no_halos_and_no_band() {
        let l = DomainLayout::new(4, 5, 6, 8);
        assert!(l.is_empty());
        assert!(!l.halo_above);
        assert!(!l.halo_below);
        assert_eq!(l.interior_band(), None);
        assert_eq!(l.slab_cells(), 0);
    }

    #[test]
    fn interior_band_excludes_boundary_rows() {
        // Rank 0 of 2 over 10 rows owns [0, 5); its band starts at global
        // row 1. Rank 1 owns [5, 10); its band ends before row 9.
        let l0 = DomainLayout::new(10, 5, 0, 2);
        assert_eq!(l0.interior_band(), Some(Band { start: 1, end: 5 }));
        let l1 = DomainLayout::new(10, 5, 1, 2);
        // Slab starts at global row 4 (top halo); rows 5..9 map to 1..5.
        assert_eq!(l1.interior_band(), Some(Band { start: 1, end: 5 }));
    }

    #[test]
    fn rank_local_energies_sum_to_global() {
        let (rows, cols) = (13usize, 9usize);
        let u = sample_field(rows, cols, 1);
        let v = sample_field(rows, cols, 2);
        let global = energy(&u, &v, rows, cols);

        for size in [1u64, 2, 3, 4, 7] {
            let sum: f64 = (0..size)
                .map(|rank| {
                    let layout = DomainLayout::new(rows as u64, cols as u64, rank, size);
                    if layout.is_empty() {
                        return 0.0;
                    }
                    let lu = slab_of(&u, &layout);
                    let lv = slab_of(&v, &layout);
                    local_energy(&lu, &lv, &layout)
                })
                .sum();
            assert!(
                (sum - global).abs() < 1e-12 * global.abs().max(1.0),
                "size {size}: {sum} != {global}"
            );
        }
    }

    /// Stepping rank slabs with serial halo refreshes must reproduce the
    /// single-domain update bit for bit.
    #[test]
    fn decomposed_steps_match_single_domain() {
        let (rows, cols) = (12usize, 7usize);
        let dt = 0.01;
        let c2 = 1.0;
        let damping = 0.1;

        // Reference: whole-domain stepping.
        let mut ru = sample_field(rows, cols, 3);
        let mut rv = sample_field(rows, cols, 4);
        let mut rlap = vec![0.0; rows * cols];
        let whole = DomainLayout::new(rows as u64, cols as u64, 0, 1);
        for _ in 0..25 {
            step_slab(&mut ru, &mut rv, &mut rlap, &whole, dt, c2, damping);
        }

        for size in [2u64, 3, 5] {
            let layouts: Vec<DomainLayout> = (0..size)
                .map(|r| DomainLayout::new(rows as u64, cols as u64, r, size))
                .collect();
            let gu = sample_field(rows, cols, 3);
            let gv = sample_field(rows, cols, 4);
            let mut us: Vec<Vec<f64>> = layouts.iter().map(|l| slab_of(&gu, l)).collect();
            let mut vs: Vec<Vec<f64>> = layouts.iter().map(|l| slab_of(&gv, l)).collect();
            let mut laps: Vec<Vec<f64>> = us.iter().map(|s| vec![0.0; s.len()]).collect();

            for _ in 0..25 {
                serial_exchange((rows as u64, cols as u64), &mut us, &layouts);
                serial_exchange((rows as u64, cols as u64), &mut vs, &layouts);
                for (i, l) in layouts.iter().enumerate() {
                    step_slab(&mut us[i], &mut vs[i], &mut laps[i], l, dt, c2, damping);
                }
            }

            // Stitch real rows back together and compare bitwise.
            for (i, l) in layouts.iter().enumerate() {
                let colsz = cols;
                let off = l.real_offset_rows() * colsz;
                for r in 0..l.real_rows() as usize {
                    let g = (l.real_first as usize + r) * colsz;
                    for j in 0..colsz {
                        assert_eq!(
                            us[i][off + r * colsz + j].to_bits(),
                            ru[g + j].to_bits(),
                            "u mismatch at rank {i}, row {r}, col {j}, size {size}"
                        );
                        assert_eq!(
                            vs[i][off + r * colsz + j].to_bits(),
                            rv[g + j].to_bits(),
                            "v mismatch at rank {i}, row {r}, col {j}, size {size}"
                        );
                    }
                }
            }
        }
    }
}
