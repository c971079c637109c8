//! The 2D wave state: displacement, velocity, and scratch Laplacian fields.
//!
//! All three fields are dense row-major `f64` buffers of `rows * cols`
//! cells. Border cells (row 0, row `rows-1`, column 0, column `cols-1`) of
//! the displacement and velocity fields are never written by any kernel;
//! they keep whatever value they were constructed with. The Laplacian
//! buffer is scratch — its contents between steps are undefined.

use smallvec::SmallVec;

use crate::error::GridError;

/// Header extents in row-major order: `extents[0]` = rows, `extents[1]` = cols.
///
/// Stored inline for the 2D case; the on-disk header is dimension-prefixed,
/// so the length is data-driven at the codec boundary.
pub type Extents = SmallVec<[u64; 2]>;

/// Default integration time step.
pub const DEFAULT_DT: f64 = 0.01;

/// Default squared wave propagation speed.
pub const DEFAULT_WAVE_SPEED_SQ: f64 = 1.0;

/// The complete simulation state for one process.
///
/// Mutated only by the stencil kernels (via an engine) and by
/// [`advance_time`](WaveGrid::advance_time); between steps the grid is
/// always in a consistent, restart-ready state.
#[derive(Clone, Debug)]
pub struct WaveGrid {
    extents: Extents,
    damping: f64,
    time: f64,
    u: Vec<f64>,
    v: Vec<f64>,
    lap: Vec<f64>,
    dt: f64,
    wave_speed_sq: f64,
}

impl WaveGrid {
    /// Build a grid from the header fields and the two persisted buffers.
    ///
    /// The scratch Laplacian buffer is allocated zeroed. `dt` and the
    /// squared wave speed take their defaults; see [`with_dt`](Self::with_dt).
    ///
    /// # Errors
    ///
    /// Rejects domains smaller than 3x3 (`DomainTooSmall`), buffers whose
    /// length is not `rows * cols` (`SizeMismatch`), and non-finite or
    /// negative damping/time values.
    pub fn new(
        rows: u64,
        cols: u64,
        damping: f64,
        time: f64,
        u: Vec<f64>,
        v: Vec<f64>,
    ) -> Result<Self, GridError> {
        if rows < 3 || cols < 3 {
            return Err(GridError::DomainTooSmall { rows, cols });
        }
        if !(damping >= 0.0 && damping.is_finite()) {
            return Err(GridError::InvalidDamping { value: damping });
        }
        if !(time >= 0.0 && time.is_finite()) {
            return Err(GridError::InvalidTime { value: time });
        }
        let cells = (rows as usize) * (cols as usize);
        if u.len() != cells {
            return Err(GridError::SizeMismatch {
                field: "displacement",
                expected: cells,
                actual: u.len(),
            });
        }
        if v.len() != cells {
            return Err(GridError::SizeMismatch {
                field: "velocity",
                expected: cells,
                actual: v.len(),
            });
        }
        let mut extents = Extents::new();
        extents.push(rows);
        extents.push(cols);
        Ok(Self {
            extents,
            damping,
            time,
            u,
            v,
            lap: vec![0.0; cells],
            dt: DEFAULT_DT,
            wave_speed_sq: DEFAULT_WAVE_SPEED_SQ,
        })
    }

    /// A zero-filled grid, convenient for tests and for seeding states.
    pub fn zeroed(rows: u64, cols: u64, damping: f64) -> Result<Self, GridError> {
        let cells = (rows as usize) * (cols as usize);
        Self::new(rows, cols, damping, 0.0, vec![0.0; cells], vec![0.0; cells])
    }

    /// Override the integration time step (builder style).
    #[must_use]
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Override the squared wave speed (builder style).
    #[must_use]
    pub fn with_wave_speed_sq(mut self, c2: f64) -> Self {
        self.wave_speed_sq = c2;
        self
    }

    /// Row extent.
    pub fn rows(&self) -> usize {
        self.extents[0] as usize
    }

    /// Column extent.
    pub fn cols(&self) -> usize {
        self.extents[1] as usize
    }

    /// The raw header extents.
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Number of interior cells: `(rows - 2) * (cols - 2)`.
    pub fn interior_cells(&self) -> usize {
        (self.rows() - 2) * (self.cols() - 2)
    }

    /// Damping coefficient γ (stored on disk under the historical name `c`).
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Overwrite the simulated time. Used by the remaining-time driver,
    /// which counts the header field down instead of up.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Integration time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Squared wave propagation speed.
    pub fn wave_speed_sq(&self) -> f64 {
        self.wave_speed_sq
    }

    /// Advance the simulated time by exactly one `dt`.
    pub fn advance_time(&mut self) {
        self.time += self.dt;
    }

    /// Displacement field, row-major.
    pub fn u(&self) -> &[f64] {
        &self.u
    }

    /// Displacement field, mutable.
    pub fn u_mut(&mut self) -> &mut [f64] {
        &mut self.u
    }

    /// Velocity field, row-major.
    pub fn v(&self) -> &[f64] {
        &self.v
    }

    /// Velocity field, mutable.
    pub fn v_mut(&mut self) -> &mut [f64] {
        &mut self.v
    }

    /// Scratch Laplacian buffer. Contents between steps are undefined.
    pub fn lap(&self) -> &[f64] {
        &self.lap
    }

    /// Scratch Laplacian buffer, mutable.
    pub fn lap_mut(&mut self) -> &mut [f64] {
        &mut self.lap
    }
}
