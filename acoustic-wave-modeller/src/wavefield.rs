use ndarray::{s, Array2, ArrayView2, Zip};
use rayon::prelude::*;

use crate::grid::Grid;
use crate::velocity::VelocityModel;

/// The three live pressure levels of the leapfrog scheme plus the two
/// second-derivative scratch fields.
///
/// All five buffers are allocated once, zero-filled, and reused every step.
/// `p_new` is written from `p` and `p_old` only, so the three levels never
/// alias within a step.
#[derive(Debug, Clone)]
pub struct PressureField {
    pub p: Array2<f64>,
    pub p_old: Array2<f64>,
    p_new: Array2<f64>,
    pub d2px: Array2<f64>,
    pub d2pz: Array2<f64>,
}

impl PressureField {
    pub fn new(grid: &Grid) -> Self {
        let shape = grid.shape();
        PressureField {
            p: Array2::zeros(shape),
            p_old: Array2::zeros(shape),
            p_new: Array2::zeros(shape),
            d2px: Array2::zeros(shape),
            d2pz: Array2::zeros(shape),
        }
    }

    /// Start from `initial` as the current level with a zero previous level.
    pub fn with_initial(grid: &Grid, initial: ArrayView2<'_, f64>) -> Self {
        let mut field = Self::new(grid);
        field.p.assign(&initial);
        field
    }

    pub fn zero(&mut self) {
        self.p.fill(0.0);
        self.p_old.fill(0.0);
        self.p_new.fill(0.0);
        self.d2px.fill(0.0);
        self.d2pz.fill(0.0);
    }

    pub fn current(&self) -> ArrayView2<'_, f64> {
        self.p.view()
    }

    /// Second derivatives of `p` along x and z over the grid interior.
    ///
    /// The x component covers interior columns in every row, the z component
    /// interior rows in every column. Cells outside those ranges keep their
    /// last written value.
    pub fn compute_laplacian(&mut self, grid: &Grid, parallel: bool) {
        let m = grid.margin();
        let (nz, nx) = grid.shape();
        let dx2 = grid.dx * grid.dx;
        let dz2 = grid.dz * grid.dz;

        // (left + right) first so mirrored cells round identically
        let d2 = |h2: f64| move |out: &mut f64, &l: &f64, &c: &f64, &r: &f64| {
            *out = ((l + r) - 2.0 * c) / h2;
        };

        let x_zip = Zip::from(self.d2px.slice_mut(s![.., m..nx - m]))
            .and(self.p.slice(s![.., m - 1..nx - m - 1]))
            .and(self.p.slice(s![.., m..nx - m]))
            .and(self.p.slice(s![.., m + 1..nx - m + 1]));
        let z_zip = Zip::from(self.d2pz.slice_mut(s![m..nz - m, ..]))
            .and(self.p.slice(s![m - 1..nz - m - 1, ..]))
            .and(self.p.slice(s![m..nz - m, ..]))
            .and(self.p.slice(s![m + 1..nz - m + 1, ..]));

        if parallel {
            x_zip.par_for_each(d2(dx2));
            z_zip.par_for_each(d2(dz2));
        } else {
            x_zip.for_each(d2(dx2));
            z_zip.for_each(d2(dz2));
        }
    }

    /// `p_new = 2 p - p_old + dt^2 c^2 (d2px + d2pz)` at every cell.
    pub fn leapfrog(&mut self, velocity: &VelocityModel, dt: f64, parallel: bool) {
        let dt2 = dt * dt;
        let update = move |new: &mut f64, &p: &f64, &old: &f64, &c: &f64, &dx2: &f64, &dz2: &f64| {
            *new = 2.0 * p - old + dt2 * (c * c) * (dx2 + dz2);
        };

        let zip = Zip::from(&mut self.p_new)
            .and(&self.p)
            .and(&self.p_old)
            .and(velocity.as_array())
            .and(&self.d2px)
            .and(&self.d2pz);

        if parallel {
            zip.par_for_each(update);
        } else {
            zip.for_each(update);
        }
    }

    /// Add `amplitude` to the freshly computed level at row `i`, column `j`.
    pub fn inject(&mut self, i: usize, j: usize, amplitude: f64) {
        self.p_new[[i, j]] += amplitude;
    }

    /// `p_old <- p`, `p <- p_new`. The stale buffer becomes next step's `p_new`.
    pub fn rotate(&mut self) {
        std::mem::swap(&mut self.p_old, &mut self.p);
        std::mem::swap(&mut self.p, &mut self.p_new);
    }

    /// True if the current level holds a NaN or infinity.
    pub fn has_non_finite(&self, parallel: bool) -> bool {
        match self.p.as_slice() {
            Some(values) if parallel => values.par_iter().any(|v| !v.is_finite()),
            _ => self.p.iter().any(|v| !v.is_finite()),
        }
    }

    pub fn peak_amplitude(&self) -> f64 {
        self.p.iter().map(|v| v.abs()).fold(0.0_f64, f64::max)
    }
}
