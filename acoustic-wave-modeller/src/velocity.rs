use ndarray::Array2;

use crate::error::{Result, WaveError};
use crate::grid::Grid;

/// Wave speed at every grid cell. Read-only once a run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityModel {
    c: Array2<f64>,
}

impl VelocityModel {
    pub fn homogeneous(grid: &Grid, c0: f64) -> Self {
        Self {
            c: Array2::from_elem(grid.shape(), c0),
        }
    }

    /// Build from a flat, row-major buffer of `nx * nz` speeds.
    pub fn from_vec(grid: &Grid, c: Vec<f64>) -> Result<Self> {
        let found = c.len();
        WaveError::check_len("velocity", grid.len(), found)?;
        let c = Array2::from_shape_vec(grid.shape(), c).map_err(|_| {
            WaveError::FieldShapeMismatch {
                field: "velocity",
                expected: grid.len(),
                found,
            }
        })?;
        Ok(Self { c })
    }

    /// Evaluate `f(row, col)` at every cell.
    pub fn from_fn<F>(grid: &Grid, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        Self {
            c: Array2::from_shape_fn(grid.shape(), |(i, j)| f(i, j)),
        }
    }

    /// Horizontal layers: each `(top_row, speed)` applies from its top row down
    /// to the next layer. Rows above the first layer use `c0`.
    pub fn layered(grid: &Grid, c0: f64, layers: &[(usize, f64)]) -> Self {
        let mut sorted = layers.to_vec();
        sorted.sort_by_key(|&(top, _)| top);
        Self::from_fn(grid, |i, _| {
            sorted
                .iter()
                .take_while(|&&(top, _)| top <= i)
                .last()
                .map_or(c0, |&(_, c)| c)
        })
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.c
    }

    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.c[[i, j]]
    }

    /// Largest absolute wave speed in the medium.
    pub fn max_velocity(&self) -> f64 {
        self.c.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }

    /// Largest stable time step for the 2D leapfrog scheme, scaled by `safety`.
    ///
    /// `dt <= safety * min(dx, dz) / (c_max * sqrt(2))`. Infinite for a
    /// motionless medium.
    pub fn stable_dt(&self, grid: &Grid, safety: f64) -> f64 {
        let c_max = self.max_velocity();
        if c_max == 0.0 {
            return f64::INFINITY;
        }
        safety * grid.dx.min(grid.dz) / (c_max * std::f64::consts::SQRT_2)
    }

    /// CFL check with unit safety factor.
    pub fn satisfies_cfl(&self, grid: &Grid, dt: f64) -> bool {
        dt <= self.stable_dt(grid, 1.0)
    }
}
