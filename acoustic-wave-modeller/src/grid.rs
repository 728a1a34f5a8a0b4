use std::ops::Range;

use crate::error::{Result, WaveError};

/// Uniform 2D grid of `nz` rows by `nx` columns.
///
/// Cell `(row i, col j)` lives at flat index `i * nx + j` in every field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub nx: usize, // Number of columns (x direction)
    pub nz: usize, // Number of rows (z direction)
    pub dx: f64,   // Grid spacing in x (meters)
    pub dz: f64,   // Grid spacing in z (meters)
    margin: usize,
}

impl Grid {
    pub const DEFAULT_MARGIN: usize = 1;

    pub fn new(nx: usize, nz: usize, dx: f64, dz: f64) -> Result<Self> {
        Self::with_margin(nx, nz, dx, dz, Self::DEFAULT_MARGIN)
    }

    /// Grid whose stencil skips `margin` cells at both edges of each axis.
    pub fn with_margin(nx: usize, nz: usize, dx: f64, dz: f64, margin: usize) -> Result<Self> {
        let invalid = |reason| WaveError::InvalidGrid {
            nx,
            nz,
            margin,
            reason,
        };
        if nx < 3 || nz < 3 {
            return Err(invalid("both dimensions must be at least 3"));
        }
        if margin == 0 {
            return Err(invalid("stencil margin must be at least 1"));
        }
        // 2 * margin + 1 would overflow for huge margins
        if margin > (nx - 1) / 2 || margin > (nz - 1) / 2 {
            return Err(invalid("stencil margin leaves no interior cell"));
        }
        WaveError::check_positive("dx", dx)?;
        WaveError::check_positive("dz", dz)?;

        Ok(Grid {
            nx,
            nz,
            dx,
            dz,
            margin,
        })
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Number of cells in a field on this grid.
    pub fn len(&self) -> usize {
        self.nx * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ndarray shape `(rows, cols)`; row-major storage matches `index`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nz, self.nx)
    }

    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.nx + j
    }

    /// Flat index of the cell at column `sx`, row `sz`.
    pub fn cell_index(&self, sx: usize, sz: usize) -> usize {
        self.index(sz, sx)
    }

    pub fn in_bounds(&self, sx: usize, sz: usize) -> bool {
        sx < self.nx && sz < self.nz
    }

    /// Columns updated by the x-axis second derivative.
    pub fn interior_cols(&self) -> Range<usize> {
        self.margin..self.nx - self.margin
    }

    /// Rows updated by the z-axis second derivative.
    pub fn interior_rows(&self) -> Range<usize> {
        self.margin..self.nz - self.margin
    }

    pub fn x_coord(&self, j: usize) -> f64 {
        self.dx * (j as f64)
    }

    pub fn z_coord(&self, i: usize) -> f64 {
        self.dz * (i as f64)
    }

    pub fn width(&self) -> f64 {
        (self.nx - 1) as f64 * self.dx
    }

    pub fn height(&self) -> f64 {
        (self.nz - 1) as f64 * self.dz
    }
}
