use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{Result, WaveError};
use crate::grid::Grid;

/// Fixed injection cell: column `sx`, row `sz`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointSource {
    pub sx: usize,
    pub sz: usize,
}

impl PointSource {
    pub fn new(sx: usize, sz: usize) -> Self {
        Self { sx, sz }
    }

    /// Flat field index of the source cell, or `SourceOutOfBounds`.
    pub fn index(&self, grid: &Grid) -> Result<usize> {
        if !grid.in_bounds(self.sx, self.sz) {
            return Err(WaveError::SourceOutOfBounds {
                sx: self.sx,
                sz: self.sz,
                nx: grid.nx,
                nz: grid.nz,
            });
        }
        Ok(grid.cell_index(self.sx, self.sz))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveletKind {
    Gaussian,
    Ricker,
}

/// Analytic source-time function with peak frequency `f0` and delay `t0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wavelet {
    pub kind: WaveletKind,
    pub f0: f64, // Peak frequency (Hz)
    pub t0: f64, // Time delay (s)
}

impl Wavelet {
    pub fn new(kind: WaveletKind, f0: f64) -> Self {
        // Delay so the wavelet starts near zero
        let t0 = 1.2 / f0;
        Self { kind, f0, t0 }
    }

    pub fn with_delay(kind: WaveletKind, f0: f64, t0: f64) -> Self {
        Self { kind, f0, t0 }
    }

    pub fn gaussian(f0: f64, t0: f64) -> Self {
        Self::with_delay(WaveletKind::Gaussian, f0, t0)
    }

    pub fn ricker(f0: f64, t0: f64) -> Self {
        Self::with_delay(WaveletKind::Ricker, f0, t0)
    }

    pub fn sample(&self, t: f64) -> f64 {
        let tau = t - self.t0;
        match self.kind {
            WaveletKind::Gaussian => (-(self.f0 * self.f0) * tau * tau).exp(),
            WaveletKind::Ricker => {
                let arg = (PI * self.f0 * tau).powi(2);
                (1.0 - 2.0 * arg) * (-arg).exp()
            }
        }
    }

    /// `nt` samples at `t = it * dt`.
    pub fn samples(&self, nt: usize, dt: f64) -> Vec<f64> {
        (0..nt).map(|it| self.sample(it as f64 * dt)).collect()
    }
}
