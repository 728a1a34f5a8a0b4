use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::grid::Grid;
use crate::simulation::{Simulation, SimulationParams};
use crate::source::{PointSource, Wavelet, WaveletKind};
use crate::velocity::VelocityModel;

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub nz: usize,
    pub dx: f64,
    pub dz: f64,
    #[serde(default = "default_margin")]
    pub margin: usize,
}

fn default_margin() -> usize {
    Grid::DEFAULT_MARGIN
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        Grid::with_margin(self.nx, self.nz, self.dx, self.dz, self.margin)
            .map(|_| ())
            .context("invalid [grid] section")
    }
}

/// One horizontal layer starting at row `top`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub top: usize,
    pub c: f64, // Wave speed (m/s)
}

/// Background speed plus optional layers below it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityConfig {
    pub c0: f64, // Wave speed (m/s)
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

impl VelocityConfig {
    fn validate(&self, nz: usize) -> Result<()> {
        if !(self.c0.is_finite() && self.c0 >= 0.0) {
            return Err(anyhow!("Velocity c0 must be non-negative, got {}", self.c0));
        }
        for layer in &self.layers {
            if layer.top >= nz {
                return Err(anyhow!(
                    "Layer top row {} is outside the grid (nz={})",
                    layer.top,
                    nz
                ));
            }
            if !(layer.c.is_finite() && layer.c >= 0.0) {
                return Err(anyhow!("Layer velocity must be non-negative, got {}", layer.c));
            }
        }
        Ok(())
    }

    pub fn max_velocity(&self) -> f64 {
        self.layers.iter().map(|l| l.c).fold(self.c0, f64::max)
    }

    pub fn build(&self, grid: &Grid) -> VelocityModel {
        let layers: Vec<(usize, f64)> = self.layers.iter().map(|l| (l.top, l.c)).collect();
        VelocityModel::layered(grid, self.c0, &layers)
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dt: Option<f64>, // Optional: will be auto-computed from CFL if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nt: Option<usize>, // Takes precedence over total_time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default = "default_cfl_safety")]
    pub cfl_safety: f64,
    #[serde(default = "default_report_period")]
    pub report_period: usize,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default = "default_true")]
    pub check_finite: bool,
    #[serde(default)]
    pub record_history: bool,
}

fn default_report_period() -> usize {
    100
}

fn default_cfl_safety() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

impl SimulationConfig {
    fn validate(&self) -> Result<()> {
        if self.cfl_safety <= 0.0 || self.cfl_safety > 1.0 {
            return Err(anyhow!(
                "cfl_safety must be in (0, 1], got {}",
                self.cfl_safety
            ));
        }
        if let Some(dt) = self.dt {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(anyhow!("dt must be positive, got {}", dt));
            }
        }
        match (self.nt, self.total_time) {
            (None, None) => return Err(anyhow!("Either nt or total_time must be given")),
            (None, Some(t)) if !(t.is_finite() && t > 0.0) => {
                return Err(anyhow!("total_time must be positive, got {}", t));
            }
            _ => {}
        }
        if self.report_period == 0 {
            return Err(anyhow!("report_period must be positive"));
        }
        Ok(())
    }

    /// Compute dt from the 2D CFL bound if not specified
    pub fn compute_dt_if_needed(&mut self, dx: f64, dz: f64, c_max: f64) {
        if self.dt.is_none() && c_max > 0.0 {
            let min_spacing = dx.min(dz);
            self.dt = Some(self.cfl_safety * min_spacing / (c_max * std::f64::consts::SQRT_2));
        }
    }

    /// Number of time levels; `nt` wins over `total_time`
    pub fn compute_nt(&self, dt: f64) -> usize {
        match (self.nt, self.total_time) {
            (Some(nt), _) => nt,
            (None, Some(t)) => (t / dt).round() as usize + 1,
            (None, None) => 0,
        }
    }
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub x: usize,
    pub z: usize,
    #[serde(default = "default_wavelet")]
    pub wavelet: WaveletKind,
    pub f0: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>, // Default: 1.2 / f0
}

fn default_wavelet() -> WaveletKind {
    WaveletKind::Ricker
}

impl SourceConfig {
    fn validate(&self, nx: usize, nz: usize) -> Result<()> {
        if self.x >= nx || self.z >= nz {
            return Err(anyhow!(
                "Source position ({}, {}) is outside grid bounds ({}, {})",
                self.x,
                self.z,
                nx,
                nz
            ));
        }
        if !(self.f0.is_finite() && self.f0 > 0.0) {
            return Err(anyhow!("Source frequency must be positive, got {}", self.f0));
        }
        if let Some(t0) = self.t0 {
            if t0 < 0.0 {
                return Err(anyhow!("Source t0 must be non-negative, got {}", t0));
            }
        }
        Ok(())
    }

    pub fn wavelet(&self) -> Wavelet {
        match self.t0 {
            Some(t0) => Wavelet::with_delay(self.wavelet, self.f0, t0),
            None => Wavelet::new(self.wavelet, self.f0),
        }
    }
}

/// Where to write results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    pub velocity: VelocityConfig,
    pub simulation: SimulationConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&mut self) -> Result<()> {
        self.grid.validate()?;
        self.velocity.validate(self.grid.nz)?;
        self.simulation.validate()?;
        self.source.validate(self.grid.nx, self.grid.nz)?;

        // Compute dt from CFL if needed
        self.simulation.compute_dt_if_needed(
            self.grid.dx,
            self.grid.dz,
            self.velocity.max_velocity(),
        );
        if self.simulation.dt.is_none() {
            return Err(anyhow!(
                "dt must be given explicitly when every velocity is zero"
            ));
        }
        Ok(())
    }

    pub fn dt(&self) -> Result<f64> {
        self.simulation
            .dt
            .ok_or_else(|| anyhow!("dt has not been resolved; call validate first"))
    }

    pub fn params(&self) -> Result<SimulationParams> {
        let dt = self.dt()?;
        Ok(SimulationParams::new(dt, self.simulation.compute_nt(dt))
            .with_parallel(self.simulation.parallel)
            .with_finite_check(self.simulation.check_finite))
    }

    /// Assemble a ready-to-run simulation
    pub fn build(&self) -> Result<Simulation> {
        let g = &self.grid;
        let grid = Grid::with_margin(g.nx, g.nz, g.dx, g.dz, g.margin)?;
        let params = self.params()?;
        let stf = self.source.wavelet().samples(params.nt, params.dt);
        let sim = Simulation::new(
            grid,
            self.velocity.build(&grid),
            PointSource::new(self.source.x, self.source.z),
            stf,
            params,
        )?;
        Ok(sim)
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        let dt = self.simulation.dt.unwrap_or(f64::NAN);
        format!(
            "grid={}x{} dx={} dz={} c0={} layers={} dt={} nt={} source=({}, {}) {:?} f0={}",
            self.grid.nx,
            self.grid.nz,
            self.grid.dx,
            self.grid.dz,
            self.velocity.c0,
            self.velocity.layers.len(),
            dt,
            self.simulation.compute_nt(dt),
            self.source.x,
            self.source.z,
            self.source.wavelet,
            self.source.f0
        )
    }
}
