//! Explicit finite-difference modelling of the 2D acoustic wave equation.
//!
//! The pressure field is advanced with the second-order leapfrog scheme
//!
//! ```text
//! p_new = 2 p - p_old + dt^2 c^2 (d2p/dx2 + d2p/dz2)
//! ```
//!
//! on a uniform `nz` x `nx` grid, with a point source injected every step.
//! Fields are stored row-major: cell `(row i, col j)` is at `i * nx + j`.
//!
//! [`Simulation`] is the typed entry point. [`run_snapshot`] and
//! [`run_history`] drive it over flat caller-owned buffers.

pub mod config;
pub mod error;
pub mod grid;
pub mod observer;
pub mod output;
pub mod simulation;
pub mod source;
pub mod velocity;
pub mod wavefield;

pub use error::{Result, WaveError};
pub use grid::Grid;
pub use observer::{NoopObserver, ProgressLogger, StepObserver};
pub use simulation::{run_history, run_snapshot, History, RunSummary, Simulation, SimulationParams};
pub use source::{PointSource, Wavelet, WaveletKind};
pub use velocity::VelocityModel;
pub use wavefield::PressureField;
