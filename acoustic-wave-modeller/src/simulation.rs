use ndarray::{s, Array3, ArrayView2, ArrayViewMut2, ArrayViewMut3};
use tracing::{info, warn};

use crate::error::{Result, WaveError};
use crate::grid::Grid;
use crate::observer::{NoopObserver, StepObserver};
use crate::source::PointSource;
use crate::velocity::VelocityModel;
use crate::wavefield::PressureField;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub dt: f64,            // Time step (seconds)
    pub nt: usize,          // Number of time levels, including the initial one
    pub parallel: bool,     // Split per-cell work of each step across rayon threads
    pub check_finite: bool, // Scan for NaN/inf after every step
}

impl SimulationParams {
    pub fn new(dt: f64, nt: usize) -> Self {
        Self {
            dt,
            nt,
            parallel: true,
            check_finite: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_finite_check(mut self, check_finite: bool) -> Self {
        self.check_finite = check_finite;
        self
    }

    /// Number of leapfrog steps executed: one fewer than the time levels.
    pub fn steps(&self) -> usize {
        self.nt.saturating_sub(1)
    }

    pub fn total_time(&self) -> f64 {
        self.steps() as f64 * self.dt
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    /// Zero-based step after which the field first held a NaN or infinity.
    pub first_non_finite: Option<usize>,
    pub peak_amplitude: f64,
}

/// Every time level of a run, `frames[[it, row, col]]`.
#[derive(Debug, Clone)]
pub struct History {
    pub frames: Array3<f64>,
    pub summary: RunSummary,
}

impl History {
    pub fn len(&self) -> usize {
        self.frames.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame(&self, it: usize) -> ArrayView2<'_, f64> {
        self.frames.slice(s![it, .., ..])
    }

    pub fn last(&self) -> Option<ArrayView2<'_, f64>> {
        self.len().checked_sub(1).map(|it| self.frame(it))
    }
}

/// One acoustic run: grid, medium, source and the leapfrog state.
pub struct Simulation {
    pub grid: Grid,
    pub velocity: VelocityModel,
    pub source: PointSource,
    pub params: SimulationParams,
    pub wavefield: PressureField,
    stf: Vec<f64>,
    source_cell: (usize, usize),
    current_timestep: usize,
    first_non_finite: Option<usize>,
}

impl Simulation {
    /// Validate every precondition and allocate the field buffers.
    pub fn new(
        grid: Grid,
        velocity: VelocityModel,
        source: PointSource,
        stf: Vec<f64>,
        params: SimulationParams,
    ) -> Result<Self> {
        WaveError::check_positive("dt", params.dt)?;
        if velocity.as_array().dim() != grid.shape() {
            return Err(WaveError::FieldShapeMismatch {
                field: "velocity",
                expected: grid.len(),
                found: velocity.as_array().len(),
            });
        }
        source.index(&grid)?;
        if stf.len() < params.steps() {
            return Err(WaveError::InsufficientSourceSamples {
                required: params.steps(),
                provided: stf.len(),
            });
        }

        if !velocity.satisfies_cfl(&grid, params.dt) {
            warn!(
                dt = params.dt,
                max_stable_dt = velocity.stable_dt(&grid, 1.0),
                "time step violates the CFL condition; the solution may diverge"
            );
        }

        let wavefield = PressureField::new(&grid);
        Ok(Self {
            source_cell: (source.sz, source.sx),
            grid,
            velocity,
            source,
            params,
            wavefield,
            stf,
            current_timestep: 0,
            first_non_finite: None,
        })
    }

    /// Replace the zero initial condition with `initial`.
    pub fn with_initial_field(mut self, initial: ArrayView2<'_, f64>) -> Result<Self> {
        if initial.dim() != self.grid.shape() {
            return Err(WaveError::FieldShapeMismatch {
                field: "pressure",
                expected: self.grid.len(),
                found: initial.len(),
            });
        }
        self.wavefield = PressureField::with_initial(&self.grid, initial);
        Ok(self)
    }

    pub fn current_timestep(&self) -> usize {
        self.current_timestep
    }

    pub fn current_time(&self) -> f64 {
        self.current_timestep as f64 * self.params.dt
    }

    pub fn is_finished(&self) -> bool {
        self.current_timestep >= self.params.steps()
    }

    pub fn pressure(&self) -> ArrayView2<'_, f64> {
        self.wavefield.current()
    }

    pub fn source_samples(&self) -> &[f64] {
        &self.stf
    }

    /// Advance one time level. Returns true when this step is the first to
    /// leave a non-finite value in the field. Does nothing once finished.
    pub fn step(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        let it = self.current_timestep;
        let parallel = self.params.parallel;

        // 1. Second derivatives of the current level
        self.wavefield.compute_laplacian(&self.grid, parallel);

        // 2. Leapfrog update into the next level
        self.wavefield
            .leapfrog(&self.velocity, self.params.dt, parallel);

        // 3. Inject this step's source sample
        let (i, j) = self.source_cell;
        self.wavefield.inject(i, j, self.stf[it]);

        // 4. old <- current <- new
        self.wavefield.rotate();
        self.current_timestep += 1;

        if self.params.check_finite
            && self.first_non_finite.is_none()
            && self.wavefield.has_non_finite(parallel)
        {
            self.first_non_finite = Some(it);
            return true;
        }
        false
    }

    fn advance<O: StepObserver>(&mut self, observer: &mut O) {
        let it = self.current_timestep;
        let blew_up = self.step();
        observer.on_step(it, self.current_time(), self.wavefield.current());
        if blew_up {
            observer.on_non_finite(it);
        }
    }

    fn log_start(&self, mode: &str) {
        info!(
            mode,
            nx = self.grid.nx,
            nz = self.grid.nz,
            width = self.grid.width(),
            height = self.grid.height(),
            source_x = self.grid.x_coord(self.source.sx),
            source_z = self.grid.z_coord(self.source.sz),
            dt = self.params.dt,
            cfl_ok = self.velocity.satisfies_cfl(&self.grid, self.params.dt),
            steps = self.params.steps(),
            total_time = self.params.total_time(),
            parallel = self.params.parallel,
            "starting acoustic simulation"
        );
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            steps: self.current_timestep,
            first_non_finite: self.first_non_finite,
            peak_amplitude: self.wavefield.peak_amplitude(),
        }
    }

    /// Snapshot engine: run to the last step, keeping only the current field.
    pub fn run<O: StepObserver>(&mut self, mut observer: O) -> RunSummary {
        self.log_start("snapshot");
        while !self.is_finished() {
            self.advance(&mut observer);
        }
        let summary = self.summary();
        info!(
            steps = summary.steps,
            peak = summary.peak_amplitude,
            "simulation complete"
        );
        summary
    }

    /// History engine: run to the last step, archiving every time level.
    pub fn run_history<O: StepObserver>(&mut self, observer: O) -> Result<History> {
        let (nz, nx) = self.grid.shape();
        let mut frames = Array3::zeros((self.params.nt, nz, nx));
        let summary = self.record_history_into(frames.view_mut(), observer)?;
        Ok(History { frames, summary })
    }

    /// History engine writing into a caller-owned archive of shape
    /// `(nt, nz, nx)`. Frame `it` receives the field at time level `it`;
    /// each frame is written exactly once. Fails with `HistoryAfterStart`
    /// if any step has already been taken.
    pub fn record_history_into<O: StepObserver>(
        &mut self,
        mut archive: ArrayViewMut3<'_, f64>,
        mut observer: O,
    ) -> Result<RunSummary> {
        let (nz, nx) = self.grid.shape();
        let expected = (self.params.nt, nz, nx);
        if archive.dim() != expected {
            return Err(WaveError::FieldShapeMismatch {
                field: "history",
                expected: expected.0 * nz * nx,
                found: archive.len(),
            });
        }

        if self.current_timestep != 0 {
            return Err(WaveError::HistoryAfterStart {
                step: self.current_timestep,
            });
        }

        self.log_start("history");
        if self.params.nt > 0 {
            archive
                .slice_mut(s![0, .., ..])
                .assign(&self.wavefield.current());
        }
        while !self.is_finished() {
            self.advance(&mut observer);
            archive
                .slice_mut(s![self.current_timestep, .., ..])
                .assign(&self.wavefield.current());
        }

        let summary = self.summary();
        info!(
            steps = summary.steps,
            frames = self.params.nt,
            peak = summary.peak_amplitude,
            "simulation complete"
        );
        Ok(summary)
    }
}

fn shape_error(field: &'static str, expected: usize, found: usize) -> WaveError {
    WaveError::FieldShapeMismatch {
        field,
        expected,
        found,
    }
}

/// Flat-buffer snapshot engine.
///
/// `pressure` holds the initial field on entry and the final field on return,
/// both row-major with `nx` columns and `nz` rows.
#[allow(clippy::too_many_arguments)]
pub fn run_snapshot(
    pressure: &mut [f64],
    nx: usize,
    nz: usize,
    dx: f64,
    dz: f64,
    nt: usize,
    dt: f64,
    stf: &[f64],
    sx: usize,
    sz: usize,
    velocity: &[f64],
) -> Result<RunSummary> {
    let grid = Grid::new(nx, nz, dx, dz)?;
    WaveError::check_len("pressure", grid.len(), pressure.len())?;
    let velocity = VelocityModel::from_vec(&grid, velocity.to_vec())?;

    let initial = ArrayView2::from_shape(grid.shape(), &*pressure)
        .map_err(|_| shape_error("pressure", grid.len(), pressure.len()))?;
    let mut sim = Simulation::new(
        grid,
        velocity,
        PointSource::new(sx, sz),
        stf.to_vec(),
        SimulationParams::new(dt, nt),
    )?
    .with_initial_field(initial)?;

    let summary = sim.run(NoopObserver);

    let found = pressure.len();
    ArrayViewMut2::from_shape(grid.shape(), pressure)
        .map_err(|_| shape_error("pressure", grid.len(), found))?
        .assign(&sim.pressure());
    Ok(summary)
}

/// Flat-buffer history engine.
///
/// `history` holds `nt * nx * nz` values, one contiguous field per time
/// level. The first field is read as the initial condition; the remaining
/// `nt - 1` are overwritten with the field after each step.
#[allow(clippy::too_many_arguments)]
pub fn run_history(
    history: &mut [f64],
    nx: usize,
    nz: usize,
    dx: f64,
    dz: f64,
    nt: usize,
    dt: f64,
    stf: &[f64],
    sx: usize,
    sz: usize,
    velocity: &[f64],
) -> Result<RunSummary> {
    let grid = Grid::new(nx, nz, dx, dz)?;
    WaveError::check_len("history", nt * grid.len(), history.len())?;
    let velocity = VelocityModel::from_vec(&grid, velocity.to_vec())?;

    let mut sim = Simulation::new(
        grid,
        velocity,
        PointSource::new(sx, sz),
        stf.to_vec(),
        SimulationParams::new(dt, nt),
    )?;
    if nt > 0 {
        let initial = ArrayView2::from_shape(grid.shape(), &history[..grid.len()])
            .map_err(|_| shape_error("history", nt * grid.len(), history.len()))?;
        sim = sim.with_initial_field(initial)?;
    }

    let found = history.len();
    let archive = ArrayViewMut3::from_shape((nt, nz, nx), history)
        .map_err(|_| shape_error("history", nt * grid.len(), found))?;
    sim.record_history_into(archive, NoopObserver)
}
