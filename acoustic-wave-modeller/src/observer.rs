//! Progress hooks for the time loop.
//!
//! The engine never writes to a terminal itself; anything that wants to watch
//! a run implements [`StepObserver`] and is passed to the run methods.

use ndarray::ArrayView2;
use tracing::{debug, warn};

/// Called by the time loop after every completed step.
pub trait StepObserver {
    /// `step` is the zero-based index of the step just completed and `field`
    /// the pressure it produced.
    fn on_step(&mut self, _step: usize, _time: f64, _field: ArrayView2<'_, f64>) {}

    /// First step whose field contains a NaN or infinity. Only called when
    /// finite checks are enabled.
    fn on_non_finite(&mut self, _step: usize) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Logs progress through `tracing` every `report_every` steps.
#[derive(Debug, Clone)]
pub struct ProgressLogger {
    report_every: usize,
    total_steps: usize,
}

impl ProgressLogger {
    pub fn new(report_every: usize, total_steps: usize) -> Self {
        Self {
            report_every: report_every.max(1),
            total_steps,
        }
    }
}

impl StepObserver for ProgressLogger {
    fn on_step(&mut self, step: usize, time: f64, field: ArrayView2<'_, f64>) {
        let done = step + 1;
        if done % self.report_every == 0 || done == self.total_steps {
            let peak = field.iter().map(|v| v.abs()).fold(0.0_f64, f64::max);
            debug!(step = done, total = self.total_steps, time, peak, "time step");
        }
    }

    fn on_non_finite(&mut self, step: usize) {
        warn!(step, "pressure field is no longer finite; check the CFL condition");
    }
}

impl<T: StepObserver + ?Sized> StepObserver for &mut T {
    fn on_step(&mut self, step: usize, time: f64, field: ArrayView2<'_, f64>) {
        (**self).on_step(step, time, field);
    }

    fn on_non_finite(&mut self, step: usize) {
        (**self).on_non_finite(step);
    }
}
