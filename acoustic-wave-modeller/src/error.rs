//! Error types for the acoustic finite-difference engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, WaveError>;

/// Precondition violations detected before a run starts.
///
/// Numerical blow-up from an unstable time step is not an error; see
/// [`RunSummary::first_non_finite`](crate::simulation::RunSummary).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaveError {
    /// Grid too small for the stencil, or the margin leaves no interior.
    #[error("Invalid grid {nx}x{nz} with stencil margin {margin}: {reason}")]
    InvalidGrid {
        nx: usize,
        nz: usize,
        margin: usize,
        reason: &'static str,
    },

    /// Non-positive or non-finite spacing or time step.
    #[error("Invalid spacing: {name} must be positive and finite, got {value}")]
    InvalidSpacing { name: &'static str, value: f64 },

    /// Source cell lies outside `[0, nx) x [0, nz)`.
    #[error("Source position ({sx}, {sz}) is outside grid bounds ({nx}, {nz})")]
    SourceOutOfBounds {
        sx: usize,
        sz: usize,
        nx: usize,
        nz: usize,
    },

    /// Source-time function is shorter than the number of executed steps.
    #[error("Source-time function has {provided} samples, {required} required")]
    InsufficientSourceSamples { required: usize, provided: usize },

    /// A field buffer does not have the element count the grid requires.
    #[error("Field '{field}' has {found} elements, expected {expected}")]
    FieldShapeMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// History recording needs every time level from the initial one.
    #[error("Cannot record history: simulation already advanced to step {step}")]
    HistoryAfterStart { step: usize },
}

impl WaveError {
    /// Check a spacing-like quantity is strictly positive and finite.
    pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(WaveError::InvalidSpacing { name, value })
        }
    }

    /// Check a buffer length against the expected element count.
    pub(crate) fn check_len(field: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(WaveError::FieldShapeMismatch {
                field,
                expected,
                found,
            })
        }
    }
}
