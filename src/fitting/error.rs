use std::fmt;

use crate::dataset::DatasetError;
use crate::value::ValueError;

/// Why the optimizer stopped without converging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceReason {
    IterationLimit,
    TimeLimit,
    Cancelled,
    /// The cost became NaN or infinite
    NonFinite,
}

impl fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergenceReason::IterationLimit => write!(f, "iteration limit reached"),
            DivergenceReason::TimeLimit => write!(f, "time limit reached"),
            DivergenceReason::Cancelled => write!(f, "cancelled"),
            DivergenceReason::NonFinite => write!(f, "non-finite cost"),
        }
    }
}

/// Errors raised by the band fitter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// The optimizer stopped before converging
    #[error("Fit diverged after {iterations} iterations: {reason}")]
    FitDiverged {
        iterations: usize,
        reason: DivergenceReason,
    },

    /// A band parameter converged onto one of its bounds
    #[error("Band {band}: parameter '{parameter}' = {value} is pinned at its bound {bound}")]
    FitBoundsViolation {
        band: usize,
        parameter: &'static str,
        value: f64,
        bound: f64,
    },

    /// The problem is under-determined or ill-conditioned
    #[error("Degenerate fit: {0}")]
    FitDegenerate(String),

    /// The fit range does not contain enough points
    #[error("Fit range [{min}, {max}] contains {points} points")]
    InsufficientData { min: f64, max: f64, points: usize },

    /// Invalid fitter configuration
    #[error("Invalid fit configuration: {0}")]
    InvalidConfig(String),

    /// Error from the underlying dataset
    #[error("Dataset error: {0}")]
    DatasetError(#[from] DatasetError),

    /// Unit error while building band values
    #[error("Unit error: {0}")]
    ValueError(#[from] ValueError),
}
