use crate::value::ValueError;

/// Errors raised while building or transforming series and datasets
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// A series must contain at least one point
    #[error("Series is empty")]
    EmptySeries,

    /// NaN or infinite entry in a series
    #[error("Non-finite value {value} at index {index}")]
    NonFinite { index: usize, value: f64 },

    /// x and y arrays differ in length
    #[error("Axis length mismatch: x has {x_len} points, y has {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },

    /// The x axis is not strictly monotonic
    #[error("x axis is not strictly monotonic at index {index}")]
    NonMonotonic { index: usize },

    /// Interpolation requested outside the covered x range
    #[error("x = {x} lies outside the dataset range [{min}, {max}]")]
    OutOfRange { x: f64, min: f64, max: f64 },

    /// Truncation window selects no points
    #[error("Window [{min}, {max}] contains no points")]
    EmptyWindow { min: f64, max: f64 },

    /// Unit conversion of an axis failed
    #[error("Unit error: {0}")]
    UnitError(#[from] ValueError),
}
