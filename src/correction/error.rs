use crate::dataset::DatasetError;
use crate::units::Unit;

/// Errors raised by background subtraction and baseline estimation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CorrectionError {
    /// Background x axis cannot be expressed in the sample's x unit
    #[error("Background '{label}': x unit {found} is incompatible with sample x unit {expected}")]
    AxisUnitMismatch {
        label: String,
        found: Unit,
        expected: Unit,
    },

    /// Background y axis cannot be expressed in the sample's y unit
    #[error("Background '{label}': y unit {found} is incompatible with sample y unit {expected}")]
    IntensityUnitMismatch {
        label: String,
        found: Unit,
        expected: Unit,
    },

    /// Background does not cover the sample's x range
    #[error(
        "Background '{label}' covers [{background_min}, {background_max}] but the sample spans [{sample_min}, {sample_max}]"
    )]
    InsufficientRange {
        label: String,
        background_min: f64,
        background_max: f64,
        sample_min: f64,
        sample_max: f64,
    },

    /// Background weight is not finite
    #[error("Background '{label}': invalid weight {weight}")]
    InvalidWeight { label: String, weight: f64 },

    /// Reference point for offset correction lies outside the data
    #[error("Reference point {x} lies outside the spectrum range [{min}, {max}]")]
    ReferenceOutOfRange { x: f64, min: f64, max: f64 },

    /// Invalid baseline parameter
    #[error("Invalid baseline parameter: {0}")]
    InvalidParameter(String),

    /// Error from the underlying dataset
    #[error("Dataset error: {0}")]
    DatasetError(#[from] DatasetError),
}
