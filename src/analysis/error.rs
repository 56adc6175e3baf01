use crate::correction::CorrectionError;
use crate::dataset::DatasetError;
use crate::experiment::{ExperimentError, MeasurementId, MeasurementType};
use crate::fitting::FitError;
use crate::quantity::QuantityError;

/// Errors raised while assembling or computing an analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A referenced measurement is not part of the experiment
    #[error("Dangling {role} reference: measurement {id} is not in the experiment")]
    DanglingReference { id: MeasurementId, role: &'static str },

    /// A measurement was used in the wrong role
    #[error("Measurement '{name}' is a {found} measurement, expected {expected}")]
    MeasurementTypeMismatch {
        name: String,
        expected: MeasurementType,
        found: MeasurementType,
    },

    /// Baseline and corrected data have different lengths
    #[error("Baseline has {baseline_len} points but the corrected data has {data_len}")]
    LengthMismatch { data_len: usize, baseline_len: usize },

    /// The builder was not given a required component
    #[error("Analysis is missing its {0}")]
    MissingComponent(&'static str),

    /// Correction of a measurement failed
    #[error("Correction of '{measurement}' failed: {source}")]
    CorrectionError {
        measurement: String,
        #[source]
        source: CorrectionError,
    },

    /// Band fitting of a measurement failed
    #[error("Band fitting of '{measurement}' failed: {source}")]
    FitError {
        measurement: String,
        #[source]
        source: FitError,
    },

    /// Quantification of a measurement's bands failed
    #[error("Quantification of '{measurement}' failed: {source}")]
    QuantityError {
        measurement: String,
        #[source]
        source: QuantityError,
    },

    /// Error from the underlying dataset
    #[error("Dataset error: {0}")]
    DatasetError(#[from] DatasetError),

    /// Error from the experiment record
    #[error("Experiment error: {0}")]
    ExperimentError(#[from] ExperimentError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Numerical failures affect one analysis; everything else means the
    /// inputs themselves are inconsistent
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            AnalysisError::FitError {
                source: FitError::FitDiverged { .. }
                    | FitError::FitDegenerate(_)
                    | FitError::FitBoundsViolation { .. },
                ..
            } | AnalysisError::QuantityError {
                source: QuantityError::NonFinite { .. },
                ..
            }
        )
    }
}
