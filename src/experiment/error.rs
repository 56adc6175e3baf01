use super::ids::{AnalysisId, MeasurementId};

/// Errors raised while assembling or (de)serializing an experiment
#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    /// Two measurements share an identifier
    #[error("Duplicate measurement id {0}")]
    DuplicateMeasurement(MeasurementId),

    /// Two analyses share an identifier
    #[error("Duplicate analysis id {0}")]
    DuplicateAnalysis(AnalysisId),

    /// An analysis points at a measurement that is not part of the experiment
    #[error("Analysis {analysis} references unknown measurement {measurement}")]
    DanglingReference {
        analysis: AnalysisId,
        measurement: MeasurementId,
    },

    /// Error serializing/deserializing JSON
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}
