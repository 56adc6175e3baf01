use serde::{Deserialize, Serialize};

use super::error::AnalysisError;
use crate::dataset::{Dataset, Series};
use crate::experiment::{AnalysisId, MeasurementId};
use crate::fitting::Band;
use crate::quantity::{Calculation, FlatResult, MeasurementResult};

/// The outcome of running the pipeline on one sample measurement.
///
/// Measurements are referenced by id. `corrected_data` holds the
/// background-subtracted spectrum before baseline removal; subtract
/// `baseline` to get the spectrum the bands were fitted to (see
/// [`baseline_corrected`](Self::baseline_corrected)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnalysisRepr")]
pub struct Analysis {
    id: AnalysisId,
    background_references: Vec<MeasurementId>,
    sample_reference: MeasurementId,
    corrected_data: Dataset,
    baseline: Series,
    bands: Vec<Band>,
    calculations: Vec<Calculation>,
    measurement_results: Vec<MeasurementResult>,
}

#[derive(Deserialize)]
struct AnalysisRepr {
    id: AnalysisId,
    #[serde(default)]
    background_references: Vec<MeasurementId>,
    sample_reference: MeasurementId,
    corrected_data: Dataset,
    baseline: Series,
    #[serde(default)]
    bands: Vec<Band>,
    #[serde(default)]
    calculations: Vec<Calculation>,
    #[serde(default)]
    measurement_results: Vec<MeasurementResult>,
}

impl TryFrom<AnalysisRepr> for Analysis {
    type Error = AnalysisError;

    fn try_from(repr: AnalysisRepr) -> Result<Self, Self::Error> {
        check_lengths(&repr.corrected_data, &repr.baseline)?;
        Ok(Self {
            id: repr.id,
            background_references: repr.background_references,
            sample_reference: repr.sample_reference,
            corrected_data: repr.corrected_data,
            baseline: repr.baseline,
            bands: repr.bands,
            calculations: repr.calculations,
            measurement_results: repr.measurement_results,
        })
    }
}

pub(crate) fn check_lengths(data: &Dataset, baseline: &Series) -> Result<(), AnalysisError> {
    if data.len() != baseline.len() {
        return Err(AnalysisError::LengthMismatch {
            data_len: data.len(),
            baseline_len: baseline.len(),
        });
    }
    Ok(())
}

impl Analysis {
    pub(crate) fn from_parts(
        id: AnalysisId,
        background_references: Vec<MeasurementId>,
        sample_reference: MeasurementId,
        corrected_data: Dataset,
        baseline: Series,
        bands: Vec<Band>,
        calculations: Vec<Calculation>,
        measurement_results: Vec<MeasurementResult>,
    ) -> Self {
        Self {
            id,
            background_references,
            sample_reference,
            corrected_data,
            baseline,
            bands,
            calculations,
            measurement_results,
        }
    }

    pub fn id(&self) -> AnalysisId {
        self.id
    }

    pub fn sample_reference(&self) -> MeasurementId {
        self.sample_reference
    }

    pub fn background_references(&self) -> &[MeasurementId] {
        &self.background_references
    }

    pub fn corrected_data(&self) -> &Dataset {
        &self.corrected_data
    }

    pub fn baseline(&self) -> &Series {
        &self.baseline
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn calculations(&self) -> &[Calculation] {
        &self.calculations
    }

    pub fn measurement_results(&self) -> &[MeasurementResult] {
        &self.measurement_results
    }

    /// Result by name
    pub fn result(&self, name: &str) -> Option<&MeasurementResult> {
        self.measurement_results.iter().find(|r| r.name == name)
    }

    /// Results in the list-based layout
    pub fn flat_results(&self) -> Vec<FlatResult> {
        self.measurement_results.iter().map(FlatResult::from).collect()
    }

    /// Corrected data with the baseline removed
    pub fn baseline_corrected(&self) -> Result<Dataset, AnalysisError> {
        let y = self
            .corrected_data
            .y()
            .iter()
            .zip(self.baseline.data_array())
            .map(|(y, b)| y - b)
            .collect();
        Ok(self.corrected_data.with_y(y)?)
    }

    /// Serialize the analysis to JSON
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize an analysis from JSON
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }
}
