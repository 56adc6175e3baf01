use log::debug;

use super::error::AnalysisError;
use super::record::{check_lengths, Analysis};
use crate::dataset::{Dataset, Series};
use crate::experiment::{AnalysisId, Experiment, MeasurementId};
use crate::fitting::Band;
use crate::quantity::{Calculation, Evaluation, MeasurementResult};

/// Builder for [`Analysis`] records.
///
/// Collects the products of the pipeline stages and checks, on
/// [`build`](Self::build), that every referenced measurement exists in the
/// experiment. Nothing is recomputed.
///
/// # Example
///
/// ```rust
/// use irpeak::analysis::AnalysisBuilder;
/// use irpeak::dataset::{Dataset, Series};
/// use irpeak::experiment::{Experiment, Measurement};
/// use irpeak::units::Unit;
///
/// let data = Dataset::from_arrays(vec![1.0, 2.0, 3.0], Unit::ReciprocalCentimeter, vec![0.0, 1.0, 0.0], Unit::Arbitrary)?;
/// let mut experiment = Experiment::new("zeolite");
/// let sample = experiment.add_measurement(Measurement::sample("py 150C", data.clone()))?;
///
/// let analysis = AnalysisBuilder::new(sample)
///     .corrected_data(data)
///     .baseline(Series::zeros(3, Unit::Arbitrary)?)
///     .build(&experiment)?;
/// assert_eq!(analysis.sample_reference(), sample);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisBuilder {
    id: Option<AnalysisId>,
    sample_reference: MeasurementId,
    background_references: Vec<MeasurementId>,
    corrected_data: Option<Dataset>,
    baseline: Option<Series>,
    bands: Vec<Band>,
    calculations: Vec<Calculation>,
    measurement_results: Vec<MeasurementResult>,
}

impl AnalysisBuilder {
    /// Start an analysis of the given sample measurement
    pub fn new(sample_reference: MeasurementId) -> Self {
        Self {
            id: None,
            sample_reference,
            background_references: Vec::new(),
            corrected_data: None,
            baseline: None,
            bands: Vec::new(),
            calculations: Vec::new(),
            measurement_results: Vec::new(),
        }
    }

    /// Use a fixed id instead of a fresh one
    pub fn id(mut self, id: AnalysisId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn background(mut self, id: MeasurementId) -> Self {
        self.background_references.push(id);
        self
    }

    pub fn backgrounds(mut self, ids: impl IntoIterator<Item = MeasurementId>) -> Self {
        self.background_references.extend(ids);
        self
    }

    /// Background-subtracted data, before baseline removal
    pub fn corrected_data(mut self, data: Dataset) -> Self {
        self.corrected_data = Some(data);
        self
    }

    pub fn baseline(mut self, baseline: Series) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn bands(mut self, bands: Vec<Band>) -> Self {
        self.bands.extend(bands);
        self
    }

    pub fn calculation(mut self, calculation: Calculation) -> Self {
        self.calculations.push(calculation);
        self
    }

    pub fn result(mut self, result: MeasurementResult) -> Self {
        self.measurement_results.push(result);
        self
    }

    /// Record a calculation together with its result
    pub fn evaluation(self, evaluation: Evaluation) -> Self {
        self.calculation(evaluation.calculation).result(evaluation.result)
    }

    /// Resolve references against `experiment` and assemble the record
    pub fn build(self, experiment: &Experiment) -> Result<Analysis, AnalysisError> {
        if !experiment.contains(self.sample_reference) {
            return Err(AnalysisError::DanglingReference {
                id: self.sample_reference,
                role: "sample",
            });
        }
        if let Some(&id) = self.background_references.iter().find(|id| !experiment.contains(**id)) {
            return Err(AnalysisError::DanglingReference { id, role: "background" });
        }

        let corrected_data = self
            .corrected_data
            .ok_or(AnalysisError::MissingComponent("corrected data"))?;
        let baseline = self.baseline.ok_or(AnalysisError::MissingComponent("baseline"))?;
        check_lengths(&corrected_data, &baseline)?;

        let id = self.id.unwrap_or_default();
        debug!(
            "Assembled analysis {} of {}: {} bands, {} results",
            id,
            self.sample_reference,
            self.bands.len(),
            self.measurement_results.len()
        );
        Ok(Analysis::from_parts(
            id,
            self.background_references,
            self.sample_reference,
            corrected_data,
            baseline,
            self.bands,
            self.calculations,
            self.measurement_results,
        ))
    }
}
