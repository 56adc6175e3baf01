use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::ExperimentError;
use super::ids::{AnalysisId, ExperimentId, MeasurementId};
use super::measurement::{Measurement, MeasurementType};
use super::preparation::SamplePreparation;
use crate::analysis::Analysis;

/// One experiment: its measurements, how the sample was prepared, and the
/// analyses computed from them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ExperimentRepr")]
pub struct Experiment {
    id: ExperimentId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    varied_parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_preparation: Option<SamplePreparation>,
    measurements: Vec<Measurement>,
    analyses: Vec<Analysis>,
    #[serde(skip)]
    index: HashMap<MeasurementId, usize>,
}

#[derive(Deserialize)]
struct ExperimentRepr {
    id: ExperimentId,
    name: String,
    #[serde(default)]
    varied_parameter: Option<String>,
    #[serde(default)]
    sample_preparation: Option<SamplePreparation>,
    #[serde(default)]
    measurements: Vec<Measurement>,
    #[serde(default)]
    analyses: Vec<Analysis>,
}

impl TryFrom<ExperimentRepr> for Experiment {
    type Error = ExperimentError;

    fn try_from(repr: ExperimentRepr) -> Result<Self, Self::Error> {
        let mut experiment = Experiment::new(&repr.name).with_id(repr.id);
        experiment.varied_parameter = repr.varied_parameter;
        experiment.sample_preparation = repr.sample_preparation;
        for measurement in repr.measurements {
            experiment.add_measurement(measurement)?;
        }
        for analysis in repr.analyses {
            experiment.add_analysis(analysis)?;
        }
        Ok(experiment)
    }
}

impl PartialEq for Experiment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.varied_parameter == other.varied_parameter
            && self.sample_preparation == other.sample_preparation
            && self.measurements == other.measurements
            && self.analyses == other.analyses
    }
}

impl Experiment {
    /// Create an empty experiment
    pub fn new(name: &str) -> Self {
        Self {
            id: ExperimentId::new(),
            name: name.to_string(),
            varied_parameter: None,
            sample_preparation: None,
            measurements: Vec::new(),
            analyses: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: ExperimentId) -> Self {
        self.id = id;
        self
    }

    /// Name of the parameter varied across measurements (e.g. "temperature")
    pub fn with_varied_parameter(mut self, parameter: &str) -> Self {
        self.varied_parameter = Some(parameter.to_string());
        self
    }

    pub fn with_sample_preparation(mut self, preparation: SamplePreparation) -> Self {
        self.sample_preparation = Some(preparation);
        self
    }

    pub fn id(&self) -> ExperimentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn varied_parameter(&self) -> Option<&str> {
        self.varied_parameter.as_deref()
    }

    pub fn sample_preparation(&self) -> Option<&SamplePreparation> {
        self.sample_preparation.as_ref()
    }

    /// Add a measurement and index it by id
    pub fn add_measurement(&mut self, measurement: Measurement) -> Result<MeasurementId, ExperimentError> {
        let id = measurement.id();
        if self.index.contains_key(&id) {
            return Err(ExperimentError::DuplicateMeasurement(id));
        }
        self.index.insert(id, self.measurements.len());
        self.measurements.push(measurement);
        Ok(id)
    }

    /// Look up a measurement by id
    pub fn measurement(&self, id: MeasurementId) -> Option<&Measurement> {
        self.index.get(&id).and_then(|&i| self.measurements.get(i))
    }

    pub fn contains(&self, id: MeasurementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Measurements of the given type, in insertion order
    pub fn measurements_of(&self, kind: MeasurementType) -> impl Iterator<Item = &Measurement> {
        self.measurements
            .iter()
            .filter(move |m| m.measurement_type() == kind)
    }

    pub fn samples(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements_of(MeasurementType::Sample)
    }

    pub fn backgrounds(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements_of(MeasurementType::Background)
    }

    pub fn analyses(&self) -> &[Analysis] {
        &self.analyses
    }

    pub fn analysis(&self, id: AnalysisId) -> Option<&Analysis> {
        self.analyses.iter().find(|a| a.id() == id)
    }

    /// Attach an analysis. Every measurement it references must exist.
    pub fn add_analysis(&mut self, analysis: Analysis) -> Result<AnalysisId, ExperimentError> {
        let id = analysis.id();
        if self.analysis(id).is_some() {
            return Err(ExperimentError::DuplicateAnalysis(id));
        }
        let references =
            std::iter::once(analysis.sample_reference()).chain(analysis.background_references().iter().copied());
        for measurement in references {
            if !self.contains(measurement) {
                return Err(ExperimentError::DanglingReference {
                    analysis: id,
                    measurement,
                });
            }
        }
        self.analyses.push(analysis);
        Ok(id)
    }

    /// Detach an analysis; the measurements it referenced stay
    pub fn remove_analysis(&mut self, id: AnalysisId) -> Option<Analysis> {
        let position = self.analyses.iter().position(|a| a.id() == id)?;
        Some(self.analyses.remove(position))
    }

    /// Serialize the experiment to JSON
    pub fn to_json(&self) -> Result<String, ExperimentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize an experiment from JSON, rebuilding the id index
    pub fn from_json(json: &str) -> Result<Self, ExperimentError> {
        Ok(serde_json::from_str(json)?)
    }
}
