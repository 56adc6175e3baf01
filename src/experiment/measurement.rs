use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::MeasurementId;
use crate::dataset::Dataset;
use crate::value::Value;

/// Role of a measurement within the experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementType {
    Background,
    Sample,
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementType::Background => write!(f, "Background"),
            MeasurementType::Sample => write!(f, "Sample"),
        }
    }
}

/// What the detector recorded on the y axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detection {
    Transmittance,
    #[default]
    Absorbance,
    Intensity,
}

impl Detection {
    /// True when bands appear as minima of the signal
    pub fn bands_are_minima(&self) -> bool {
        match self {
            Detection::Transmittance => true,
            Detection::Absorbance | Detection::Intensity => false,
        }
    }
}

/// One recorded spectrum plus its acquisition conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    id: MeasurementId,
    name: String,
    #[serde(default)]
    detection: Detection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geometry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pressure: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    varied_parameter_value: Option<Value>,
    measurement_type: MeasurementType,
    measurement_data: Dataset,
}

impl Measurement {
    /// Create a measurement with a fresh identifier
    pub fn new(name: &str, measurement_type: MeasurementType, measurement_data: Dataset) -> Self {
        Self {
            id: MeasurementId::new(),
            name: name.to_string(),
            detection: Detection::default(),
            geometry: None,
            temperature: None,
            pressure: None,
            varied_parameter_value: None,
            measurement_type,
            measurement_data,
        }
    }

    /// Shorthand for a sample measurement
    pub fn sample(name: &str, data: Dataset) -> Self {
        Self::new(name, MeasurementType::Sample, data)
    }

    /// Shorthand for a background measurement
    pub fn background(name: &str, data: Dataset) -> Self {
        Self::new(name, MeasurementType::Background, data)
    }

    pub fn with_id(mut self, id: MeasurementId) -> Self {
        self.id = id;
        self
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_geometry(mut self, geometry: &str) -> Self {
        self.geometry = Some(geometry.to_string());
        self
    }

    pub fn with_temperature(mut self, temperature: Value) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_pressure(mut self, pressure: Value) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_varied_parameter_value(mut self, value: Value) -> Self {
        self.varied_parameter_value = Some(value);
        self
    }

    pub fn id(&self) -> MeasurementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detection(&self) -> Detection {
        self.detection
    }

    pub fn geometry(&self) -> Option<&str> {
        self.geometry.as_deref()
    }

    pub fn temperature(&self) -> Option<&Value> {
        self.temperature.as_ref()
    }

    pub fn pressure(&self) -> Option<&Value> {
        self.pressure.as_ref()
    }

    pub fn varied_parameter_value(&self) -> Option<&Value> {
        self.varied_parameter_value.as_ref()
    }

    pub fn measurement_type(&self) -> MeasurementType {
        self.measurement_type
    }

    pub fn data(&self) -> &Dataset {
        &self.measurement_data
    }
}
