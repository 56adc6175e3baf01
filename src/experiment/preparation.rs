use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Synthesis and pellet parameters needed to turn band areas into
/// site densities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplePreparation {
    /// Mass of the self-supporting wafer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<Value>,

    /// Irradiated area of the wafer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_area: Option<Value>,

    /// Relative amount of components used in preparation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,

    /// Probe molecule (e.g., "pyridine")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_molecule: Option<String>,

    /// Literature used for the preparation procedure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub literature_references: Vec<String>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Temperature of the desorption step preceding the measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desorption_temperature: Option<Value>,

    /// Duration of the desorption step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desorption_time: Option<Value>,
}

impl SamplePreparation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mass(mut self, mass: Value) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_sample_area(mut self, area: Value) -> Self {
        self.sample_area = Some(area);
        self
    }

    pub fn with_probe_molecule(mut self, probe: &str) -> Self {
        self.probe_molecule = Some(probe.to_string());
        self
    }

    pub fn add_literature_reference(&mut self, reference: &str) {
        self.literature_references.push(reference.to_string());
    }

    /// Both wafer mass and area are known, so band areas can be quantified
    pub fn is_complete(&self) -> bool {
        self.mass.is_some() && self.sample_area.is_some()
    }

    /// Names of the wafer parameters that are still missing
    pub fn missing_wafer_inputs(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.mass.is_none() {
            missing.push("mass");
        }
        if self.sample_area.is_none() {
            missing.push("area");
        }
        missing
    }
}
