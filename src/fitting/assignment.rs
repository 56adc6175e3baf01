use serde::{Deserialize, Serialize};

use super::band::Band;
use crate::units::Unit;
use crate::value::Value;

/// A band the probe molecule is expected to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedBand {
    pub name: String,
    /// Expected position in cm^-1
    pub location: f64,
    /// Molar extinction coefficient used for quantification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extinction_coefficient: Option<Value>,
}

impl ExpectedBand {
    pub fn new(name: &str, location: f64) -> Self {
        Self {
            name: name.to_string(),
            location,
            extinction_coefficient: None,
        }
    }

    pub fn with_extinction_coefficient(mut self, coefficient: Value) -> Self {
        self.extinction_coefficient = Some(coefficient);
        self
    }
}

/// Maps fitted bands onto expected band names by nearest location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandAssignments {
    pub expected: Vec<ExpectedBand>,
    /// Bands farther than this (cm^-1) from every expected band stay
    /// unassigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

impl Default for BandAssignments {
    fn default() -> Self {
        Self::pyridine()
    }
}

impl BandAssignments {
    /// No expected bands; every band stays unassigned
    pub fn none() -> Self {
        Self {
            expected: Vec::new(),
            max_distance: None,
        }
    }

    /// Pyridine on solid acids, with the integrated molar extinction
    /// coefficients of Emeis (J. Catal. 141, 1993)
    pub fn pyridine() -> Self {
        Self {
            expected: vec![
                ExpectedBand::new("Lewis", 1450.0)
                    .with_extinction_coefficient(Value::new(2.22, Unit::CentimeterPerMicromole)),
                ExpectedBand::new("Lewis + Bronsted", 1490.0),
                ExpectedBand::new("Bronsted", 1545.0)
                    .with_extinction_coefficient(Value::new(1.67, Unit::CentimeterPerMicromole)),
            ],
            max_distance: Some(15.0),
        }
    }

    /// Expected band closest to `location` (in cm^-1), within `max_distance`
    pub fn nearest(&self, location: f64) -> Option<&ExpectedBand> {
        self.expected
            .iter()
            .map(|e| (e, (e.location - location).abs()))
            .filter(|(_, d)| self.max_distance.map_or(true, |max| *d <= max))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| e)
    }

    /// Name the band after its nearest expected band and attach that band's
    /// extinction coefficient. Locations that cannot be expressed in cm^-1
    /// are left unassigned.
    pub fn assign(&self, band: Band) -> Band {
        let location = match band.location().convert(Unit::ReciprocalCentimeter) {
            Ok(v) => v.value(),
            Err(_) => return band,
        };
        match self.nearest(location) {
            Some(expected) => {
                let name = expected.name.clone();
                let coefficient = expected.extinction_coefficient;
                band.with_assignment(&name).with_extinction_coefficient(coefficient)
            }
            None => band,
        }
    }
}
