use serde::{Deserialize, Serialize};

use crate::correction::CorrectionConfig;
use crate::fitting::{BandAssignments, FitConfig};

/// Settings of every pipeline stage.
///
/// Deserializes from sectioned TOML:
///
/// ```toml
/// [correction]
/// region_of_interest = [1400.0, 1700.0]
///
/// [correction.baseline_method]
/// method = "fast_chrom"
/// threshold_percentile = 20.0
///
/// [fitting]
/// model = "gauss_lorentz"
/// max_bands = 4
///
/// [assignments]
/// max_distance = 10.0
/// expected = [{ name = "Lewis", location = 1450.0 }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub correction: CorrectionConfig,
    pub fitting: FitConfig,
    pub assignments: BandAssignments,
}

impl AnalysisConfig {
    pub fn with_correction(mut self, correction: CorrectionConfig) -> Self {
        self.correction = correction;
        self
    }

    pub fn with_fitting(mut self, fitting: FitConfig) -> Self {
        self.fitting = fitting;
        self
    }

    pub fn with_assignments(mut self, assignments: BandAssignments) -> Self {
        self.assignments = assignments;
        self
    }
}
