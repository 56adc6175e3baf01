//! TOML configuration file support.
//!
//! Every section is optional; a missing `[fitting]` section falls back to the
//! selected profile.
//!
//! ```toml
//! # irpeak.toml
//! [correction]
//! region_of_interest = [1400.0, 1700.0]
//!
//! [correction.baseline_method]
//! method = "fast_chrom"
//! threshold_percentile = 15.0
//!
//! [fitting]
//! model = "gaussian"
//! prominence_threshold = 0.005
//! min_distance = 10
//!
//! [preparation]
//! mass = { value = 20.0, unit = "mg", error = 0.1 }
//! sample_area = { value = 2.01, unit = "cm^2" }
//! probe_molecule = "pyridine"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::profile::FitProfile;
use irpeak::analysis::AnalysisConfig;
use irpeak::correction::CorrectionConfig;
use irpeak::experiment::SamplePreparation;
use irpeak::fitting::{BandAssignments, FitConfig};

/// Root configuration structure for irpeak.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Background and baseline correction settings.
    #[serde(default)]
    pub correction: Option<CorrectionConfig>,

    /// Band fitter settings; replaces the profile when present.
    #[serde(default)]
    pub fitting: Option<FitConfig>,

    /// Expected bands; pyridine when absent.
    #[serde(default)]
    pub assignments: Option<BandAssignments>,

    /// Wafer parameters used for quantification.
    #[serde(default)]
    pub preparation: Option<SamplePreparation>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Pipeline settings, with `profile` standing in for a missing
    /// `[fitting]` section
    pub fn analysis_config(&self, profile: FitProfile) -> AnalysisConfig {
        AnalysisConfig::default()
            .with_correction(self.correction.clone().unwrap_or_default())
            .with_fitting(self.fitting.clone().unwrap_or_else(|| profile.fit_config()))
            .with_assignments(self.assignments.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irpeak::correction::BaselineMethod;
    use irpeak::fitting::LineshapeModel;
    use irpeak::units::Unit;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [correction]
            region_of_interest = [1400.0, 1700.0]

            [correction.baseline_method]
            method = "reference_point"
            x = 1680.0

            [fitting]
            model = "lorentzian"
            max_iterations = 50

            [preparation]
            mass = { value = 20.0, unit = "mg", error = 0.1 }
            sample_area = { value = 2.0, unit = "cm^2" }
        "#;

        let config = Config::from_str(toml).unwrap();
        let correction = config.correction.as_ref().unwrap();
        assert_eq!(correction.region_of_interest, Some((1400.0, 1700.0)));
        assert_eq!(correction.baseline_method, BaselineMethod::ReferencePoint { x: 1680.0 });

        let analysis = config.analysis_config(FitProfile::Thorough);
        assert_eq!(analysis.fitting.model, LineshapeModel::Lorentzian);
        assert_eq!(analysis.fitting.max_iterations, 50);

        let preparation = config.preparation.unwrap();
        assert_eq!(preparation.mass.unwrap().unit(), Unit::Milligram);
        assert_eq!(preparation.mass.unwrap().error(), Some(0.1));
    }

    #[test]
    fn test_profile_fills_missing_fitting() {
        let config = Config::from_str("[correction]\n").unwrap();
        let analysis = config.analysis_config(FitProfile::Quick);
        assert_eq!(analysis.fitting, FitConfig::quick());
        assert_eq!(analysis.assignments, BandAssignments::pyridine());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.fitting.is_none());
        assert!(config.preparation.is_none());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fitting]\nmodel = \"gauss_lorentz\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.fitting.unwrap().model, LineshapeModel::GaussLorentz);
    }

    #[test]
    fn test_invalid_config_reports_error() {
        assert!(Config::from_str("[fitting]\nmodel = \"voigt\"").is_err());
        assert!(Config::from_file(Path::new("/nonexistent/irpeak.toml")).is_err());
    }
}
