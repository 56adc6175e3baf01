use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::FitError;
use super::lineshape::LineshapeModel;
use crate::experiment::Detection;

/// Configuration of the band fitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Lineshape used for every band
    pub model: LineshapeModel,

    /// Only points with `min <= x <= max` take part in the fit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_range: Option<(f64, f64)>,

    /// Minimum prominence of a candidate band, in y units
    pub prominence_threshold: f64,

    /// Minimum separation of candidate maxima, in samples; the taller wins
    pub min_distance: usize,

    /// With a noise estimate, the prominence threshold is raised to
    /// `noise_factor * sigma`; 0 disables
    pub noise_factor: f64,

    /// Transmittance spectra are fitted on the inverted signal
    pub detection: Detection,

    /// Levenberg-Marquardt iteration budget
    pub max_iterations: usize,

    /// Relative change in cost or step below which the fit has converged
    pub convergence_tolerance: f64,

    /// Band area is integrated over `center ± k * width`
    pub integration_width_k: f64,

    /// Relative height at which the band base is measured to bound the center
    pub base_rel_height: f64,

    /// Keep only the most prominent candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bands: Option<usize>,

    /// Wall-clock budget for one fit, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            model: LineshapeModel::Gaussian,
            fit_range: None,
            prominence_threshold: 0.01,
            min_distance: 10,
            noise_factor: 5.0,
            detection: Detection::Absorbance,
            max_iterations: 500,
            convergence_tolerance: 1e-10,
            integration_width_k: 3.0,
            base_rel_height: 0.96,
            max_bands: None,
            time_limit_ms: None,
        }
    }
}

impl FitConfig {
    /// Small iteration budget and looser tolerance, for previews
    pub fn quick() -> Self {
        Self {
            max_iterations: 100,
            convergence_tolerance: 1e-6,
            time_limit_ms: Some(1_000),
            ..Self::default()
        }
    }

    /// Default settings
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Large iteration budget and tight tolerance
    pub fn thorough() -> Self {
        Self {
            max_iterations: 5_000,
            convergence_tolerance: 1e-13,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: LineshapeModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_fit_range(mut self, min: f64, max: f64) -> Self {
        self.fit_range = Some((min.min(max), min.max(max)));
        self
    }

    /// Prominence threshold in effect for a signal with the given noise
    pub fn effective_prominence(&self, noise: Option<f64>) -> f64 {
        match noise {
            Some(sigma) => self.prominence_threshold.max(self.noise_factor * sigma),
            None => self.prominence_threshold,
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Reject settings the fitter cannot work with
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_iterations == 0 {
            return Err(FitError::InvalidConfig("max_iterations must be positive".into()));
        }
        if !(self.convergence_tolerance > 0.0 && self.convergence_tolerance.is_finite()) {
            return Err(FitError::InvalidConfig(format!(
                "convergence_tolerance must be positive, got {}",
                self.convergence_tolerance
            )));
        }
        if !(self.prominence_threshold >= 0.0 && self.prominence_threshold.is_finite()) {
            return Err(FitError::InvalidConfig(format!(
                "prominence_threshold must be non-negative, got {}",
                self.prominence_threshold
            )));
        }
        if self.min_distance == 0 {
            return Err(FitError::InvalidConfig("min_distance must be at least 1".into()));
        }
        if !(self.noise_factor >= 0.0 && self.noise_factor.is_finite()) {
            return Err(FitError::InvalidConfig(format!(
                "noise_factor must be non-negative, got {}",
                self.noise_factor
            )));
        }
        if !(self.integration_width_k > 0.0 && self.integration_width_k.is_finite()) {
            return Err(FitError::InvalidConfig(format!(
                "integration_width_k must be positive, got {}",
                self.integration_width_k
            )));
        }
        if !(self.base_rel_height > 0.0 && self.base_rel_height <= 1.0) {
            return Err(FitError::InvalidConfig(format!(
                "base_rel_height must lie in (0, 1], got {}",
                self.base_rel_height
            )));
        }
        if self.max_bands == Some(0) {
            return Err(FitError::InvalidConfig("max_bands must be positive".into()));
        }
        if let Some((min, max)) = self.fit_range {
            if !(min < max) {
                return Err(FitError::InvalidConfig(format!(
                    "fit_range must satisfy min < max, got ({}, {})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}
