//! # Background and Baseline Correction
//!
//! Correction runs in two steps:
//!
//! 1. [`subtract_background`]: weighted background spectra are resampled onto
//!    the sample grid and subtracted.
//! 2. [`estimate_baseline`]: a slowly varying floor is estimated under the
//!    bands using a [`BaselineMethod`].
//!
//! [`Corrector::correct`] runs both and keeps every intermediate in a
//! [`CorrectedSpectrum`].
//!
//! ## Example
//!
//! ```rust
//! use irpeak::correction::{BackgroundSpectrum, CorrectionConfig, Corrector};
//! use irpeak::dataset::Dataset;
//! use irpeak::units::Unit;
//!
//! let x: Vec<f64> = (0..200).map(|i| 1400.0 + i as f64).collect();
//! let sample_y = x.iter().map(|v| 0.5 + (-(v - 1545.0f64).powi(2) / 50.0).exp()).collect();
//! let sample = Dataset::from_arrays(x.clone(), Unit::ReciprocalCentimeter, sample_y, Unit::Arbitrary)?;
//! let background = Dataset::from_arrays(x, Unit::ReciprocalCentimeter, vec![0.5; 200], Unit::Arbitrary)?;
//!
//! let corrector = Corrector::new(CorrectionConfig::default());
//! let corrected = corrector.correct(&sample, &[BackgroundSpectrum::new("wafer", &background)])?;
//! assert_eq!(corrected.baseline.len(), 200);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod background;
mod baseline;
mod config;
mod error;

#[cfg(test)]
mod tests;

pub use background::{subtract_background, BackgroundSpectrum};
pub use baseline::{estimate_baseline, fastchrom};
pub use config::{BaselineMethod, CorrectionConfig, FastChromParams};
pub use error::CorrectionError;

use log::debug;

use crate::dataset::{Dataset, Series};

/// Every stage of a corrected spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedSpectrum {
    /// Sample minus backgrounds (after optional region-of-interest cut)
    pub background_subtracted: Dataset,
    /// Estimated baseline on the same grid
    pub baseline: Series,
    /// `background_subtracted - baseline`
    pub baseline_corrected: Dataset,
}

/// Runs the correction stage with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Corrector {
    config: CorrectionConfig,
}

impl Corrector {
    pub fn new(config: CorrectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Subtract backgrounds, cut to the region of interest, estimate and
    /// remove the baseline
    pub fn correct(
        &self,
        sample: &Dataset,
        backgrounds: &[BackgroundSpectrum<'_>],
    ) -> Result<CorrectedSpectrum, CorrectionError> {
        let mut subtracted = subtract_background(sample, backgrounds)?;
        if let Some((min, max)) = self.config.region_of_interest {
            subtracted = subtracted.truncate(min, max)?;
            debug!(
                "Truncated to region of interest ({}, {}): {} points",
                min,
                max,
                subtracted.len()
            );
        }

        let baseline = estimate_baseline(&subtracted, &self.config.baseline_method)?;
        let corrected_y = subtracted
            .y()
            .iter()
            .zip(baseline.data_array())
            .map(|(y, b)| y - b)
            .collect();
        let baseline_corrected = subtracted.with_y(corrected_y)?;
        debug!(
            "Estimated {} baseline over {} points",
            self.config.baseline_method.name(),
            baseline.len()
        );

        Ok(CorrectedSpectrum {
            background_subtracted: subtracted,
            baseline,
            baseline_corrected,
        })
    }
}
