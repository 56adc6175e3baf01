use log::debug;

use super::error::CorrectionError;
use crate::dataset::Dataset;

/// A background spectrum to subtract, with its weight
#[derive(Debug, Clone, Copy)]
pub struct BackgroundSpectrum<'a> {
    pub label: &'a str,
    pub data: &'a Dataset,
    pub weight: f64,
}

impl<'a> BackgroundSpectrum<'a> {
    /// Background with unit weight
    pub fn new(label: &'a str, data: &'a Dataset) -> Self {
        Self {
            label,
            data,
            weight: 1.0,
        }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Subtract weighted backgrounds from a sample spectrum.
///
/// Each background is brought into the sample's units, checked to cover the
/// sample's x range, and linearly resampled onto the sample grid. The result
/// keeps the sample's grid, units and timestamp. With no backgrounds the
/// sample is returned unchanged.
pub fn subtract_background(
    sample: &Dataset,
    backgrounds: &[BackgroundSpectrum<'_>],
) -> Result<Dataset, CorrectionError> {
    if backgrounds.is_empty() {
        return Ok(sample.clone());
    }

    let x_unit = sample.x_axis().unit();
    let y_unit = sample.y_axis().unit();
    let (sample_min, sample_max) = sample.x_range();
    let mut corrected = sample.y().to_vec();

    for background in backgrounds {
        if !background.weight.is_finite() {
            return Err(CorrectionError::InvalidWeight {
                label: background.label.to_string(),
                weight: background.weight,
            });
        }
        let bg_x_unit = background.data.x_axis().unit();
        if !bg_x_unit.is_compatible(x_unit) {
            return Err(CorrectionError::AxisUnitMismatch {
                label: background.label.to_string(),
                found: bg_x_unit,
                expected: x_unit,
            });
        }
        let bg_y_unit = background.data.y_axis().unit();
        if !bg_y_unit.is_compatible(y_unit) {
            return Err(CorrectionError::IntensityUnitMismatch {
                label: background.label.to_string(),
                found: bg_y_unit,
                expected: y_unit,
            });
        }

        let converted = background.data.convert_x(x_unit)?;
        if !converted.covers(sample_min, sample_max) {
            let (background_min, background_max) = converted.x_range();
            return Err(CorrectionError::InsufficientRange {
                label: background.label.to_string(),
                background_min,
                background_max,
                sample_min,
                sample_max,
            });
        }

        let resampled = converted.interpolate(sample.x())?;
        for (c, b) in corrected.iter_mut().zip(resampled) {
            *c -= background.weight * bg_y_unit.convert_magnitude(b, y_unit);
        }
        debug!(
            "Subtracted background '{}' (weight {}) over {} points",
            background.label,
            background.weight,
            corrected.len()
        );
    }

    Ok(sample.with_y(corrected)?)
}
