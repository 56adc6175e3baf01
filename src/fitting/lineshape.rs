use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::fmt;
use std::str::FromStr;

/// `2 * sqrt(2 * ln 2)`, FWHM of a unit-sigma Gaussian
const GAUSSIAN_FWHM_FACTOR: f64 = 2.354_820_045_030_949_3;

/// Parameter slots shared by every model
pub const AMPLITUDE: usize = 0;
pub const CENTER: usize = 1;
pub const WIDTH: usize = 2;
pub const FRACTION: usize = 3;

/// Lineshape of a single absorption band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineshapeModel {
    /// `[amplitude, center, sigma]`
    #[default]
    Gaussian,
    /// `[amplitude, center, half width at half maximum]`
    Lorentzian,
    /// Pseudo-Voigt with a shared half width:
    /// `[amplitude, center, half width at half maximum, lorentz fraction]`
    GaussLorentz,
}

impl LineshapeModel {
    /// Name recorded in the fit result
    pub fn name(&self) -> &'static str {
        match self {
            LineshapeModel::Gaussian => "Gaussian",
            LineshapeModel::Lorentzian => "Lorentzian",
            LineshapeModel::GaussLorentz => "Gauss-Lorentz",
        }
    }

    /// Closed form in terms of the parameter names
    pub fn formula(&self) -> &'static str {
        match self {
            LineshapeModel::Gaussian => "A * exp(-(x - c)^2 / (2 * w^2))",
            LineshapeModel::Lorentzian => "A / (1 + ((x - c) / w)^2)",
            LineshapeModel::GaussLorentz => {
                "A * (eta / (1 + ((x - c) / w)^2) + (1 - eta) * exp(-ln(2) * ((x - c) / w)^2))"
            }
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_names().len()
    }

    /// Parameter names in formula order
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            LineshapeModel::Gaussian | LineshapeModel::Lorentzian => {
                &["amplitude", "center", "width"]
            }
            LineshapeModel::GaussLorentz => &["amplitude", "center", "width", "lorentz_fraction"],
        }
    }

    /// Width parameter corresponding to a full width at half maximum
    pub fn width_from_fwhm(&self, fwhm: f64) -> f64 {
        match self {
            LineshapeModel::Gaussian => fwhm / GAUSSIAN_FWHM_FACTOR,
            LineshapeModel::Lorentzian | LineshapeModel::GaussLorentz => fwhm / 2.0,
        }
    }

    /// Initial parameters for a band seen at `center` with the given height
    /// and FWHM
    pub fn seed(&self, height: f64, center: f64, fwhm: f64) -> Vec<f64> {
        let mut params = vec![height, center, self.width_from_fwhm(fwhm)];
        if *self == LineshapeModel::GaussLorentz {
            params.push(0.5);
        }
        params
    }

    /// Evaluate one band at `x`
    pub fn eval(&self, x: f64, p: &[f64]) -> f64 {
        let u = (x - p[CENTER]) / p[WIDTH];
        match self {
            LineshapeModel::Gaussian => p[AMPLITUDE] * (-0.5 * u * u).exp(),
            LineshapeModel::Lorentzian => p[AMPLITUDE] / (1.0 + u * u),
            LineshapeModel::GaussLorentz => {
                let eta = p[FRACTION];
                let lorentz = 1.0 / (1.0 + u * u);
                let gauss = (-LN_2 * u * u).exp();
                p[AMPLITUDE] * (eta * lorentz + (1.0 - eta) * gauss)
            }
        }
    }

    /// Analytic partial derivatives of one band at `x`, written into `out`
    pub fn gradient(&self, x: f64, p: &[f64], out: &mut [f64]) {
        let a = p[AMPLITUDE];
        let w = p[WIDTH];
        let u = (x - p[CENTER]) / w;
        match self {
            LineshapeModel::Gaussian => {
                let e = (-0.5 * u * u).exp();
                out[AMPLITUDE] = e;
                out[CENTER] = a * e * u / w;
                out[WIDTH] = a * e * u * u / w;
            }
            LineshapeModel::Lorentzian => {
                let d = 1.0 / (1.0 + u * u);
                out[AMPLITUDE] = d;
                out[CENTER] = a * 2.0 * u * d * d / w;
                out[WIDTH] = a * 2.0 * u * u * d * d / w;
            }
            LineshapeModel::GaussLorentz => {
                let eta = p[FRACTION];
                let lorentz = 1.0 / (1.0 + u * u);
                let gauss = (-LN_2 * u * u).exp();
                // d(shape)/du, negated
                let slope = eta * 2.0 * u * lorentz * lorentz + (1.0 - eta) * 2.0 * LN_2 * u * gauss;
                out[AMPLITUDE] = eta * lorentz + (1.0 - eta) * gauss;
                out[CENTER] = a * slope / w;
                out[WIDTH] = a * slope * u / w;
                out[FRACTION] = a * (lorentz - gauss);
            }
        }
    }

    /// Integral of one band over `[lo, hi]` by composite Simpson's rule
    pub fn integrate(&self, p: &[f64], lo: f64, hi: f64) -> f64 {
        const INTERVALS: usize = 512;
        let h = (hi - lo) / INTERVALS as f64;
        let mut sum = self.eval(lo, p) + self.eval(hi, p);
        for i in 1..INTERVALS {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * self.eval(lo + i as f64 * h, p);
        }
        sum * h / 3.0
    }

    /// Area over `center ± k * width`
    pub fn window_area(&self, p: &[f64], k: f64) -> f64 {
        let half = k * p[WIDTH].abs();
        self.integrate(p, p[CENTER] - half, p[CENTER] + half)
    }
}

impl fmt::Display for LineshapeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LineshapeModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "gaussian" | "gauss" => Ok(LineshapeModel::Gaussian),
            "lorentzian" | "lorentz" => Ok(LineshapeModel::Lorentzian),
            "gauss_lorentz" | "pseudo_voigt" | "mixed" => Ok(LineshapeModel::GaussLorentz),
            other => Err(format!(
                "Unknown lineshape: {}. Valid options: gaussian, lorentzian, gauss-lorentz",
                other
            )),
        }
    }
}
