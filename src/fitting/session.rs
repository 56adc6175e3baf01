use log::{debug, warn};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::band::{Band, Fit};
use super::config::FitConfig;
use super::error::FitError;
use super::lineshape::{LineshapeModel, AMPLITUDE, CENTER, WIDTH};
use super::peaks::{find_candidates, Candidate};
use super::solver::{CancellationToken, LeastSquaresProblem, LevenbergMarquardt};
use crate::dataset::Dataset;
use crate::units::Unit;
use crate::value::{Operation, Value};

/// Reciprocal condition number of `J^T J` below which the fit is degenerate
const MIN_RCOND: f64 = 1e-14;

/// Relative distance (to the fit span) under which a value sits on a bound
const BOUND_TOLERANCE: f64 = 1e-9;

/// Lower width bound relative to the fit span
const MIN_WIDTH_FRACTION: f64 = 1e-6;

/// Stages a fit session moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStage {
    CandidateDetection,
    ModelConstruction,
    Optimization,
    Converged,
    Failed,
}

/// Bands found by a successful fit plus solver statistics
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Bands in the order their seeds were found along the data
    pub bands: Vec<Band>,
    pub iterations: usize,
    pub residual_sum_of_squares: f64,
}

/// Sum of lineshapes evaluated over the fit window
struct BandModel<'a> {
    model: LineshapeModel,
    x: &'a [f64],
    signal: &'a [f64],
    bounds: Vec<(f64, f64)>,
}

impl LeastSquaresProblem for BandModel<'_> {
    fn parameter_count(&self) -> usize {
        self.bounds.len()
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }

    fn residuals(&self, params: &[f64], out: &mut DVector<f64>) {
        let width = self.model.parameter_count();
        for (i, (&x, &y)) in self.x.iter().zip(self.signal).enumerate() {
            let total: f64 = params.chunks(width).map(|p| self.model.eval(x, p)).sum();
            out[i] = total - y;
        }
    }

    fn jacobian(&self, params: &[f64], out: &mut DMatrix<f64>) {
        let width = self.model.parameter_count();
        let mut grad = vec![0.0; width];
        for (i, &x) in self.x.iter().enumerate() {
            for (b, p) in params.chunks(width).enumerate() {
                self.model.gradient(x, p, &mut grad);
                for (j, g) in grad.iter().enumerate() {
                    out[(i, b * width + j)] = *g;
                }
            }
        }
    }

    fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }
}

/// One run of the fitter over one dataset, recording the stages it passed
#[derive(Debug)]
pub struct FitSession<'a> {
    config: &'a FitConfig,
    cancel: Option<CancellationToken>,
    noise: Option<f64>,
    stages: Vec<FitStage>,
}

impl<'a> FitSession<'a> {
    pub fn new(config: &'a FitConfig) -> Self {
        Self {
            config,
            cancel: None,
            noise: None,
            stages: Vec::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Noise standard deviation of the spectrum, raising the prominence
    /// threshold through [`FitConfig::noise_factor`]
    pub fn with_noise_level(mut self, sigma: Option<f64>) -> Self {
        self.noise = sigma;
        self
    }

    /// Current stage, `None` before [`run`](Self::run)
    pub fn stage(&self) -> Option<FitStage> {
        self.stages.last().copied()
    }

    /// Every stage entered so far
    pub fn history(&self) -> &[FitStage] {
        &self.stages
    }

    fn enter(&mut self, stage: FitStage) {
        debug!("Fit stage {:?} -> {:?}", self.stage(), stage);
        self.stages.push(stage);
    }

    /// Detect candidates, build the model, optimize and report bands
    pub fn run(&mut self, data: &Dataset) -> Result<FitOutcome, FitError> {
        match self.run_stages(data) {
            Ok(outcome) => {
                self.enter(FitStage::Converged);
                Ok(outcome)
            }
            Err(e) => {
                self.enter(FitStage::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self, data: &Dataset) -> Result<FitOutcome, FitError> {
        let config = self.config;
        config.validate()?;

        self.enter(FitStage::CandidateDetection);
        let (range_min, range_max) = config.fit_range.unwrap_or_else(|| data.x_range());
        let (x, y): (Vec<f64>, Vec<f64>) = data
            .x()
            .iter()
            .zip(data.y())
            .filter(|(x, _)| **x >= range_min && **x <= range_max)
            .map(|(x, y)| (*x, *y))
            .unzip();
        if x.len() < 3 {
            return Err(FitError::InsufficientData {
                min: range_min,
                max: range_max,
                points: x.len(),
            });
        }
        let signal: Vec<f64> = if config.detection.bands_are_minima() {
            y.iter().map(|v| -v).collect()
        } else {
            y
        };

        let min_prominence = config.effective_prominence(self.noise);
        if min_prominence > config.prominence_threshold {
            debug!(
                "Prominence threshold raised from {} to {} by noise",
                config.prominence_threshold, min_prominence
            );
        }
        let candidates = find_candidates(
            &x,
            &signal,
            min_prominence,
            config.min_distance,
            config.base_rel_height,
            config.max_bands,
        );
        debug!("Found {} band candidates", candidates.len());
        if candidates.is_empty() {
            warn!(
                "No bands with prominence >= {} in [{}, {}]",
                min_prominence, range_min, range_max
            );
            return Ok(FitOutcome {
                bands: Vec::new(),
                iterations: 0,
                residual_sum_of_squares: signal.iter().map(|s| s * s).sum(),
            });
        }

        self.enter(FitStage::ModelConstruction);
        let model = config.model;
        let per_band = model.parameter_count();
        let n_params = candidates.len() * per_band;
        if x.len() <= n_params {
            return Err(FitError::FitDegenerate(format!(
                "{} points cannot determine {} parameters",
                x.len(),
                n_params
            )));
        }
        let span = (x[x.len() - 1] - x[0]).abs();
        let (bounds, initial) = build_bounds(model, &candidates, span);
        let problem = BandModel {
            model,
            x: &x,
            signal: &signal,
            bounds,
        };

        self.enter(FitStage::Optimization);
        let solver = LevenbergMarquardt {
            max_iterations: config.max_iterations,
            tolerance: config.convergence_tolerance,
            deadline: config.time_limit().map(|limit| Instant::now() + limit),
            cancel: self.cancel.clone(),
        };
        let solution = solver
            .minimize(&problem, &initial)
            .map_err(|d| FitError::FitDiverged {
                iterations: d.iterations,
                reason: d.reason,
            })?;
        debug!(
            "Optimization converged after {} iterations, cost {:.6e}",
            solution.iterations, solution.cost
        );

        check_collapsed_centers(&solution.params, per_band, span)?;
        check_bounds(&solution.params, problem.bounds(), per_band, &signal, span)?;
        let covariance = covariance(&solution.jacobian, solution.cost, x.len())?;

        let x_unit = data.x_axis().unit();
        let y_unit = data.y_axis().unit();
        let bands = solution
            .params
            .chunks(per_band)
            .enumerate()
            .map(|(b, p)| {
                let offset = b * per_band;
                let block = covariance.view((offset, offset), (per_band, per_band)).into_owned();
                build_band(model, p, &block, config.integration_width_k, x_unit, y_unit)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FitOutcome {
            bands,
            iterations: solution.iterations,
            residual_sum_of_squares: solution.cost,
        })
    }
}

/// Box bounds and seed parameters for all candidates
fn build_bounds(model: LineshapeModel, candidates: &[Candidate], span: f64) -> (Vec<(f64, f64)>, Vec<f64>) {
    let min_width = span * MIN_WIDTH_FRACTION;
    let mut bounds = Vec::new();
    let mut initial = Vec::new();
    for c in candidates {
        let seed = model.seed(c.height.max(c.prominence), c.position, c.fwhm);
        bounds.push((0.0, f64::INFINITY));
        bounds.push(c.window);
        bounds.push((min_width, span));
        if model == LineshapeModel::GaussLorentz {
            bounds.push((0.0, 1.0));
        }
        initial.extend(seed);
    }
    (bounds, initial)
}

fn check_collapsed_centers(params: &[f64], per_band: usize, span: f64) -> Result<(), FitError> {
    let centers: Vec<f64> = params.chunks(per_band).map(|p| p[CENTER]).collect();
    for (i, pair) in centers.windows(2).enumerate() {
        if (pair[1] - pair[0]).abs() <= BOUND_TOLERANCE * span {
            return Err(FitError::FitDegenerate(format!(
                "bands {} and {} collapsed onto x = {}",
                i,
                i + 1,
                pair[0]
            )));
        }
    }
    Ok(())
}

/// Amplitude, center and width may not end on a bound; the lorentz
/// fraction may
fn check_bounds(
    params: &[f64],
    bounds: &[(f64, f64)],
    per_band: usize,
    signal: &[f64],
    span: f64,
) -> Result<(), FitError> {
    let signal_scale = signal.iter().fold(0.0f64, |acc, s| acc.max(s.abs())).max(f64::MIN_POSITIVE);
    for (b, (p, bnd)) in params.chunks(per_band).zip(bounds.chunks(per_band)).enumerate() {
        for (slot, name, scale) in [
            (AMPLITUDE, "amplitude", signal_scale),
            (CENTER, "center", span),
            (WIDTH, "width", span),
        ] {
            let (lo, hi) = bnd[slot];
            let tol = BOUND_TOLERANCE * scale;
            let pinned = if (p[slot] - lo).abs() <= tol {
                Some(lo)
            } else if hi.is_finite() && (hi - p[slot]).abs() <= tol {
                Some(hi)
            } else {
                None
            };
            if let Some(bound) = pinned {
                return Err(FitError::FitBoundsViolation {
                    band: b,
                    parameter: name,
                    value: p[slot],
                    bound,
                });
            }
        }
    }
    Ok(())
}

/// `s^2 (J^T J)^-1` with `s^2 = cost / (n - p)`
fn covariance(jacobian: &DMatrix<f64>, cost: f64, n_points: usize) -> Result<DMatrix<f64>, FitError> {
    let n_params = jacobian.ncols();
    let jtj = jacobian.transpose() * jacobian;
    let eigen = SymmetricEigen::new(jtj);
    let max = eigen.eigenvalues.amax();
    let min = eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    if !(max > 0.0) || min / max < MIN_RCOND {
        return Err(FitError::FitDegenerate(format!(
            "Jacobian is near-singular (reciprocal condition {:.3e})",
            if max > 0.0 { min / max } else { 0.0 }
        )));
    }
    let inverse_eigenvalues = DMatrix::from_diagonal(&eigen.eigenvalues.map(|l| 1.0 / l));
    let inverse = &eigen.eigenvectors * inverse_eigenvalues * eigen.eigenvectors.transpose();
    let s2 = cost / (n_points - n_params) as f64;
    Ok(inverse * s2)
}

/// Standard error from a covariance block and a gradient
fn propagated_error(gradient: &[f64], covariance: &DMatrix<f64>) -> f64 {
    let g = DVector::from_column_slice(gradient);
    let var = (g.transpose() * covariance * &g)[(0, 0)];
    var.max(0.0).sqrt()
}

fn build_band(
    model: LineshapeModel,
    p: &[f64],
    cov: &DMatrix<f64>,
    k: f64,
    x_unit: Unit,
    y_unit: Unit,
) -> Result<Band, FitError> {
    let units: Vec<Unit> = (0..p.len())
        .map(|j| match j {
            AMPLITUDE => y_unit,
            CENTER | WIDTH => x_unit,
            _ => Unit::Dimensionless,
        })
        .collect();
    let parameters = p
        .iter()
        .zip(&units)
        .enumerate()
        .map(|(j, (&v, &unit))| Value::with_error(v, unit, cov[(j, j)].max(0.0).sqrt()))
        .collect::<Result<Vec<_>, _>>()?;

    // Numeric gradient of the window area with respect to the band parameters
    let area = model.window_area(p, k);
    let mut gradient = vec![0.0; p.len()];
    let mut shifted = p.to_vec();
    for j in 0..p.len() {
        let h = 1e-6 * p[j].abs().max(1e-3);
        shifted[j] = p[j] + h;
        let forward = model.window_area(&shifted, k);
        shifted[j] = p[j] - h;
        let backward = model.window_area(&shifted, k);
        shifted[j] = p[j];
        gradient[j] = (forward - backward) / (2.0 * h);
    }
    let area_error = propagated_error(&gradient, cov);

    // y * x product unit, with the scale folded into the magnitude when the
    // vocabulary has no exact match
    let unit_product = Value::combine(&Value::new(1.0, y_unit), &Value::new(1.0, x_unit), Operation::Multiply)?;
    let area = Value::with_error(
        area * unit_product.value(),
        unit_product.unit(),
        area_error * unit_product.value().abs(),
    )?;

    let center = p[CENTER];
    let half = k * p[WIDTH];
    let location = Value::with_error(center, x_unit, cov[(CENTER, CENTER)].max(0.0).sqrt())?;
    let start = Value::with_error(center - half, x_unit, propagated_error(&edge_gradient(p.len(), -k), cov))?;
    let end = Value::with_error(center + half, x_unit, propagated_error(&edge_gradient(p.len(), k), cov))?;

    Ok(Band::new(Fit::new(model, parameters, area)?, location, start, end))
}

/// Gradient of `center + k * width`
fn edge_gradient(len: usize, k: f64) -> Vec<f64> {
    let mut g = vec![0.0; len];
    g[CENTER] = 1.0;
    g[WIDTH] = k;
    g
}

/// Fits bands with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct BandFitter {
    config: FitConfig,
}

impl BandFitter {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Fit all bands in `data`
    pub fn fit(&self, data: &Dataset) -> Result<FitOutcome, FitError> {
        FitSession::new(&self.config).run(data)
    }

    /// Fit all bands, stopping early once `token` is cancelled
    pub fn fit_with_cancel(&self, data: &Dataset, token: &CancellationToken) -> Result<FitOutcome, FitError> {
        FitSession::new(&self.config)
            .with_cancellation(token.clone())
            .run(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_centers_are_degenerate() {
        let params = [0.5, 1500.0, 4.0, 0.3, 1500.0, 6.0];
        let err = check_collapsed_centers(&params, 3, 200.0).unwrap_err();
        assert!(matches!(err, FitError::FitDegenerate(ref msg) if msg.contains("collapsed")));

        let apart = [0.5, 1499.0, 4.0, 0.3, 1501.0, 6.0];
        assert!(check_collapsed_centers(&apart, 3, 200.0).is_ok());
    }

    #[test]
    fn test_near_singular_jacobian_is_degenerate() {
        // Two identical columns
        let jacobian = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        let err = covariance(&jacobian, 1.0, 4).unwrap_err();
        assert!(matches!(err, FitError::FitDegenerate(ref msg) if msg.contains("near-singular")));

        let jacobian = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
        let cov = covariance(&jacobian, 2.0, 4).unwrap();
        // s^2 = 1, J^T J = 2 I
        assert!((cov[(0, 0)] - 0.5).abs() < 1e-12);
        assert!(cov[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn test_amplitude_on_zero_bound_is_violation() {
        let params = [0.0, 1500.0, 4.0];
        let bounds = [(0.0, f64::INFINITY), (1490.0, 1510.0), (1e-4, 100.0)];
        let err = check_bounds(&params, &bounds, 3, &[0.0, 1.0, 0.0], 100.0).unwrap_err();
        assert!(matches!(
            err,
            FitError::FitBoundsViolation {
                band: 0,
                parameter: "amplitude",
                ..
            }
        ));
    }
}
