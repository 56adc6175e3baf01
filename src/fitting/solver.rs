//! Bounded Levenberg-Marquardt least squares.
//!
//! Parameters are kept inside box bounds by projecting every trial step.
//! Parameters sitting on a bound whose gradient points outward are held
//! fixed, and convergence is judged on the gradient of the remaining free
//! parameters. The damping follows Marquardt's diagonal scaling of `J^T J`.

use log::debug;
use nalgebra::{DMatrix, DVector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::error::DivergenceReason;

/// Cooperative cancellation flag shared between a caller and a running fit
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every fit holding this token to stop at its next iteration
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A least-squares problem `min Σ r_i(p)^2` over a box
pub trait LeastSquaresProblem {
    fn parameter_count(&self) -> usize;

    fn residual_count(&self) -> usize;

    /// Residuals at `params`, written into `out`
    fn residuals(&self, params: &[f64], out: &mut DVector<f64>);

    /// Jacobian of the residuals at `params`, written into `out`
    fn jacobian(&self, params: &[f64], out: &mut DMatrix<f64>);

    /// `(lower, upper)` bound of every parameter
    fn bounds(&self) -> &[(f64, f64)];
}

/// Converged solver state
#[derive(Debug, Clone)]
pub struct Solution {
    pub params: Vec<f64>,
    /// Sum of squared residuals
    pub cost: f64,
    pub iterations: usize,
    /// Jacobian at the solution
    pub jacobian: DMatrix<f64>,
}

/// Solver stop condition other than convergence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    pub iterations: usize,
    pub reason: DivergenceReason,
}

/// Levenberg-Marquardt settings
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancellationToken>,
}

const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DIAGONAL: f64 = 1e-12;

fn project(params: &mut [f64], bounds: &[(f64, f64)]) {
    for (p, (lo, hi)) in params.iter_mut().zip(bounds) {
        *p = p.clamp(*lo, *hi);
    }
}

fn sum_of_squares(r: &DVector<f64>) -> f64 {
    r.iter().map(|v| v * v).sum()
}

fn held_at_bound(p: f64, gradient: f64, (lo, hi): (f64, f64)) -> bool {
    (p <= lo && gradient > 0.0) || (p >= hi && gradient < 0.0)
}

/// Every free gradient component is small against its Jacobian column and
/// the residual norm (the cosine between residuals and column)
fn gradient_converged(
    jacobian: &DMatrix<f64>,
    gradient: &DVector<f64>,
    free: &[usize],
    cost: f64,
    tolerance: f64,
) -> bool {
    let residual_norm = cost.sqrt();
    free.iter()
        .all(|&i| gradient[i].abs() <= tolerance * jacobian.column(i).norm() * residual_norm)
}

impl LevenbergMarquardt {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            deadline: None,
            cancel: None,
        }
    }

    fn interrupted(&self) -> Option<DivergenceReason> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(DivergenceReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(DivergenceReason::TimeLimit);
        }
        None
    }

    /// Minimize starting from `initial` (projected into the bounds first)
    pub fn minimize<P: LeastSquaresProblem>(
        &self,
        problem: &P,
        initial: &[f64],
    ) -> Result<Solution, Divergence> {
        let n_params = problem.parameter_count();
        let n_residuals = problem.residual_count();
        let bounds = problem.bounds();

        let mut params = initial.to_vec();
        project(&mut params, bounds);

        let mut residuals = DVector::zeros(n_residuals);
        let mut trial_residuals = DVector::zeros(n_residuals);
        let mut jacobian = DMatrix::zeros(n_residuals, n_params);
        problem.residuals(&params, &mut residuals);
        let mut cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(Divergence {
                iterations: 0,
                reason: DivergenceReason::NonFinite,
            });
        }

        let mut damping: Option<f64> = None;
        let mut nu = 2.0;
        let mut jacobian_stale = true;

        for iteration in 1..=self.max_iterations {
            if let Some(reason) = self.interrupted() {
                return Err(Divergence {
                    iterations: iteration - 1,
                    reason,
                });
            }

            if jacobian_stale {
                problem.jacobian(&params, &mut jacobian);
                jacobian_stale = false;
            }
            let gradient = jacobian.transpose() * &residuals;

            // A parameter resting on a bound with the descent direction
            // pointing out of the box is held for this iteration
            let free: Vec<usize> = (0..n_params)
                .filter(|&i| !held_at_bound(params[i], gradient[i], bounds[i]))
                .collect();
            if free.is_empty() || gradient_converged(&jacobian, &gradient, &free, cost, self.tolerance) {
                debug!("LM converged on the projected gradient at iteration {}", iteration);
                return Ok(Solution {
                    params,
                    cost,
                    iterations: iteration,
                    jacobian,
                });
            }

            let reduced = jacobian.select_columns(&free);
            let jtj = reduced.transpose() * &reduced;
            let reduced_gradient = reduced.transpose() * &residuals;

            let max_diag = jtj.diagonal().amax().max(MIN_DIAGONAL);
            let lambda = *damping.get_or_insert(INITIAL_DAMPING * max_diag);

            let mut system = jtj.clone();
            for i in 0..free.len() {
                system[(i, i)] += lambda * jtj[(i, i)].max(MIN_DIAGONAL * max_diag);
            }
            let rhs = -&reduced_gradient;
            let step = match system.clone().cholesky() {
                Some(chol) => chol.solve(&rhs),
                None => match system.lu().solve(&rhs) {
                    Some(step) => step,
                    None => {
                        damping = Some(lambda * nu);
                        nu *= 2.0;
                        continue;
                    }
                },
            };

            let mut trial = params.clone();
            for (&i, s) in free.iter().zip(step.iter()) {
                trial[i] += s;
            }
            project(&mut trial, bounds);

            let step_norm = trial
                .iter()
                .zip(&params)
                .map(|(t, p)| (t - p).powi(2))
                .sum::<f64>()
                .sqrt();
            let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();
            let small_step = step_norm <= self.tolerance * (param_norm + self.tolerance);

            problem.residuals(&trial, &mut trial_residuals);
            let trial_cost = sum_of_squares(&trial_residuals);

            if trial_cost.is_finite() && trial_cost < cost {
                let small_change = cost - trial_cost <= self.tolerance * cost;
                params = trial;
                std::mem::swap(&mut residuals, &mut trial_residuals);
                cost = trial_cost;
                jacobian_stale = true;
                damping = Some((lambda / 3.0).max(f64::MIN_POSITIVE));
                nu = 2.0;
                debug!("LM iteration {}: cost {:.6e}, lambda {:.3e}", iteration, cost, lambda);

                if small_change || small_step || cost == 0.0 {
                    problem.jacobian(&params, &mut jacobian);
                    return Ok(Solution {
                        params,
                        cost,
                        iterations: iteration,
                        jacobian,
                    });
                }
            } else {
                if small_step || cost == 0.0 {
                    if jacobian_stale {
                        problem.jacobian(&params, &mut jacobian);
                    }
                    return Ok(Solution {
                        params,
                        cost,
                        iterations: iteration,
                        jacobian,
                    });
                }
                damping = Some(lambda * nu);
                nu *= 2.0;
            }
        }

        Err(Divergence {
            iterations: self.max_iterations,
            reason: DivergenceReason::IterationLimit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fit y = a * exp(b * x)
    struct Exponential {
        x: Vec<f64>,
        y: Vec<f64>,
        bounds: Vec<(f64, f64)>,
    }

    impl LeastSquaresProblem for Exponential {
        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x.len()
        }

        fn residuals(&self, p: &[f64], out: &mut DVector<f64>) {
            for (i, (x, y)) in self.x.iter().zip(&self.y).enumerate() {
                out[i] = p[0] * (p[1] * x).exp() - y;
            }
        }

        fn jacobian(&self, p: &[f64], out: &mut DMatrix<f64>) {
            for (i, x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                out[(i, 0)] = e;
                out[(i, 1)] = p[0] * x * e;
            }
        }

        fn bounds(&self) -> &[(f64, f64)] {
            &self.bounds
        }
    }

    fn exponential(bounds: Vec<(f64, f64)>) -> Exponential {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let y = x.iter().map(|x| 2.0 * (-1.5 * x).exp()).collect();
        Exponential { x, y, bounds }
    }

    #[test]
    fn test_recovers_exponential() {
        let problem = exponential(vec![(f64::NEG_INFINITY, f64::INFINITY); 2]);
        let solution = LevenbergMarquardt::new(200, 1e-12)
            .minimize(&problem, &[1.0, -0.5])
            .unwrap();
        assert!((solution.params[0] - 2.0).abs() < 1e-6);
        assert!((solution.params[1] + 1.5).abs() < 1e-6);
        assert!(solution.cost < 1e-12);
    }

    #[test]
    fn test_respects_bounds() {
        let problem = exponential(vec![(0.0, 1.5), (f64::NEG_INFINITY, f64::INFINITY)]);
        let solution = LevenbergMarquardt::new(500, 1e-12)
            .minimize(&problem, &[1.0, -0.5])
            .unwrap();
        assert_eq!(solution.params[0], 1.5);
        assert!(solution.iterations < 100, "{} iterations", solution.iterations);
    }

    #[test]
    fn test_held_parameter_released_when_gradient_turns() {
        // Starts on the upper bound, but the optimum lies inside the box
        let problem = exponential(vec![(0.0, 3.0), (f64::NEG_INFINITY, f64::INFINITY)]);
        let solution = LevenbergMarquardt::new(500, 1e-12)
            .minimize(&problem, &[3.0, -0.5])
            .unwrap();
        assert!((solution.params[0] - 2.0).abs() < 1e-6);
        assert!((solution.params[1] + 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_every_parameter_held_converges_immediately() {
        // y = 2 exp(-1.5 x) pulls a above 1 and b above -2
        let problem = exponential(vec![(0.0, 1.0), (-3.0, -2.0)]);
        let solution = LevenbergMarquardt::new(500, 1e-12)
            .minimize(&problem, &[1.0, -2.0])
            .unwrap();
        assert_eq!(solution.params, vec![1.0, -2.0]);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let problem = exponential(vec![(f64::NEG_INFINITY, f64::INFINITY); 2]);
        let token = CancellationToken::new();
        token.cancel();
        let mut solver = LevenbergMarquardt::new(200, 1e-12);
        solver.cancel = Some(token);
        let err = solver.minimize(&problem, &[1.0, -0.5]).unwrap_err();
        assert_eq!(err.reason, DivergenceReason::Cancelled);
        assert_eq!(err.iterations, 0);
    }

    #[test]
    fn test_iteration_limit() {
        let problem = exponential(vec![(f64::NEG_INFINITY, f64::INFINITY); 2]);
        let err = LevenbergMarquardt::new(1, 1e-15)
            .minimize(&problem, &[0.1, 2.0])
            .unwrap_err();
        assert_eq!(err.reason, DivergenceReason::IterationLimit);
    }
}
