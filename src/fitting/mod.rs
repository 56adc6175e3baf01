//! # Band Fitting
//!
//! Deconvolutes overlapping absorption bands of a corrected spectrum into a
//! sum of lineshapes.
//!
//! A [`FitSession`] moves through [`FitStage`]s:
//!
//! 1. **CandidateDetection** - local maxima (minima for transmittance) at
//!    least `min_distance` samples apart with sufficient prominence inside
//!    the fit range
//! 2. **ModelConstruction** - one lineshape per candidate, seeded from the
//!    candidate's height, position and half-prominence width, with the
//!    center boxed into the band base
//! 3. **Optimization** - joint bounded Levenberg-Marquardt over all bands
//! 4. **Converged** or **Failed**
//!
//! Each fitted [`Band`] carries its parameters with standard errors from
//! `s^2 (J^T J)^-1`, its area over `center ± k * width`, and the window
//! limits.
//!
//! ## Example
//!
//! ```rust
//! use irpeak::dataset::Dataset;
//! use irpeak::fitting::{BandFitter, FitConfig};
//! use irpeak::units::Unit;
//!
//! let x: Vec<f64> = (0..120).map(|i| 1500.0 + i as f64 * 0.5).collect();
//! let y = x.iter().map(|v| 0.8 * (-(v - 1545.0f64).powi(2) / 18.0).exp()).collect();
//! let data = Dataset::from_arrays(x, Unit::ReciprocalCentimeter, y, Unit::Arbitrary)?;
//!
//! let outcome = BandFitter::new(FitConfig::default()).fit(&data)?;
//! assert_eq!(outcome.bands.len(), 1);
//! assert!((outcome.bands[0].location().value() - 1545.0).abs() < 1e-3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assignment;
mod band;
mod config;
mod error;
mod lineshape;
mod peaks;
mod session;
mod solver;


pub use assignment::{BandAssignments, ExpectedBand};
pub use band::{Band, Fit};
pub use config::FitConfig;
pub use error::{DivergenceReason, FitError};
pub use lineshape::LineshapeModel;
pub use peaks::{find_candidates, noise_level, Candidate};
pub use session::{BandFitter, FitOutcome, FitSession, FitStage};
pub use solver::{CancellationToken, LeastSquaresProblem, LevenbergMarquardt};
