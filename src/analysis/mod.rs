//! # Analysis Records and Pipeline
//!
//! An [`Analysis`] is the immutable result of running the pipeline on one
//! sample measurement:
//!
//! ```text
//! Measurements ─► Corrector ─► corrected Dataset + baseline
//!                                   │
//!                                   ▼
//!                              Band fitter ─► assigned Bands ─► Quantities
//!                                                                   │
//!                                                                   ▼
//!                                                           AnalysisBuilder
//! ```
//!
//! [`AnalysisPipeline`] runs every stage with one [`AnalysisConfig`].
//! [`AnalysisPipeline::analyze_all`] processes all samples of an
//! experiment, in parallel with the `parallel` feature, and keeps failed
//! samples next to successful ones in a [`BatchOutcome`].
//!
//! ## Example
//!
//! ```rust
//! use irpeak::analysis::AnalysisPipeline;
//! use irpeak::dataset::Dataset;
//! use irpeak::experiment::{Experiment, Measurement};
//! use irpeak::units::Unit;
//!
//! let x: Vec<f64> = (0..300).map(|i| 1400.0 + i as f64).collect();
//! let background: Vec<f64> = x.iter().map(|v| 0.2 + 1e-4 * (v - 1400.0)).collect();
//! let sample: Vec<f64> = x
//!     .iter()
//!     .zip(&background)
//!     .map(|(v, b)| b + 0.5 * (-(v - 1450.0f64).powi(2) / 32.0).exp())
//!     .collect();
//!
//! let mut experiment = Experiment::new("H-ZSM-5");
//! let bg = experiment.add_measurement(Measurement::background(
//!     "activated wafer",
//!     Dataset::from_arrays(x.clone(), Unit::ReciprocalCentimeter, background, Unit::Arbitrary)?,
//! ))?;
//! let py = experiment.add_measurement(Measurement::sample(
//!     "pyridine 150C",
//!     Dataset::from_arrays(x, Unit::ReciprocalCentimeter, sample, Unit::Arbitrary)?,
//! ))?;
//!
//! let analysis = AnalysisPipeline::default().analyze(&experiment, py, &[bg])?;
//! assert_eq!(analysis.bands().len(), 1);
//! assert_eq!(analysis.bands()[0].assignment(), "Lewis");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assembler;
mod config;
mod error;
mod pipeline;
mod record;
mod report;


pub use assembler::AnalysisBuilder;
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::{AnalysisPipeline, BatchFailure, BatchOutcome};
pub use record::Analysis;
pub use report::{BatchEntry, BatchReport, EntryStatus};
