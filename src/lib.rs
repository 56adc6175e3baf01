//! # irpeak - Quantitative FT-IR of Adsorbed Pyridine
//!
//! `irpeak` turns raw pyridine-adsorption FT-IR spectra into quantitative
//! results: corrected spectra, deconvoluted vibrational bands, and derived
//! quantities such as Lewis and Brønsted site densities, each carrying a
//! unit and a propagated uncertainty.
//!
//! ## Key Features
//!
//! - **Unit-aware values**: every number is a [`value::Value`] with a unit
//!   from a closed vocabulary and optional (asymmetric) error bounds.
//!
//! - **Background and baseline correction**: weighted background
//!   subtraction on the sample grid, followed by a FastChrom baseline.
//!
//! - **Band deconvolution**: Gaussian, Lorentzian or Gauss-Lorentz bands
//!   fitted jointly by bounded Levenberg-Marquardt, with standard errors
//!   from the covariance matrix.
//!
//! - **Quantification**: Beer-Lambert formulas turn band areas into site
//!   densities using the wafer mass and area.
//!
//! - **Immutable records**: one [`analysis::Analysis`] per sample, serde
//!   serializable, referring to its measurements by id.
//!
//! ## Quick Start
//!
//! ```rust
//! use irpeak::prelude::*;
//!
//! let x: Vec<f64> = (0..300).map(|i| 1400.0 + i as f64).collect();
//! let y = x.iter().map(|v| 0.4 * (-(v - 1545.0f64).powi(2) / 50.0).exp()).collect();
//!
//! let mut experiment = Experiment::new("H-Y zeolite").with_sample_preparation(
//!     SamplePreparation::new()
//!         .with_mass(Value::new(18.0, Unit::Milligram))
//!         .with_sample_area(Value::new(2.0, Unit::SquareCentimeter)),
//! );
//! let sample = experiment.add_measurement(Measurement::sample(
//!     "pyridine 150C",
//!     Dataset::from_arrays(x, Unit::ReciprocalCentimeter, y, Unit::Arbitrary)?,
//! ))?;
//!
//! let analysis = AnalysisPipeline::new(AnalysisConfig::default()).analyze(&experiment, sample, &[])?;
//! let density = analysis.result("Bronsted site density").ok_or("no result")?;
//! assert_eq!(density.value.unit(), Unit::MicromolePerGram);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`units`] and [`value`]: unit vocabulary, conversion, error propagation
//! - [`dataset`]: validated x/y series with units and a timestamp
//! - [`experiment`]: measurements, sample preparation and the id index
//! - [`correction`]: background subtraction and baseline estimation
//! - [`fitting`]: candidate detection, lineshapes, solver, band assignment
//! - [`quantity`]: formulas from band areas to chemical quantities
//! - [`analysis`]: the analysis record, its builder, and the pipeline

#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod analysis;
pub mod correction;
pub mod dataset;
pub mod experiment;
pub mod fitting;
pub mod quantity;
pub mod units;
pub mod value;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::analysis::{
        Analysis, AnalysisBuilder, AnalysisConfig, AnalysisError, AnalysisPipeline, BatchOutcome, BatchReport,
    };
    pub use crate::correction::{BackgroundSpectrum, BaselineMethod, CorrectionConfig, Corrector};
    pub use crate::dataset::{Dataset, DatasetError, Series};
    pub use crate::experiment::{
        AnalysisId, Detection, Experiment, Measurement, MeasurementId, MeasurementType, SamplePreparation,
    };
    pub use crate::fitting::{Band, BandAssignments, BandFitter, CancellationToken, FitConfig, LineshapeModel};
    pub use crate::quantity::{Formula, MeasurementResult};
    pub use crate::units::Unit;
    pub use crate::value::{Value, ValueError};
}
