//! # Experiment Module
//!
//! The resolved input of the analysis pipeline. An [`Experiment`] owns its
//! [`Measurement`]s (backgrounds and samples), the [`SamplePreparation`]
//! needed for quantification, and the [`Analysis`](crate::analysis::Analysis)
//! records computed from them.
//!
//! Analyses refer to measurements by [`MeasurementId`] only. The experiment
//! keeps an id index that is rebuilt whenever an experiment is deserialized,
//! so references can be checked without walking the measurement list.

mod error;
mod ids;
mod measurement;
mod preparation;
mod record;


pub use error::ExperimentError;
pub use ids::{AnalysisId, ExperimentId, MeasurementId};
pub use measurement::{Detection, Measurement, MeasurementType};
pub use preparation::SamplePreparation;
pub use record::Experiment;
