use log::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::assembler::AnalysisBuilder;
use super::config::AnalysisConfig;
use super::error::AnalysisError;
use super::record::Analysis;
use super::report::{BatchEntry, BatchReport};
use crate::correction::{BackgroundSpectrum, Corrector};
use crate::experiment::{Experiment, Measurement, MeasurementId, MeasurementType};
use crate::fitting::{noise_level, CancellationToken, FitSession};
use crate::quantity::quantify_bands;

/// A sample measurement whose analysis failed
#[derive(Debug)]
pub struct BatchFailure {
    pub measurement: MeasurementId,
    pub name: String,
    pub error: AnalysisError,
}

/// Analyses and failures of one batch run, side by side
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub analyses: Vec<Analysis>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Summary of every sample in the batch
    pub fn report(&self, experiment: &Experiment) -> BatchReport {
        let mut report = BatchReport::new(experiment.name());
        for analysis in &self.analyses {
            let name = experiment
                .measurement(analysis.sample_reference())
                .map(Measurement::name)
                .unwrap_or("unknown");
            report.add_entry(BatchEntry::from_analysis(name, analysis));
        }
        for failure in &self.failures {
            report.add_entry(BatchEntry::failed(&failure.name, failure.error.to_string()));
        }
        report
    }
}

/// Runs correction, fitting, assignment and quantification for sample
/// measurements of an experiment
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one sample against the given backgrounds
    pub fn analyze(
        &self,
        experiment: &Experiment,
        sample: MeasurementId,
        backgrounds: &[MeasurementId],
    ) -> Result<Analysis, AnalysisError> {
        self.run(experiment, sample, backgrounds, None)
    }

    /// Like [`analyze`](Self::analyze), stopping the fit once `token` is
    /// cancelled
    pub fn analyze_with_cancel(
        &self,
        experiment: &Experiment,
        sample: MeasurementId,
        backgrounds: &[MeasurementId],
        token: &CancellationToken,
    ) -> Result<Analysis, AnalysisError> {
        self.run(experiment, sample, backgrounds, Some(token))
    }

    /// Analyze every sample measurement against all background measurements
    /// of the experiment. Failures do not stop the batch.
    pub fn analyze_all(&self, experiment: &Experiment) -> BatchOutcome {
        self.run_batch(experiment, None)
    }

    /// Batch run that cancels every pending fit once `token` is cancelled
    pub fn analyze_all_with_cancel(&self, experiment: &Experiment, token: &CancellationToken) -> BatchOutcome {
        self.run_batch(experiment, Some(token))
    }

    fn run_batch(&self, experiment: &Experiment, cancel: Option<&CancellationToken>) -> BatchOutcome {
        let backgrounds: Vec<MeasurementId> = experiment.backgrounds().map(Measurement::id).collect();
        let samples: Vec<&Measurement> = experiment.samples().collect();
        info!(
            "Analyzing {} samples of '{}' against {} backgrounds",
            samples.len(),
            experiment.name(),
            backgrounds.len()
        );

        #[cfg(feature = "parallel")]
        let results: Vec<_> = samples
            .par_iter()
            .map(|&sample| (sample, self.run(experiment, sample.id(), &backgrounds, cancel)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = samples
            .iter()
            .map(|&sample| (sample, self.run(experiment, sample.id(), &backgrounds, cancel)))
            .collect();

        let mut outcome = BatchOutcome::default();
        for (sample, result) in results {
            match result {
                Ok(analysis) => outcome.analyses.push(analysis),
                Err(error) => {
                    warn!("Analysis of '{}' failed: {}", sample.name(), error);
                    outcome.failures.push(BatchFailure {
                        measurement: sample.id(),
                        name: sample.name().to_string(),
                        error,
                    });
                }
            }
        }
        info!(
            "Batch finished: {} analyses, {} failures",
            outcome.analyses.len(),
            outcome.failures.len()
        );
        outcome
    }

    fn run(
        &self,
        experiment: &Experiment,
        sample_id: MeasurementId,
        background_ids: &[MeasurementId],
        cancel: Option<&CancellationToken>,
    ) -> Result<Analysis, AnalysisError> {
        let sample = lookup(experiment, sample_id, MeasurementType::Sample)?;
        let backgrounds = background_ids
            .iter()
            .map(|&id| lookup(experiment, id, MeasurementType::Background))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Analyzing '{}' against {} backgrounds",
            sample.name(),
            backgrounds.len()
        );

        let spectra: Vec<BackgroundSpectrum<'_>> = backgrounds
            .iter()
            .map(|m| BackgroundSpectrum::new(m.name(), m.data()))
            .collect();
        let corrected = Corrector::new(self.config.correction.clone())
            .correct(sample.data(), &spectra)
            .map_err(|source| AnalysisError::CorrectionError {
                measurement: sample.name().to_string(),
                source,
            })?;

        // The measurement knows how its bands appear
        let mut fit_config = self.config.fitting.clone();
        fit_config.detection = sample.detection();
        let noise = noise_level(corrected.background_subtracted.y());
        let mut session = FitSession::new(&fit_config).with_noise_level(noise);
        if let Some(token) = cancel {
            session = session.with_cancellation(token.clone());
        }
        let fitted = session
            .run(&corrected.baseline_corrected)
            .map_err(|source| AnalysisError::FitError {
                measurement: sample.name().to_string(),
                source,
            })?;
        let bands: Vec<_> = fitted
            .bands
            .into_iter()
            .map(|band| self.config.assignments.assign(band))
            .collect();

        let quantifiable = bands.iter().any(|b| b.extinction_coefficient().is_some());
        let evaluations = match experiment.sample_preparation() {
            Some(preparation) if preparation.is_complete() => {
                quantify_bands(&bands, preparation).map_err(|source| AnalysisError::QuantityError {
                    measurement: sample.name().to_string(),
                    source,
                })?
            }
            Some(preparation) => {
                if quantifiable {
                    warn!(
                        "Sample preparation of '{}' lacks the wafer {}; skipping quantification of '{}'",
                        experiment.name(),
                        preparation.missing_wafer_inputs().join(" and "),
                        sample.name()
                    );
                }
                Vec::new()
            }
            None => {
                if quantifiable {
                    warn!(
                        "Experiment '{}' has no sample preparation; skipping quantification of '{}'",
                        experiment.name(),
                        sample.name()
                    );
                }
                Vec::new()
            }
        };

        let mut builder = AnalysisBuilder::new(sample_id)
            .backgrounds(background_ids.iter().copied())
            .corrected_data(corrected.background_subtracted)
            .baseline(corrected.baseline)
            .bands(bands);
        for evaluation in evaluations {
            builder = builder.evaluation(evaluation);
        }
        let analysis = builder.build(experiment)?;
        info!(
            "Analyzed '{}': {} bands, {} results",
            sample.name(),
            analysis.bands().len(),
            analysis.measurement_results().len()
        );
        Ok(analysis)
    }
}

fn lookup(experiment: &Experiment, id: MeasurementId, expected: MeasurementType) -> Result<&Measurement, AnalysisError> {
    let role = match expected {
        MeasurementType::Sample => "sample",
        MeasurementType::Background => "background",
    };
    let measurement = experiment
        .measurement(id)
        .ok_or(AnalysisError::DanglingReference { id, role })?;
    if measurement.measurement_type() != expected {
        return Err(AnalysisError::MeasurementTypeMismatch {
            name: measurement.name().to_string(),
            expected,
            found: measurement.measurement_type(),
        });
    }
    Ok(measurement)
}
