use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use super::loader::write_spectrum;
use irpeak::analysis::{AnalysisConfig, AnalysisPipeline};
use irpeak::dataset::Dataset;
use irpeak::experiment::{Experiment, Measurement, SamplePreparation};
use irpeak::units::Unit;
use irpeak::value::Value;

/// Desorption temperatures of the demo series, in °C
const TEMPERATURES: [f64; 3] = [150.0, 250.0, 350.0];

/// Generate a synthetic pyridine desorption series, analyze it and write
/// the experiment as JSON
pub fn run(output: PathBuf, csv_dir: Option<PathBuf>) -> Result<()> {
    info!("irpeak demo - pyridine desorption series");

    let experiment = build_demo_experiment()?;
    info!(
        "Generated {} spectra ({} points each)",
        experiment.measurements().len(),
        experiment.measurements().first().map_or(0, |m| m.data().len())
    );

    if let Some(dir) = &csv_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        for measurement in experiment.measurements() {
            let path = dir.join(format!("{}.csv", measurement.name().replace(' ', "_")));
            write_spectrum(&path, measurement.data())?;
            info!("  Wrote {}", path.display());
        }
    }

    let outcome = AnalysisPipeline::new(AnalysisConfig::default()).analyze_all(&experiment);
    let report = outcome.report(&experiment);

    let mut experiment = experiment;
    for analysis in outcome.analyses {
        experiment.add_analysis(analysis)?;
    }
    fs::write(&output, experiment.to_json()?).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", report.format_colored());
    println!("Experiment written to {}", output.display());
    for analysis in experiment.analyses() {
        let name = experiment
            .measurement(analysis.sample_reference())
            .map(Measurement::name)
            .unwrap_or("unknown");
        for result in analysis.measurement_results() {
            println!("  {:<16} {}: {}", name, result.name, result.value);
        }
    }
    Ok(())
}

fn build_demo_experiment() -> Result<Experiment> {
    let preparation = SamplePreparation::new()
        .with_mass(Value::with_error(20.0, Unit::Milligram, 0.1)?)
        .with_sample_area(Value::with_error(2.01, Unit::SquareCentimeter, 0.02)?)
        .with_probe_molecule("pyridine");
    let mut experiment = Experiment::new("Demo H-ZSM-5 pyridine desorption")
        .with_varied_parameter("temperature")
        .with_sample_preparation(preparation);

    let x: Vec<f64> = (0..=800).map(|i| 1350.0 + i as f64 * 0.5).collect();
    let mut noise = Lcg(0x5eed);

    let wafer: Vec<f64> = x.iter().map(|v| wafer_absorbance(*v)).collect();
    let background = wafer.iter().map(|w| w + noise.sample() * 2e-4).collect();
    experiment.add_measurement(
        Measurement::background("activated wafer", dataset(&x, background)?)
            .with_temperature(Value::new(150.0, Unit::Celsius)),
    )?;

    for (step, temperature) in TEMPERATURES.iter().enumerate() {
        // Weakly bound pyridine leaves first
        let retained = 1.0 - 0.3 * step as f64;
        let y = x
            .iter()
            .zip(&wafer)
            .map(|(v, w)| {
                w + 0.02
                    + retained * (band(*v, 0.45, 1450.0, 3.5) + band(*v, 0.12, 1490.0, 3.5) + band(*v, 0.25, 1545.0, 4.5))
                    + noise.sample() * 2e-4
            })
            .collect();
        let temperature = Value::new(*temperature, Unit::Celsius);
        experiment.add_measurement(
            Measurement::sample(&format!("pyridine {}C", temperature.value()), dataset(&x, y)?)
                .with_temperature(temperature)
                .with_varied_parameter_value(temperature),
        )?;
    }
    Ok(experiment)
}

fn dataset(x: &[f64], y: Vec<f64>) -> Result<Dataset> {
    Ok(Dataset::from_arrays(x.to_vec(), Unit::ReciprocalCentimeter, y, Unit::Arbitrary)?)
}

/// Sloping framework absorbance of the bare wafer
fn wafer_absorbance(x: f64) -> f64 {
    0.3 + 2e-4 * (x - 1350.0) + band(x, 0.05, 1630.0, 20.0)
}

fn band(x: f64, height: f64, center: f64, sigma: f64) -> f64 {
    height * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// Deterministic noise in [-1, 1)
struct Lcg(u64);

impl Lcg {
    fn sample(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }
}
