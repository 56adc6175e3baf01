use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use irpeak::experiment::Experiment;

/// Display the measurements and analyses of an experiment file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        bail!("File does not exist: {}", file.display());
    }
    let json = fs::read_to_string(&file).context("Failed to read file")?;
    let experiment = Experiment::from_json(&json).context("Failed to parse experiment JSON")?;
    print!("{}", describe(&experiment));
    Ok(())
}

fn describe(experiment: &Experiment) -> String {
    let mut out = String::new();
    out.push_str("irpeak Experiment Information\n");
    out.push_str("=============================\n");
    out.push_str(&format!("Name: {}\n", experiment.name()));
    out.push_str(&format!("ID: {}\n", experiment.id()));
    if let Some(parameter) = experiment.varied_parameter() {
        out.push_str(&format!("Varied parameter: {}\n", parameter));
    }

    if let Some(preparation) = experiment.sample_preparation() {
        out.push_str("\nSample Preparation:\n");
        if let Some(mass) = &preparation.mass {
            out.push_str(&format!("  Mass: {}\n", mass));
        }
        if let Some(area) = &preparation.sample_area {
            out.push_str(&format!("  Area: {}\n", area));
        }
        if let Some(probe) = &preparation.probe_molecule {
            out.push_str(&format!("  Probe molecule: {}\n", probe));
        }
    }

    out.push_str(&format!("\nMeasurements ({}):\n", experiment.measurements().len()));
    for measurement in experiment.measurements() {
        let data = measurement.data();
        let (min, max) = data.x_range();
        out.push_str(&format!(
            "  [{}] {} - {} points, {:.1}..{:.1} {}",
            measurement.measurement_type(),
            measurement.name(),
            data.len(),
            min,
            max,
            data.x_axis().unit()
        ));
        if let Some(temperature) = measurement.temperature() {
            out.push_str(&format!(", {}", temperature));
        }
        out.push('\n');
    }

    out.push_str(&format!("\nAnalyses ({}):\n", experiment.analyses().len()));
    for analysis in experiment.analyses() {
        let sample = experiment
            .measurement(analysis.sample_reference())
            .map_or("unknown", |m| m.name());
        out.push_str(&format!(
            "  {} ({} backgrounds, {} bands)\n",
            sample,
            analysis.background_references().len(),
            analysis.bands().len()
        ));
        for band in analysis.bands() {
            let label = if band.is_assigned() { band.assignment() } else { "unassigned" };
            out.push_str(&format!(
                "    {:<12} at {}  area {}\n",
                label,
                band.location(),
                band.area()
            ));
        }
        for result in analysis.measurement_results() {
            out.push_str(&format!("    = {}: {}\n", result.name, result.value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use irpeak::dataset::Dataset;
    use irpeak::experiment::Measurement;
    use irpeak::units::Unit;

    #[test]
    fn test_describe_lists_measurements() {
        let mut experiment = Experiment::new("H-Y").with_varied_parameter("temperature");
        let data = Dataset::from_arrays(
            vec![1400.0, 1401.0, 1402.0],
            Unit::ReciprocalCentimeter,
            vec![0.1, 0.2, 0.1],
            Unit::Arbitrary,
        )
        .unwrap();
        experiment.add_measurement(Measurement::background("wafer", data)).unwrap();

        let text = describe(&experiment);
        assert!(text.contains("Name: H-Y"));
        assert!(text.contains("Varied parameter: temperature"));
        assert!(text.contains("[Background] wafer - 3 points, 1400.0..1402.0 cm^-1"));
        assert!(text.contains("Analyses (0):"));
    }

    #[test]
    fn test_missing_file() {
        assert!(run(PathBuf::from("/nonexistent/experiment.json")).is_err());
    }
}
