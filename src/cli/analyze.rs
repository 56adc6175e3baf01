use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::Config;
use super::loader;
use super::profile::FitProfile;
use irpeak::analysis::{AnalysisConfig, AnalysisPipeline};
use irpeak::correction::BaselineMethod;
use irpeak::experiment::{Detection, Experiment, Measurement, SamplePreparation};
use irpeak::fitting::LineshapeModel;
use irpeak::units::Unit;
use irpeak::value::Value;

/// Resolved arguments of `irpeak analyze`
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub samples: Vec<PathBuf>,
    pub backgrounds: Vec<PathBuf>,
    pub experiment: Option<PathBuf>,
    pub name: String,
    pub output: PathBuf,
    pub profile: FitProfile,
    pub config: Option<PathBuf>,
    pub model: Option<LineshapeModel>,
    pub baseline: Option<BaselineMethod>,
    pub fit_range: Option<(f64, f64)>,
    pub detection: Detection,
    pub mass: Option<f64>,
    pub area: Option<f64>,
    pub x_unit: Unit,
    pub y_unit: Unit,
}

/// Analyze every sample measurement and write the experiment with its
/// analyses attached
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    let config = resolve_config(&file_config, &args);
    config.fitting.validate().context("Invalid fitting settings")?;

    let experiment = match &args.experiment {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read experiment: {}", path.display()))?;
            Experiment::from_json(&json).with_context(|| format!("Invalid experiment file: {}", path.display()))?
        }
        None => experiment_from_csv(&args)?,
    };
    let preparation = resolve_preparation(
        experiment.sample_preparation(),
        file_config.preparation.as_ref(),
        args.mass,
        args.area,
    )?;
    let mut experiment = match preparation {
        Some(preparation) => experiment.with_sample_preparation(preparation),
        None => experiment,
    };

    let sample_count = experiment.samples().count();
    if sample_count == 0 {
        bail!("Experiment '{}' has no sample measurements", experiment.name());
    }
    info!(
        "Analyzing {} samples against {} backgrounds ({} profile)",
        sample_count,
        experiment.backgrounds().count(),
        args.profile
    );

    let outcome = AnalysisPipeline::new(config).analyze_all(&experiment);
    let report = outcome.report(&experiment);

    for analysis in outcome.analyses {
        let stale: Vec<_> = experiment
            .analyses()
            .iter()
            .filter(|a| a.sample_reference() == analysis.sample_reference())
            .map(|a| a.id())
            .collect();
        for id in stale {
            experiment.remove_analysis(id);
        }
        for result in analysis.measurement_results() {
            info!("  {}: {}", result.name, result.value);
        }
        experiment.add_analysis(analysis)?;
    }

    fs::write(&args.output, experiment.to_json()?)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {}", args.output.display());

    println!("{}", report.format_colored());

    if report.has_failures() {
        bail!("{} of {} samples failed", report.failure_count(), sample_count);
    }
    Ok(())
}

/// Config file settings (or the profile), overridden by command-line flags
fn resolve_config(file_config: &Config, args: &AnalyzeArgs) -> AnalysisConfig {
    let mut config = file_config.analysis_config(args.profile);
    if let Some(model) = args.model {
        config.fitting.model = model;
    }
    if let Some(baseline) = &args.baseline {
        config.correction.baseline_method = baseline.clone();
    }
    if let Some((min, max)) = args.fit_range {
        config.fitting = config.fitting.with_fit_range(min, max);
    }
    config
}

/// Wafer parameters from the experiment, then the config file, then the
/// `--mass` / `--area` flags, later sources winning per field
fn resolve_preparation(
    existing: Option<&SamplePreparation>,
    from_config: Option<&SamplePreparation>,
    mass_mg: Option<f64>,
    area_cm2: Option<f64>,
) -> Result<Option<SamplePreparation>> {
    if existing.is_none() && from_config.is_none() && mass_mg.is_none() && area_cm2.is_none() {
        return Ok(None);
    }
    let mut preparation = existing.cloned().unwrap_or_default();
    if let Some(config) = from_config {
        if config.mass.is_some() {
            preparation.mass = config.mass;
        }
        if config.sample_area.is_some() {
            preparation.sample_area = config.sample_area;
        }
        if config.probe_molecule.is_some() {
            preparation.probe_molecule = config.probe_molecule.clone();
        }
    }
    if let Some(mass) = mass_mg {
        if !(mass > 0.0 && mass.is_finite()) {
            bail!("Wafer mass must be positive, got {} mg", mass);
        }
        preparation.mass = Some(Value::new(mass, Unit::Milligram));
    }
    if let Some(area) = area_cm2 {
        if !(area > 0.0 && area.is_finite()) {
            bail!("Wafer area must be positive, got {} cm^2", area);
        }
        preparation.sample_area = Some(Value::new(area, Unit::SquareCentimeter));
    }
    Ok(Some(preparation))
}

fn experiment_from_csv(args: &AnalyzeArgs) -> Result<Experiment> {
    let mut experiment = Experiment::new(&args.name);
    for path in &args.backgrounds {
        let measurement = load_measurement(path, args, true)?;
        experiment.add_measurement(measurement)?;
    }
    for path in &args.samples {
        let measurement = load_measurement(path, args, false)?;
        experiment.add_measurement(measurement)?;
    }
    if args.backgrounds.is_empty() {
        warn!("No background spectra given; samples are only baseline corrected");
    }
    Ok(experiment)
}

fn load_measurement(path: &Path, args: &AnalyzeArgs, background: bool) -> Result<Measurement> {
    let data = loader::load_spectrum(path, args.x_unit, args.y_unit)?;
    let name = loader::measurement_name(path);
    info!("Loaded {} ({} points) from {}", name, data.len(), path.display());
    let measurement = if background {
        Measurement::background(&name, data)
    } else {
        Measurement::sample(&name, data)
    };
    Ok(measurement.with_detection(args.detection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use irpeak::fitting::FitConfig;

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            samples: Vec::new(),
            backgrounds: Vec::new(),
            experiment: None,
            name: "test".to_string(),
            output: PathBuf::from("analysis.json"),
            profile: FitProfile::Balanced,
            config: None,
            model: None,
            baseline: None,
            fit_range: None,
            detection: Detection::Absorbance,
            mass: None,
            area: None,
            x_unit: Unit::ReciprocalCentimeter,
            y_unit: Unit::Arbitrary,
        }
    }

    fn write_spectrum(dir: &Path, name: &str, f: impl Fn(f64) -> f64) -> PathBuf {
        let path = dir.join(name);
        let rows: String = (0..=300)
            .map(|i| {
                let x = 1400.0 + i as f64;
                format!("{},{}\n", x, f(x))
            })
            .collect();
        fs::write(&path, format!("wavenumber,absorbance\n{}", rows)).unwrap();
        path
    }

    fn band(x: f64, amplitude: f64, center: f64) -> f64 {
        amplitude * (-(x - center).powi(2) / 32.0).exp()
    }

    #[test]
    fn test_flags_override_config() {
        let file_config = Config::from_str("[fitting]\nmodel = \"lorentzian\"\nmax_iterations = 42").unwrap();
        let mut args = args();
        args.model = Some(LineshapeModel::GaussLorentz);
        args.fit_range = Some((1400.0, 1600.0));
        args.baseline = Some(BaselineMethod::None);

        let config = resolve_config(&file_config, &args);
        assert_eq!(config.fitting.model, LineshapeModel::GaussLorentz);
        assert_eq!(config.fitting.max_iterations, 42);
        assert_eq!(config.fitting.fit_range, Some((1400.0, 1600.0)));
        assert_eq!(config.correction.baseline_method, BaselineMethod::None);

        let config = resolve_config(&Config::default(), &self::args());
        assert_eq!(config.fitting, FitConfig::balanced());
    }

    #[test]
    fn test_preparation_precedence() {
        assert!(resolve_preparation(None, None, None, None).unwrap().is_none());

        let existing = SamplePreparation::new()
            .with_mass(Value::new(10.0, Unit::Milligram))
            .with_sample_area(Value::new(1.5, Unit::SquareCentimeter));
        let from_config = SamplePreparation::new().with_mass(Value::new(12.0, Unit::Milligram));

        let resolved = resolve_preparation(Some(&existing), Some(&from_config), None, None)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.mass.unwrap().value(), 12.0);
        assert_eq!(resolved.sample_area.unwrap().value(), 1.5);

        let resolved = resolve_preparation(Some(&existing), Some(&from_config), Some(20.0), Some(2.0))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.mass.unwrap().value(), 20.0);
        assert_eq!(resolved.sample_area.unwrap().unit(), Unit::SquareCentimeter);

        assert!(resolve_preparation(None, None, Some(-1.0), None).is_err());
    }

    #[test]
    fn test_analyze_csv_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let background = write_spectrum(dir.path(), "wafer.csv", |x| 0.2 + 1e-4 * (x - 1400.0));
        let sample = write_spectrum(dir.path(), "pyridine_150.csv", |x| {
            0.25 + 1e-4 * (x - 1400.0) + band(x, 0.5, 1450.0) + band(x, 0.3, 1545.0)
        });
        let output = dir.path().join("out.json");

        let mut args = args();
        args.samples = vec![sample];
        args.backgrounds = vec![background];
        args.output = output.clone();
        args.mass = Some(20.0);
        args.area = Some(2.0);
        run(args).unwrap();

        let experiment = Experiment::from_json(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(experiment.measurements().len(), 2);
        assert_eq!(experiment.analyses().len(), 1);
        let analysis = &experiment.analyses()[0];
        assert_eq!(analysis.background_references().len(), 1);
        assert!(analysis.result("Lewis site density").is_some());
        assert!(analysis.result("Bronsted site density").is_some());
    }

    #[test]
    fn test_mass_without_area_keeps_bands() {
        let dir = tempfile::tempdir().unwrap();
        let sample = write_spectrum(dir.path(), "sample.csv", |x| band(x, 0.5, 1450.0));
        let output = dir.path().join("out.json");

        let mut args = args();
        args.samples = vec![sample];
        args.output = output.clone();
        args.mass = Some(20.0);
        run(args).unwrap();

        let experiment = Experiment::from_json(&fs::read_to_string(&output).unwrap()).unwrap();
        let analysis = &experiment.analyses()[0];
        assert_eq!(analysis.bands().len(), 1);
        assert_eq!(analysis.bands()[0].assignment(), "Lewis");
        assert!(analysis.measurement_results().is_empty());
    }

    #[test]
    fn test_reanalysis_replaces_previous_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let sample = write_spectrum(dir.path(), "sample.csv", |x| band(x, 0.4, 1450.0));
        let first = dir.path().join("first.json");

        let mut csv_args = args();
        csv_args.samples = vec![sample];
        csv_args.output = first.clone();
        run(csv_args).unwrap();
        let previous = Experiment::from_json(&fs::read_to_string(&first).unwrap()).unwrap().analyses()[0].id();

        let second = dir.path().join("second.json");
        let mut json_args = args();
        json_args.experiment = Some(first);
        json_args.output = second.clone();
        json_args.profile = FitProfile::Thorough;
        run(json_args).unwrap();

        let experiment = Experiment::from_json(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(experiment.analyses().len(), 1);
        assert_ne!(experiment.analyses()[0].id(), previous);
        assert_eq!(experiment.analyses()[0].bands().len(), 1);
    }

    #[test]
    fn test_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sample = write_spectrum(dir.path(), "sample.csv", |x| band(x, 0.4, 1450.0));
        let mut args = args();
        args.samples = vec![sample];
        args.output = dir.path().join("out.json");
        args.fit_range = Some((1000.0, 1001.0));

        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("1 of 1 samples failed"));
    }
}
