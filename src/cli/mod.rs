use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use irpeak::correction::BaselineMethod;
use irpeak::experiment::Detection;
use irpeak::fitting::LineshapeModel;
use irpeak::units::Unit;

mod analyze;
mod config;
mod demo;
mod info;
mod loader;
mod profile;

pub use analyze::AnalyzeArgs;
pub use profile::FitProfile;

/// irpeak - Quantitative FT-IR analysis of adsorbed pyridine
#[derive(Parser)]
#[command(name = "irpeak")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Fitting profile trading solver effort for speed.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ProfileArg {
    /// Small iteration budget, for previews
    Quick,
    /// Default solver settings
    #[default]
    Balanced,
    /// Large iteration budget and tight tolerance
    Thorough,
}

impl From<ProfileArg> for FitProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Quick => FitProfile::Quick,
            ProfileArg::Balanced => FitProfile::Balanced,
            ProfileArg::Thorough => FitProfile::Thorough,
        }
    }
}

/// Detection mode of CSV inputs.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum DetectionArg {
    /// Bands are maxima
    #[default]
    Absorbance,
    /// Bands are minima
    Transmittance,
    /// Single-beam intensity
    Intensity,
}

impl From<DetectionArg> for Detection {
    fn from(arg: DetectionArg) -> Self {
        match arg {
            DetectionArg::Absorbance => Detection::Absorbance,
            DetectionArg::Transmittance => Detection::Transmittance,
            DetectionArg::Intensity => Detection::Intensity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Correct, fit and quantify sample spectra
    Analyze {
        /// Sample spectrum CSV files (x, y columns)
        #[arg(short = 's', long = "sample", value_name = "CSV", required_unless_present = "experiment")]
        samples: Vec<PathBuf>,

        /// Background (activated wafer) spectrum CSV files
        #[arg(short = 'b', long = "background", value_name = "CSV")]
        backgrounds: Vec<PathBuf>,

        /// Analyze an existing experiment JSON instead of CSV files
        #[arg(short = 'e', long, value_name = "JSON", conflicts_with = "samples")]
        experiment: Option<PathBuf>,

        /// Experiment name for CSV inputs
        #[arg(short = 'n', long, default_value = "irpeak experiment")]
        name: String,

        /// Output experiment JSON path
        #[arg(short = 'o', long, value_name = "OUTPUT", default_value = "analysis.json")]
        output: PathBuf,

        /// Fitting profile (quick, balanced, thorough)
        #[arg(short = 'p', long, default_value = "balanced", value_enum)]
        profile: ProfileArg,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Lineshape model (gaussian, lorentzian, gauss_lorentz)
        #[arg(short = 'm', long)]
        model: Option<LineshapeModel>,

        /// Baseline method (none, fast_chrom, reference_point:<x>)
        #[arg(long)]
        baseline: Option<BaselineMethod>,

        /// Restrict fitting to MIN..=MAX on the x axis
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
        fit_range: Option<Vec<f64>>,

        /// Detection mode of CSV inputs
        #[arg(long, default_value = "absorbance", value_enum)]
        detection: DetectionArg,

        /// Wafer mass in mg
        #[arg(long, value_name = "MG")]
        mass: Option<f64>,

        /// Wafer area in cm^2
        #[arg(long, value_name = "CM2")]
        area: Option<f64>,

        /// Unit of the x column
        #[arg(long, default_value = "cm^-1")]
        x_unit: Unit,

        /// Unit of the y column
        #[arg(long, default_value = "a.u.")]
        y_unit: Unit,
    },

    /// Generate and analyze a synthetic temperature series
    Demo {
        /// Output experiment JSON path
        #[arg(value_name = "OUTPUT", default_value = "demo_experiment.json")]
        output: PathBuf,

        /// Also write every spectrum as CSV into this directory
        #[arg(long, value_name = "DIR")]
        csv_dir: Option<PathBuf>,
    },

    /// Display the contents of an experiment JSON file
    Info {
        /// Input experiment JSON path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            samples,
            backgrounds,
            experiment,
            name,
            output,
            profile,
            config,
            model,
            baseline,
            fit_range,
            detection,
            mass,
            area,
            x_unit,
            y_unit,
        } => analyze::run(AnalyzeArgs {
            samples,
            backgrounds,
            experiment,
            name,
            output,
            profile: profile.into(),
            config,
            model,
            baseline,
            fit_range: fit_range.and_then(|r| match r.as_slice() {
                [min, max] => Some((*min, *max)),
                _ => None,
            }),
            detection: detection.into(),
            mass,
            area,
            x_unit,
            y_unit,
        }),
        Commands::Demo { output, csv_dir } => demo::run(output, csv_dir),
        Commands::Info { file } => info::run(file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "irpeak",
            "-vv",
            "analyze",
            "-s",
            "a.csv",
            "-s",
            "b.csv",
            "-b",
            "wafer.csv",
            "--model",
            "lorentzian",
            "--baseline",
            "reference_point:1700",
            "--fit-range",
            "1400",
            "1700",
            "--mass",
            "20",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 2);
        match cli.command {
            Commands::Analyze {
                samples,
                backgrounds,
                model,
                baseline,
                fit_range,
                mass,
                x_unit,
                ..
            } => {
                assert_eq!(samples.len(), 2);
                assert_eq!(backgrounds.len(), 1);
                assert_eq!(model, Some(LineshapeModel::Lorentzian));
                assert_eq!(baseline, Some(BaselineMethod::ReferencePoint { x: 1700.0 }));
                assert_eq!(fit_range, Some(vec![1400.0, 1700.0]));
                assert_eq!(mass, Some(20.0));
                assert_eq!(x_unit, Unit::ReciprocalCentimeter);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["irpeak", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["irpeak", "analyze", "-e", "x.json", "-s", "a.csv"]).is_err());
        assert!(Cli::try_parse_from(["irpeak", "analyze", "-e", "x.json"]).is_ok());
    }

    #[test]
    fn test_profile_arg_mapping() {
        assert_eq!(FitProfile::from(ProfileArg::Quick), FitProfile::Quick);
        assert_eq!(FitProfile::from(ProfileArg::default()), FitProfile::Balanced);
        assert_eq!(Detection::from(DetectionArg::Transmittance), Detection::Transmittance);
    }
}
