//! Fitting profiles for common use cases.
//!
//! Profiles trade solver effort for speed, hiding the iteration budget and
//! tolerances from end users.

use std::fmt;
use std::str::FromStr;

use irpeak::fitting::FitConfig;

/// Fitting profiles for common use cases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitProfile {
    /// Previews and interactive use.
    ///
    /// - Iterations: 100
    /// - Tolerance: 1e-6
    /// - Time limit: 1 s per fit
    Quick,

    /// Default settings.
    ///
    /// - Iterations: 500
    /// - Tolerance: 1e-10
    #[default]
    Balanced,

    /// Publication-quality fits.
    ///
    /// - Iterations: 5,000
    /// - Tolerance: 1e-13
    Thorough,
}

impl FitProfile {
    /// Fitter settings for this profile
    pub fn fit_config(&self) -> FitConfig {
        match self {
            FitProfile::Quick => FitConfig::quick(),
            FitProfile::Balanced => FitConfig::balanced(),
            FitProfile::Thorough => FitConfig::thorough(),
        }
    }

    /// Returns all available profile names.
    pub fn variants() -> &'static [&'static str] {
        &["quick", "balanced", "thorough"]
    }
}

impl fmt::Display for FitProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitProfile::Quick => write!(f, "quick"),
            FitProfile::Balanced => write!(f, "balanced"),
            FitProfile::Thorough => write!(f, "thorough"),
        }
    }
}

impl FromStr for FitProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" | "fast" => Ok(FitProfile::Quick),
            "balanced" | "default" => Ok(FitProfile::Balanced),
            "thorough" | "precise" => Ok(FitProfile::Thorough),
            _ => Err(format!(
                "Unknown profile '{}'. Valid options: {}",
                s,
                FitProfile::variants().join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let balanced = FitProfile::default();
        assert_eq!(balanced, FitProfile::Balanced);
        assert_eq!(balanced.fit_config(), FitConfig::default());
    }

    #[test]
    fn test_profile_budgets() {
        assert_eq!(FitProfile::Quick.fit_config().max_iterations, 100);
        assert_eq!(FitProfile::Quick.fit_config().time_limit_ms, Some(1_000));
        assert_eq!(FitProfile::Thorough.fit_config().max_iterations, 5_000);
        assert!(FitProfile::Thorough.fit_config().convergence_tolerance < FitConfig::default().convergence_tolerance);
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!(FitProfile::from_str("quick").unwrap(), FitProfile::Quick);
        assert_eq!(FitProfile::from_str("BALANCED").unwrap(), FitProfile::Balanced);
        assert_eq!(FitProfile::from_str("thorough").unwrap(), FitProfile::Thorough);
        assert!(FitProfile::from_str("invalid").is_err());
    }
}
