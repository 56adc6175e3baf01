use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameters of the FastChrom baseline classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastChromParams {
    /// Half window of the rolling standard deviation. `None` picks 2% of
    /// the number of points (at least 1).
    pub half_window: Option<usize>,

    /// Percentile of the rolling deviations used as classification threshold
    pub threshold_percentile: f64,

    /// Baseline runs shorter than this are reclassified as peak
    pub min_length: usize,

    /// Points averaged on each side of a peak region to anchor the
    /// interpolation
    pub interp_half_window: usize,

    /// Maximum reclassification passes
    pub max_iter: usize,
}

impl Default for FastChromParams {
    fn default() -> Self {
        Self {
            half_window: None,
            threshold_percentile: 15.0,
            min_length: 2,
            interp_half_window: 5,
            max_iter: 100,
        }
    }
}

/// How the slowly varying floor under the bands is estimated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum BaselineMethod {
    /// Zero baseline
    None,
    /// Rolling-deviation classification with linear interpolation across peaks
    FastChrom(FastChromParams),
    /// Constant offset that makes the spectrum read zero at `x`
    ReferencePoint { x: f64 },
}

impl Default for BaselineMethod {
    fn default() -> Self {
        BaselineMethod::FastChrom(FastChromParams::default())
    }
}

impl BaselineMethod {
    pub fn name(&self) -> &'static str {
        match self {
            BaselineMethod::None => "none",
            BaselineMethod::FastChrom(_) => "fast_chrom",
            BaselineMethod::ReferencePoint { .. } => "reference_point",
        }
    }
}

impl fmt::Display for BaselineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineMethod::ReferencePoint { x } => write!(f, "reference_point({})", x),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl FromStr for BaselineMethod {
    type Err = String;

    /// Parses `none`, `fast_chrom` / `fastchrom`, or `reference_point:<x>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Some(x) = lower.strip_prefix("reference_point:") {
            let x = x
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("Invalid reference point '{}': {}", x, e))?;
            return Ok(BaselineMethod::ReferencePoint { x });
        }
        match lower.as_str() {
            "none" => Ok(BaselineMethod::None),
            "fast_chrom" | "fastchrom" => Ok(BaselineMethod::FastChrom(FastChromParams::default())),
            other => Err(format!(
                "Unknown baseline method: {}. Valid options: none, fast_chrom, reference_point:<x>",
                other
            )),
        }
    }
}

/// Settings of the correction stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub baseline_method: BaselineMethod,

    /// Keep only `min < x < max` after background subtraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_of_interest: Option<(f64, f64)>,
}
