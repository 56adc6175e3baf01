//! Baseline estimation.
//!
//! The FastChrom classifier marks points whose local standard deviation is
//! small as baseline, treats everything else as peak, and bridges each peak
//! region with a straight line between averaged anchors on either side.
//! Peak points that end up on or below that line are moved back to the
//! baseline class and the bridge is rebuilt until nothing changes.

use log::debug;

use super::config::{BaselineMethod, FastChromParams};
use super::error::CorrectionError;
use crate::dataset::{Dataset, Series};

/// Threshold margin relative to the signal magnitude, so deviations that
/// differ from the percentile only by rounding still count as baseline
const THRESHOLD_MARGIN: f64 = 1e-8;

/// Estimate the baseline of `data` with the chosen method. The returned
/// series has the length and y unit of `data`.
pub fn estimate_baseline(data: &Dataset, method: &BaselineMethod) -> Result<Series, CorrectionError> {
    let unit = data.y_axis().unit();
    let values = match method {
        BaselineMethod::None => vec![0.0; data.len()],
        BaselineMethod::FastChrom(params) => fastchrom(data.x(), data.y(), params)?,
        BaselineMethod::ReferencePoint { x } => {
            let (min, max) = data.x_range();
            let offset = data
                .interpolate(&[*x])
                .map_err(|_| CorrectionError::ReferenceOutOfRange { x: *x, min, max })?;
            vec![offset[0]; data.len()]
        }
    };
    Ok(Series::new(values, unit)?)
}

/// FastChrom baseline of `y` sampled at `x`
pub fn fastchrom(x: &[f64], y: &[f64], params: &FastChromParams) -> Result<Vec<f64>, CorrectionError> {
    if x.len() != y.len() {
        return Err(CorrectionError::InvalidParameter(format!(
            "x has {} points, y has {}",
            x.len(),
            y.len()
        )));
    }
    if !(0.0..=100.0).contains(&params.threshold_percentile) {
        return Err(CorrectionError::InvalidParameter(format!(
            "threshold_percentile must lie in [0, 100], got {}",
            params.threshold_percentile
        )));
    }
    if params.half_window == Some(0) {
        return Err(CorrectionError::InvalidParameter(
            "half_window must be at least 1".to_string(),
        ));
    }

    let n = y.len();
    let scale = y.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if n < 3 || scale == 0.0 {
        return Ok(vec![0.0; n]);
    }

    let half_window = params
        .half_window
        .unwrap_or_else(|| ((n as f64 * 0.02).round() as usize).max(1))
        .min((n - 1) / 2);

    let deviations = rolling_std(y, half_window);
    let threshold = percentile(&deviations, params.threshold_percentile) + scale * THRESHOLD_MARGIN;

    let mut mask: Vec<bool> = deviations.iter().map(|&d| d <= threshold).collect();
    drop_short_runs(&mut mask, params.min_length);
    if !mask.iter().any(|&m| m) {
        mask[0] = true;
        mask[n - 1] = true;
    }

    let mut baseline = bridge_peaks(x, y, &mask, params.interp_half_window);
    for pass in 0..params.max_iter {
        let mut changed = 0usize;
        for i in 0..n {
            if !mask[i] && y[i] <= baseline[i] {
                mask[i] = true;
                changed += 1;
            }
        }
        if changed == 0 {
            debug!("FastChrom converged after {} reclassification passes", pass);
            break;
        }
        baseline = bridge_peaks(x, y, &mask, params.interp_half_window);
    }

    Ok(baseline)
}

/// Standard deviation over `[i - hw, i + hw]`, truncated at the edges
fn rolling_std(y: &[f64], half_window: usize) -> Vec<f64> {
    let n = y.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half_window);
            let hi = (i + half_window + 1).min(n);
            let window = &y[lo..hi];
            let count = window.len() as f64;
            let mean = window.iter().sum::<f64>() / count;
            let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
            var.sqrt()
        })
        .collect()
}

/// Linear-interpolated percentile (`q` in [0, 100])
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Reclassify baseline runs shorter than `min_length` as peak
fn drop_short_runs(mask: &mut [bool], min_length: usize) {
    let mut i = 0;
    while i < mask.len() {
        if !mask[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < mask.len() && mask[i] {
            i += 1;
        }
        if i - start < min_length {
            mask[start..i].iter_mut().for_each(|m| *m = false);
        }
    }
}

/// Baseline equal to `y` on baseline points, straight lines across peak
/// regions between anchors averaged over up to `half_window + 1` baseline
/// points, and held constant where a peak region touches an edge
fn bridge_peaks(x: &[f64], y: &[f64], mask: &[bool], half_window: usize) -> Vec<f64> {
    let n = y.len();
    let mut baseline = y.to_vec();

    let mut i = 0;
    while i < n {
        if mask[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && !mask[i] {
            i += 1;
        }
        let end = i; // exclusive

        let left = (start > 0).then(|| {
            let from = start - 1;
            let anchor: Vec<f64> = (0..=half_window)
                .map_while(|k| from.checked_sub(k))
                .take_while(|&j| mask[j])
                .map(|j| y[j])
                .collect();
            (x[from], mean(&anchor))
        });
        let right = (end < n).then(|| {
            let anchor: Vec<f64> = (end..n.min(end + half_window + 1))
                .take_while(|&j| mask[j])
                .map(|j| y[j])
                .collect();
            (x[end], mean(&anchor))
        });

        for j in start..end {
            baseline[j] = match (left, right) {
                (Some((x0, y0)), Some((x1, y1))) => y0 + (y1 - y0) * (x[j] - x0) / (x1 - x0),
                (Some((_, y0)), None) => y0,
                (None, Some((_, y1))) => y1,
                (None, None) => 0.0,
            };
        }
    }

    baseline
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
