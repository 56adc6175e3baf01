//! Candidate band detection.
//!
//! Local maxima are found with plateau handling, thinned to a minimum
//! separation (taller maxima win), ranked by topographic prominence, and
//! measured at half prominence (for the width seed) and at the band base
//! (for the center window).

/// A band candidate found in the signal
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Index of the maximum in the signal
    pub index: usize,
    /// x at the maximum
    pub position: f64,
    /// Signal at the maximum
    pub height: f64,
    pub prominence: f64,
    /// Full width at half prominence, in x units
    pub fwhm: f64,
    /// x interval the fitted center may move in, `(min, max)`
    pub window: (f64, f64),
}

/// Indices of local maxima. Flat tops report their middle sample.
pub fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    let last = n - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Keep maxima at least `distance` samples apart, visiting the tallest first
pub fn select_by_distance(signal: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 {
        return peaks.to_vec();
    }
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| signal[peaks[b]].total_cmp(&signal[peaks[a]]));

    let mut keep = vec![true; peaks.len()];
    for i in order {
        if !keep[i] {
            continue;
        }
        let mut j = i;
        while j > 0 && peaks[i] - peaks[j - 1] < distance {
            j -= 1;
            keep[j] = false;
        }
        let mut j = i + 1;
        while j < peaks.len() && peaks[j] - peaks[i] < distance {
            keep[j] = false;
            j += 1;
        }
    }
    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&peak, kept)| kept.then_some(peak))
        .collect()
}

/// Fewest points a noise estimate is made from
const MIN_NOISE_POINTS: usize = 20;

/// Robust noise standard deviation from neighbour differences: the MAD of
/// the first differences scaled to a Gaussian sigma and divided by `sqrt(2)`.
/// Smooth trends shift the differences but barely widen them. `None` for
/// short signals.
pub fn noise_level(signal: &[f64]) -> Option<f64> {
    if signal.len() < MIN_NOISE_POINTS {
        return None;
    }
    let mut diffs: Vec<f64> = signal.windows(2).map(|w| w[1] - w[0]).collect();
    let center = median(&mut diffs);
    let mut deviations: Vec<f64> = diffs.iter().map(|d| (d - center).abs()).collect();
    let mad = median(&mut deviations);
    Some(1.4826 * mad / std::f64::consts::SQRT_2)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// Prominence of `peak` and the indices of its left and right bases
pub fn prominence(signal: &[f64], peak: usize) -> (f64, usize, usize) {
    let height = signal[peak];

    let mut left_min = height;
    let mut left_base = peak;
    let mut i = peak;
    loop {
        if signal[i] > height {
            break;
        }
        if signal[i] < left_min {
            left_min = signal[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    let mut right_min = height;
    let mut right_base = peak;
    let mut i = peak;
    while i < signal.len() && signal[i] <= height {
        if signal[i] < right_min {
            right_min = signal[i];
            right_base = i;
        }
        i += 1;
    }

    (height - left_min.max(right_min), left_base, right_base)
}

/// Fractional indices where the signal crosses `height - rel_height * prominence`
/// on either side of `peak`, bounded by the bases
pub fn crossing_points(
    signal: &[f64],
    peak: usize,
    prominence: f64,
    bases: (usize, usize),
    rel_height: f64,
) -> (f64, f64) {
    let level = signal[peak] - prominence * rel_height;
    let (left_base, right_base) = bases;

    let mut i = peak;
    while left_base < i && level < signal[i] {
        i -= 1;
    }
    let mut left = i as f64;
    if signal[i] < level {
        left += (level - signal[i]) / (signal[i + 1] - signal[i]);
    }

    let mut i = peak;
    while i < right_base && level < signal[i] {
        i += 1;
    }
    let mut right = i as f64;
    if signal[i] < level {
        right -= (level - signal[i]) / (signal[i - 1] - signal[i]);
    }

    (left, right)
}

/// x at a fractional index
fn x_at(x: &[f64], index: f64) -> f64 {
    let i = (index.floor() as usize).min(x.len() - 1);
    if i + 1 >= x.len() {
        return x[i];
    }
    let frac = index - i as f64;
    x[i] + frac * (x[i + 1] - x[i])
}

/// Find band candidates in `signal` sampled at the monotonic `x`.
///
/// Maxima closer than `min_distance` samples to a taller one are dropped
/// before prominence is measured. Candidates come back in signal order.
/// With `max_bands` only the most prominent are kept. Center windows of
/// neighbouring candidates are split at the midpoint between them so fitted
/// centers cannot cross.
pub fn find_candidates(
    x: &[f64],
    signal: &[f64],
    min_prominence: f64,
    min_distance: usize,
    base_rel_height: f64,
    max_bands: Option<usize>,
) -> Vec<Candidate> {
    let maxima = select_by_distance(signal, &local_maxima(signal), min_distance);
    let mut candidates: Vec<Candidate> = maxima
        .into_iter()
        .filter_map(|peak| {
            let (prom, left_base, right_base) = prominence(signal, peak);
            if prom < min_prominence || prom <= 0.0 {
                return None;
            }
            let bases = (left_base, right_base);
            let (hl, hr) = crossing_points(signal, peak, prom, bases, 0.5);
            let (bl, br) = crossing_points(signal, peak, prom, bases, base_rel_height);
            let fwhm = (x_at(x, hr) - x_at(x, hl)).abs();
            let (w0, w1) = (x_at(x, bl), x_at(x, br));
            Some(Candidate {
                index: peak,
                position: x[peak],
                height: signal[peak],
                prominence: prom,
                fwhm,
                window: (w0.min(w1), w0.max(w1)),
            })
        })
        .collect();

    if let Some(limit) = max_bands {
        if candidates.len() > limit {
            candidates.sort_by(|a, b| b.prominence.total_cmp(&a.prominence));
            candidates.truncate(limit);
            candidates.sort_by_key(|c| c.index);
        }
    }

    // Neighbours in signal order are neighbours in x, the axis is monotonic
    for i in 1..candidates.len() {
        let (a, b) = (candidates[i - 1].position, candidates[i].position);
        let mid = 0.5 * (a + b);
        if a < b {
            candidates[i - 1].window.1 = candidates[i - 1].window.1.min(mid);
            candidates[i].window.0 = candidates[i].window.0.max(mid);
        } else {
            candidates[i - 1].window.0 = candidates[i - 1].window.0.max(mid);
            candidates[i].window.1 = candidates[i].window.1.min(mid);
        }
    }

    candidates
}
