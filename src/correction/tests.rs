use super::*;
use crate::dataset::DatasetError;
use crate::units::Unit;

fn grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step).round() as usize + 1;
    (0..n).map(|i| start + i as f64 * step).collect()
}

fn gaussian(x: f64, amplitude: f64, center: f64, sigma: f64) -> f64 {
    amplitude * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
}

fn spectrum(x: &[f64], f: impl Fn(f64) -> f64) -> Dataset {
    Dataset::from_arrays(
        x.to_vec(),
        Unit::ReciprocalCentimeter,
        x.iter().map(|&v| f(v)).collect(),
        Unit::Arbitrary,
    )
    .unwrap()
}

// ==================== Background Subtraction Tests ====================

#[test]
fn test_empty_background_list_is_identity() {
    let x = grid(1400.0, 1600.0, 1.0);
    let sample = spectrum(&x, |v| gaussian(v, 1.0, 1500.0, 5.0));
    let corrected = subtract_background(&sample, &[]).unwrap();
    assert_eq!(corrected, sample);
}

#[test]
fn test_subtraction_is_linear_in_weights() {
    let x = grid(1400.0, 1600.0, 1.0);
    let sample = spectrum(&x, |v| 2.0 + gaussian(v, 1.0, 1500.0, 5.0));
    // Background on a coarser, descending grid
    let mut bg_x = grid(1390.0, 1610.0, 2.5);
    bg_x.reverse();
    let bg1 = spectrum(&bg_x, |v| 0.5 + 0.001 * v);
    let bg2 = spectrum(&bg_x, |v| 0.2 - 0.0005 * v);

    let (w1, w2) = (0.7, 1.3);
    let combined = subtract_background(
        &sample,
        &[
            BackgroundSpectrum::new("bg1", &bg1).weighted(w1),
            BackgroundSpectrum::new("bg2", &bg2).weighted(w2),
        ],
    )
    .unwrap();
    let only1 = subtract_background(&sample, &[BackgroundSpectrum::new("bg1", &bg1)]).unwrap();
    let only2 = subtract_background(&sample, &[BackgroundSpectrum::new("bg2", &bg2)]).unwrap();

    for i in 0..sample.len() {
        let y = sample.y()[i];
        let r1 = y - only1.y()[i];
        let r2 = y - only2.y()[i];
        let expected = y - w1 * r1 - w2 * r2;
        assert!((combined.y()[i] - expected).abs() < 1e-9);
    }
    assert_eq!(combined.timestamp(), sample.timestamp());
}

#[test]
fn test_background_x_unit_is_converted() {
    let x = grid(1400.0, 1600.0, 1.0);
    let sample = spectrum(&x, |_| 1.0);
    let bg_x: Vec<f64> = grid(1390.0, 1610.0, 1.0).iter().map(|v| v * 100.0).collect();
    let background = Dataset::from_arrays(
        bg_x.clone(),
        Unit::ReciprocalMeter,
        vec![0.25; bg_x.len()],
        Unit::Arbitrary,
    )
    .unwrap();
    let corrected =
        subtract_background(&sample, &[BackgroundSpectrum::new("m^-1", &background)]).unwrap();
    assert!(corrected.y().iter().all(|v| (v - 0.75).abs() < 1e-12));
}

#[test]
fn test_background_axis_unit_mismatch() {
    let x = grid(1400.0, 1600.0, 1.0);
    let sample = spectrum(&x, |_| 1.0);
    let background = Dataset::from_arrays(
        vec![6.0, 7.0, 8.0],
        Unit::Micrometer,
        vec![0.0; 3],
        Unit::Arbitrary,
    )
    .unwrap();
    let err = subtract_background(&sample, &[BackgroundSpectrum::new("um", &background)]).unwrap_err();
    assert!(matches!(err, CorrectionError::AxisUnitMismatch { .. }));
}

#[test]
fn test_background_must_cover_sample() {
    let x = grid(1400.0, 1600.0, 1.0);
    let sample = spectrum(&x, |_| 1.0);
    let background = spectrum(&grid(1450.0, 1700.0, 1.0), |_| 0.1);
    let err = subtract_background(&sample, &[BackgroundSpectrum::new("short", &background)]).unwrap_err();
    match err {
        CorrectionError::InsufficientRange { label, .. } => assert_eq!(label, "short"),
        other => panic!("unexpected error: {other}"),
    }
}

// ==================== Baseline Tests ====================

#[test]
fn test_baseline_none_is_zero() {
    let x = grid(1400.0, 1600.0, 1.0);
    let data = spectrum(&x, |v| 1.0 + gaussian(v, 1.0, 1500.0, 5.0));
    let baseline = estimate_baseline(&data, &BaselineMethod::None).unwrap();
    assert!(baseline.data_array().iter().all(|&b| b == 0.0));
    assert_eq!(baseline.unit(), Unit::Arbitrary);
}

#[test]
fn test_reference_point_offset() {
    let x = grid(1400.0, 1600.0, 1.0);
    let data = spectrum(&x, |v| 0.3 + gaussian(v, 1.0, 1500.0, 5.0));
    let baseline = estimate_baseline(&data, &BaselineMethod::ReferencePoint { x: 1410.0 }).unwrap();
    assert!(baseline.data_array().iter().all(|b| (b - 0.3).abs() < 1e-9));

    let err = estimate_baseline(&data, &BaselineMethod::ReferencePoint { x: 2000.0 }).unwrap_err();
    assert!(matches!(err, CorrectionError::ReferenceOutOfRange { .. }));
}

#[test]
fn test_fastchrom_recovers_sloped_baseline() {
    let x = grid(1400.0, 1700.0, 1.0);
    let floor = |v: f64| 0.2 + 0.001 * (v - 1400.0);
    let data = spectrum(&x, |v| {
        floor(v) + gaussian(v, 1.0, 1450.0, 4.0) + gaussian(v, 0.6, 1545.0, 5.0)
    });
    let baseline = estimate_baseline(&data, &BaselineMethod::default()).unwrap();
    for (xi, b) in x.iter().zip(baseline.data_array()) {
        assert!((b - floor(*xi)).abs() < 0.02, "baseline off at {}: {}", xi, b);
    }
}

#[test]
fn test_fastchrom_is_idempotent() {
    let x = grid(1400.0, 1700.0, 1.0);
    let data = spectrum(&x, |v| {
        0.1 + 0.0005 * (v - 1400.0) + gaussian(v, 1.0, 1450.0, 4.0) + gaussian(v, 0.5, 1545.0, 6.0)
    });
    let corrector = Corrector::new(CorrectionConfig::default());
    let first = corrector.correct(&data, &[]).unwrap();
    let second = corrector.correct(&first.baseline_corrected, &[]).unwrap();
    let scale = first.baseline_corrected.y_axis().max_abs();
    for b in second.baseline.data_array() {
        assert!(b.abs() <= 1e-9 * scale, "second baseline not zero: {}", b);
    }
}

#[test]
fn test_fastchrom_flat_signal() {
    let x = grid(0.0, 10.0, 1.0);
    let baseline = fastchrom(&x, &[0.5; 11], &FastChromParams::default()).unwrap();
    assert!(baseline.iter().all(|b| (b - 0.5).abs() < 1e-12));
}

#[test]
fn test_fastchrom_rejects_zero_half_window() {
    let x = grid(0.0, 10.0, 1.0);
    let params = FastChromParams {
        half_window: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        fastchrom(&x, &[0.5; 11], &params),
        Err(CorrectionError::InvalidParameter(_))
    ));
}

// ==================== Corrector Tests ====================

#[test]
fn test_region_of_interest_truncates() {
    let x = grid(1400.0, 1700.0, 1.0);
    let data = spectrum(&x, |v| gaussian(v, 1.0, 1545.0, 5.0));
    let config = CorrectionConfig {
        baseline_method: BaselineMethod::None,
        region_of_interest: Some((1500.0, 1600.0)),
    };
    let corrected = Corrector::new(config).correct(&data, &[]).unwrap();
    assert_eq!(corrected.background_subtracted.len(), 99);
    assert_eq!(corrected.baseline.len(), 99);

    let config = CorrectionConfig {
        baseline_method: BaselineMethod::None,
        region_of_interest: Some((1800.0, 1900.0)),
    };
    let err = Corrector::new(config).correct(&data, &[]).unwrap_err();
    assert!(matches!(
        err,
        CorrectionError::DatasetError(DatasetError::EmptyWindow { .. })
    ));
}

#[test]
fn test_config_from_toml() {
    let config: CorrectionConfig = toml::from_str(
        r#"
        region_of_interest = [1400.0, 1700.0]

        [baseline_method]
        method = "fast_chrom"
        half_window = 4
        "#,
    )
    .unwrap();
    match config.baseline_method {
        BaselineMethod::FastChrom(params) => {
            assert_eq!(params.half_window, Some(4));
            assert_eq!(params.min_length, 2);
        }
        other => panic!("unexpected method {other}"),
    }
    assert_eq!(config.region_of_interest, Some((1400.0, 1700.0)));

    let parsed: BaselineMethod = "reference_point:1800".parse().unwrap();
    assert_eq!(parsed, BaselineMethod::ReferencePoint { x: 1800.0 });
}
