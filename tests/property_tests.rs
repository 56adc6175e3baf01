//! Property-based tests for unit handling and background correction

use irpeak::correction::{subtract_background, BackgroundSpectrum};
use irpeak::dataset::Dataset;
use irpeak::units::Unit;
use irpeak::value::{Operation, Value};
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

/// Pairs of units that share a physical dimension
fn compatible_units() -> impl Strategy<Value = (Unit, Unit)> {
    let pairs: Vec<(Unit, Unit)> = Unit::ALL
        .iter()
        .flat_map(|a| Unit::ALL.iter().map(move |b| (*a, *b)))
        .filter(|(a, b)| a.is_compatible(*b))
        .collect();
    prop::sample::select(pairs)
}

fn spectrum(y: Vec<f64>) -> Dataset {
    let x = (0..y.len()).map(|i| 1400.0 + i as f64).collect();
    Dataset::from_arrays(x, Unit::ReciprocalCentimeter, y, Unit::Arbitrary).unwrap()
}

proptest! {
    /// Converting there and back restores value and error
    #[test]
    fn test_conversion_round_trip((from, to) in compatible_units(), v in -1e6f64..1e6, e in 0f64..1e3) {
        let original = Value::with_error(v, from, e).unwrap();
        let back = original.convert(to).unwrap().convert(from).unwrap();
        prop_assert_eq!(back.unit(), from);
        prop_assert!(close(back.value(), v), "{} -> {} -> {}: {} vs {}", from, to, from, back.value(), v);
        prop_assert!(close(back.error().unwrap(), e));
    }

    /// x - x is exactly zero with error sqrt(2) * e
    #[test]
    fn test_self_subtraction(unit in prop::sample::select(Unit::ALL.to_vec()), v in -1e4f64..1e4, e in 1e-6f64..1e2) {
        let x = Value::with_error(v, unit, e).unwrap();
        let difference = Value::combine(&x, &x, Operation::Subtract).unwrap();
        prop_assert_eq!(difference.value(), 0.0);
        prop_assert!(close(difference.error().unwrap(), e * 2f64.sqrt()));
    }

    /// No backgrounds leave the sample unchanged
    #[test]
    fn test_empty_background_identity(y in prop::collection::vec(-10f64..10.0, 2..200)) {
        let sample = spectrum(y.clone());
        let corrected = subtract_background(&sample, &[]).unwrap();
        prop_assert_eq!(corrected.y(), y.as_slice());
        prop_assert_eq!(corrected.x(), sample.x());
    }

    /// Subtracting w * B from S + w * B recovers S
    #[test]
    fn test_weighted_background_linearity(
        signal in prop::collection::vec(-1f64..1.0, 2..100),
        offset in -1f64..1.0,
        slope in -1e-3f64..1e-3,
        weight in 0.1f64..3.0,
    ) {
        let background_y: Vec<f64> = (0..signal.len()).map(|i| offset + slope * i as f64).collect();
        let mixed = signal.iter().zip(&background_y).map(|(s, b)| s + weight * b).collect();

        let background = spectrum(background_y);
        let corrected = subtract_background(
            &spectrum(mixed),
            &[BackgroundSpectrum::new("wafer", &background).weighted(weight)],
        ).unwrap();
        for (c, s) in corrected.y().iter().zip(&signal) {
            prop_assert!((c - s).abs() < 1e-9);
        }
    }
}
