use super::*;
use crate::experiment::SamplePreparation;
use crate::fitting::{Band, Fit, LineshapeModel};
use crate::units::Unit;
use crate::value::Value;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
}

fn band(assignment: &str, area: f64, coefficient: Option<f64>) -> Band {
    let x = Unit::ReciprocalCentimeter;
    let params = vec![
        Value::new(1.0, Unit::Arbitrary),
        Value::new(1545.0, x),
        Value::new(4.0, x),
    ];
    let fit = Fit::new(
        LineshapeModel::Gaussian,
        params,
        Value::with_error(area, x, 0.1 * area).unwrap(),
    )
    .unwrap();
    let band = Band::new(fit, Value::new(1545.0, x), Value::new(1533.0, x), Value::new(1557.0, x));
    let band = if assignment == Band::UNASSIGNED {
        band
    } else {
        band.with_assignment(assignment)
    };
    band.with_extinction_coefficient(coefficient.map(|c| Value::new(c, Unit::CentimeterPerMicromole)))
}

fn preparation() -> SamplePreparation {
    SamplePreparation::new()
        .with_mass(Value::new(20.0, Unit::Milligram))
        .with_sample_area(Value::new(2.0, Unit::SquareCentimeter))
}

// ==================== Formula Tests ====================

#[test]
fn test_formula_arity_and_units() {
    assert_eq!(Formula::ActiveSiteDensity.arity(), 4);
    assert_eq!(Formula::AdsorbedAmount.arity(), 3);
    assert_eq!(Formula::AreaRatio.arity(), 2);
    assert_eq!(Formula::ExtinctionCoefficient.output_unit(), Unit::CentimeterPerMicromole);
    assert_eq!(Formula::AreaRatio.slots()[1].name, "denominator_area");
}

#[test]
fn test_formula_parse() {
    assert_eq!("active-site-density".parse::<Formula>(), Ok(Formula::ActiveSiteDensity));
    assert_eq!("Area Ratio".parse::<Formula>(), Ok(Formula::AreaRatio));
    assert!("beer_lambert".parse::<Formula>().is_err());
}

#[test]
fn test_active_site_density_converts_inputs() {
    // SI inputs are converted into the slot units
    let inputs = [
        Value::new(1.5, Unit::ReciprocalCentimeter),
        Value::new(0.0002, Unit::SquareMeter),
        Value::new(0.02, Unit::Gram),
        Value::new(16_700.0, Unit::MeterPerMole),
    ];
    let value = Formula::ActiveSiteDensity.evaluate(&inputs).unwrap();
    // 16700 m/mol = 1.67 cm/umol
    assert!(close(value.value(), 1.5 * 2.0 / (0.02 * 1.67), 1e-9));
    assert_eq!(value.unit(), Unit::MicromolePerGram);
    assert!(!value.has_error());
}

#[test]
fn test_density_and_coefficient_are_inverse() {
    let area = Value::new(0.8, Unit::ReciprocalCentimeter);
    let sample_area = Value::new(2.0, Unit::SquareCentimeter);
    let mass = Value::new(15.0, Unit::Milligram);
    let eps = Value::new(2.22, Unit::CentimeterPerMicromole);

    let density = Formula::ActiveSiteDensity
        .evaluate(&[area, sample_area, mass, eps])
        .unwrap();
    let recovered = Formula::ExtinctionCoefficient
        .evaluate(&[area, sample_area, mass, density])
        .unwrap();
    assert!(close(recovered.value(), 2.22, 1e-12));
}

#[test]
fn test_error_propagates_relatively() {
    // For a pure product/quotient relative errors add in quadrature
    let inputs = [
        Value::with_error(1.0, Unit::ReciprocalCentimeter, 0.03).unwrap(),
        Value::new(2.0, Unit::SquareCentimeter),
        Value::new(0.02, Unit::Gram),
        Value::with_error(1.67, Unit::CentimeterPerMicromole, 0.0668).unwrap(),
    ];
    let value = Formula::ActiveSiteDensity.evaluate(&inputs).unwrap();
    let relative = value.error().unwrap() / value.value();
    assert!(close(relative, 0.05, 1e-6));
}

#[test]
fn test_area_ratio_is_dimensionless() {
    let lewis = Value::with_error(3.0, Unit::ReciprocalCentimeter, 0.3).unwrap();
    let bronsted = Value::with_error(1.5, Unit::ReciprocalCentimeter, 0.15).unwrap();
    let ratio = Formula::AreaRatio.evaluate(&[bronsted, lewis]).unwrap();
    assert!(close(ratio.value(), 0.5, 1e-12));
    assert_eq!(ratio.unit(), Unit::Dimensionless);
    assert!(close(ratio.error().unwrap(), 0.5 * 2f64.sqrt() * 0.1, 1e-6));
}

#[test]
fn test_parameter_count_mismatch() {
    let inputs = [Value::new(1.0, Unit::ReciprocalCentimeter)];
    let err = Formula::AreaRatio.evaluate(&inputs).unwrap_err();
    assert_eq!(
        err,
        QuantityError::FormulaParameterCountMismatch {
            formula: Formula::AreaRatio,
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn test_unit_mismatch_names_slot() {
    let inputs = [
        Value::new(1.0, Unit::ReciprocalCentimeter),
        Value::new(2.0, Unit::Centimeter),
        Value::new(0.02, Unit::Gram),
        Value::new(1.67, Unit::CentimeterPerMicromole),
    ];
    let err = Formula::ActiveSiteDensity.evaluate(&inputs).unwrap_err();
    assert_eq!(
        err,
        QuantityError::UnitMismatch {
            formula: Formula::ActiveSiteDensity,
            slot: "sample_area",
            expected: Unit::SquareCentimeter,
            found: Unit::Centimeter,
        }
    );
}

#[test]
fn test_zero_denominator_is_non_finite() {
    let inputs = [
        Value::new(1.0, Unit::ReciprocalCentimeter),
        Value::new(0.0, Unit::ReciprocalCentimeter),
    ];
    assert!(matches!(
        Formula::AreaRatio.evaluate(&inputs),
        Err(QuantityError::NonFinite { .. })
    ));
}

// ==================== Calculation Tests ====================

#[test]
fn test_evaluate_records_working_units() {
    let inputs = [
        Value::new(150.0, Unit::ReciprocalMeter),
        Value::new(2.0, Unit::SquareCentimeter),
        Value::new(1.5, Unit::CentimeterPerMicromole),
    ];
    let evaluation = evaluate("pyridine", Formula::AdsorbedAmount, &inputs).unwrap();
    let calc = &evaluation.calculation;
    assert_eq!(calc.formula(), Formula::AdsorbedAmount);
    assert_eq!(
        calc.units(),
        &[Unit::ReciprocalCentimeter, Unit::SquareCentimeter, Unit::CentimeterPerMicromole]
    );
    assert_eq!(evaluation.result.name, "pyridine");
    assert!(close(evaluation.result.value.value(), 2.0, 1e-12));

    let replayed = calc.evaluate("pyridine").unwrap();
    assert_eq!(replayed.value.value(), evaluation.result.value.value());
}

#[test]
fn test_calculation_rejects_misaligned_units() {
    let err = Calculation::new(Formula::AreaRatio, vec![1.0, 2.0], vec![Unit::ReciprocalCentimeter]).unwrap_err();
    assert!(matches!(err, QuantityError::FormulaParameterCountMismatch { found: 1, .. }));

    let json = r#"{"formula":"area_ratio","parameters":[1.0],"units":["cm^-1"]}"#;
    assert!(serde_json::from_str::<Calculation>(json).is_err());
}

#[test]
fn test_calculation_serialization() {
    let calc = Calculation::new(
        Formula::AreaRatio,
        vec![1.0, 2.0],
        vec![Unit::ReciprocalCentimeter, Unit::ReciprocalCentimeter],
    )
    .unwrap();
    let json = serde_json::to_string(&calc).unwrap();
    assert_eq!(
        json,
        r#"{"formula":"area_ratio","parameters":[1.0,2.0],"units":["cm^-1","cm^-1"]}"#
    );
    let back: Calculation = serde_json::from_str(&json).unwrap();
    assert_eq!(back, calc);
}

// ==================== Result Adapter Tests ====================

#[test]
fn test_flat_result_adapter() {
    let result = MeasurementResult::new(
        "Lewis site density",
        Value::with_asymmetric_error(120.0, Unit::MicromolePerGram, 6.0, 4.0).unwrap(),
    );
    let flat = FlatResult::from(&result);
    assert_eq!(flat.values, vec![120.0, 6.0, 4.0]);
    assert_eq!(flat.units, vec![Unit::MicromolePerGram; 3]);
    assert_eq!(MeasurementResult::try_from(flat).unwrap(), result);

    let exact = FlatResult::from(&MeasurementResult::new("ratio", Value::new(0.5, Unit::Dimensionless)));
    assert_eq!(exact.values, vec![0.5]);
}

#[test]
fn test_flat_result_rejects_mixed_units() {
    let flat = FlatResult {
        name: "bad".to_string(),
        values: vec![1.0, 0.1],
        units: vec![Unit::Gram, Unit::Milligram],
    };
    assert!(matches!(
        MeasurementResult::try_from(flat),
        Err(QuantityError::InvalidFlatResult { .. })
    ));

    let empty = FlatResult {
        name: "empty".to_string(),
        values: vec![],
        units: vec![],
    };
    assert!(MeasurementResult::try_from(empty).is_err());
}

// ==================== Band Quantification Tests ====================

#[test]
fn test_quantify_assigned_bands() {
    let bands = vec![
        band("Lewis", 2.0, Some(2.22)),
        band("Lewis + Bronsted", 0.5, None),
        band("Bronsted", 1.0, Some(1.67)),
        band(Band::UNASSIGNED, 0.3, None),
    ];
    let evaluations = quantify_bands(&bands, &preparation()).unwrap();
    assert_eq!(evaluations.len(), 2);
    assert_eq!(evaluations[0].result.name, "Lewis site density");
    assert!(close(evaluations[0].result.value.value(), 2.0 * 2.0 / (0.02 * 2.22), 1e-9));
    assert_eq!(evaluations[1].result.name, "Bronsted site density");
    // 10% area error carries straight through
    let v = evaluations[1].result.value;
    assert!(close(v.error().unwrap() / v.value(), 0.1, 1e-6));
}

#[test]
fn test_quantify_requires_preparation_inputs() {
    let bands = vec![band("Lewis", 2.0, Some(2.22))];
    let err = quantify_bands(&bands, &SamplePreparation::new().with_mass(Value::new(20.0, Unit::Milligram)))
        .unwrap_err();
    assert_eq!(
        err,
        QuantityError::MissingInput {
            formula: Formula::ActiveSiteDensity,
            input: "sample_area",
        }
    );

    // Nothing to quantify means nothing is required
    let unassigned = vec![band(Band::UNASSIGNED, 2.0, None)];
    assert!(quantify_bands(&unassigned, &SamplePreparation::new()).unwrap().is_empty());
}
