//! # Values with Units and Uncertainty
//!
//! A [`Value`] is a magnitude tagged with a [`Unit`] and optional error
//! bounds. `error` holds the symmetric error, or the upper bound when the
//! uncertainty is asymmetric; `error2` holds the lower bound and is only
//! present in the asymmetric case.
//!
//! Arithmetic goes through [`Value::combine`] and [`propagate`], both of
//! which apply first-order (linear) error propagation:
//!
//! ```text
//! σ_f = sqrt( Σ (∂f/∂x_i · σ_i)² )
//! ```
//!
//! Upper and lower bounds propagate independently. A negative partial
//! derivative swaps sides: the lower bound of that input feeds the upper
//! bound of the result.

use crate::units::{Dimension, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised by unit conversion and value arithmetic
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The units measure different physical quantities
    #[error("Unit mismatch: cannot convert {from} ({from_dimension}) into {to} ({to_dimension})")]
    UnitMismatch {
        from: Unit,
        from_dimension: Dimension,
        to: Unit,
        to_dimension: Dimension,
    },

    /// A product or quotient has no unit in the vocabulary
    #[error("No unit in the vocabulary has dimension {0}")]
    UnresolvedDimension(Dimension),

    /// An error bound is negative or not finite
    #[error("Invalid error bound {0}: must be finite and non-negative")]
    InvalidError(f64),

    /// The magnitude is not finite
    #[error("Value is not finite: {0}")]
    NonFinite(f64),

    /// Division by a zero-valued operand
    #[error("Division by zero")]
    DivisionByZero,
}

/// Alias kept for call sites that only care about unit problems
pub type UnitError = ValueError;

/// Binary operations supported by [`Value::combine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A measured or derived quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr")]
pub struct Value {
    value: f64,
    unit: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error2: Option<f64>,
}

#[derive(Deserialize)]
struct ValueRepr {
    value: f64,
    unit: Unit,
    #[serde(default)]
    error: Option<f64>,
    #[serde(default)]
    error2: Option<f64>,
}

impl TryFrom<ValueRepr> for Value {
    type Error = ValueError;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        match (repr.error, repr.error2) {
            (Some(upper), Some(lower)) => {
                Value::with_asymmetric_error(repr.value, repr.unit, upper, lower)
            }
            (Some(error), None) => Value::with_error(repr.value, repr.unit, error),
            // A lower bound alone is read as a symmetric error
            (None, Some(error)) => Value::with_error(repr.value, repr.unit, error),
            (None, None) => {
                check_finite(repr.value)?;
                Ok(Value::new(repr.value, repr.unit))
            }
        }
    }
}

fn check_finite(value: f64) -> Result<(), ValueError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValueError::NonFinite(value))
    }
}

fn check_bound(bound: f64) -> Result<(), ValueError> {
    if bound.is_finite() && bound >= 0.0 {
        Ok(())
    } else {
        Err(ValueError::InvalidError(bound))
    }
}

impl Value {
    /// Exact value without uncertainty
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value,
            unit,
            error: None,
            error2: None,
        }
    }

    /// Value with a symmetric error
    pub fn with_error(value: f64, unit: Unit, error: f64) -> Result<Self, ValueError> {
        check_finite(value)?;
        check_bound(error)?;
        Ok(Self {
            value,
            unit,
            error: Some(error),
            error2: None,
        })
    }

    /// Value with separate upper and lower error bounds
    pub fn with_asymmetric_error(
        value: f64,
        unit: Unit,
        upper: f64,
        lower: f64,
    ) -> Result<Self, ValueError> {
        check_finite(value)?;
        check_bound(upper)?;
        check_bound(lower)?;
        Ok(Self {
            value,
            unit,
            error: Some(upper),
            error2: Some(lower),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Symmetric error, or the upper bound when asymmetric
    pub fn error(&self) -> Option<f64> {
        self.error
    }

    /// Lower bound, present only for asymmetric errors
    pub fn error2(&self) -> Option<f64> {
        self.error2
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_asymmetric(&self) -> bool {
        self.error2.is_some()
    }

    /// Upper error bound (zero for exact values)
    pub fn upper_error(&self) -> f64 {
        self.error.unwrap_or(0.0)
    }

    /// Lower error bound (zero for exact values)
    pub fn lower_error(&self) -> f64 {
        self.error2.or(self.error).unwrap_or(0.0)
    }

    /// Express the value in another unit of the same dimension
    pub fn convert(&self, target: Unit) -> Result<Value, ValueError> {
        if self.unit == target {
            return Ok(*self);
        }
        if !self.unit.is_compatible(target) {
            return Err(ValueError::UnitMismatch {
                from: self.unit,
                from_dimension: self.unit.dimension(),
                to: target,
                to_dimension: target.dimension(),
            });
        }
        let factor = self.unit.scale() / target.scale();
        Ok(Value {
            value: self.unit.convert_magnitude(self.value, target),
            unit: target,
            error: self.error.map(|e| e * factor),
            error2: self.error2.map(|e| e * factor),
        })
    }

    /// Multiply by an exact scalar
    pub fn scale(&self, factor: f64) -> Value {
        linear_combination(self.value * factor, self.unit, &[(factor, self)])
    }

    /// Combine two values with first-order error propagation.
    ///
    /// Addition and subtraction convert `b` into the unit of `a`. Products and
    /// quotients resolve the combined dimension back to a vocabulary unit.
    pub fn combine(a: &Value, b: &Value, op: Operation) -> Result<Value, ValueError> {
        match op {
            Operation::Add | Operation::Subtract => {
                let b = b.convert(a.unit)?;
                let sign = if op == Operation::Add { 1.0 } else { -1.0 };
                Ok(linear_combination(
                    a.value + sign * b.value,
                    a.unit,
                    &[(1.0, a), (sign, &b)],
                ))
            }
            Operation::Multiply | Operation::Divide => {
                let a = a.without_offset()?;
                let b = b.without_offset()?;
                let (dimension, scale) = if op == Operation::Multiply {
                    (
                        a.unit.dimension() + b.unit.dimension(),
                        a.unit.scale() * b.unit.scale(),
                    )
                } else {
                    (
                        a.unit.dimension() - b.unit.dimension(),
                        a.unit.scale() / b.unit.scale(),
                    )
                };
                let (value, da, db) = if op == Operation::Multiply {
                    (a.value * b.value, b.value, a.value)
                } else {
                    if b.value == 0.0 {
                        return Err(ValueError::DivisionByZero);
                    }
                    (
                        a.value / b.value,
                        1.0 / b.value,
                        -a.value / (b.value * b.value),
                    )
                };
                let raw = linear_combination(value, Unit::Dimensionless, &[(da, &a), (db, &b)]);
                let (unit, factor) = match Unit::resolve(dimension, scale) {
                    Some(unit) => (unit, 1.0),
                    None => {
                        let canonical = Unit::canonical(dimension)
                            .ok_or(ValueError::UnresolvedDimension(dimension))?;
                        (canonical, scale)
                    }
                };
                Ok(Value {
                    value: raw.value * factor,
                    unit,
                    error: raw.error.map(|e| e * factor),
                    error2: raw.error2.map(|e| e * factor),
                })
            }
        }
    }

    /// Temperatures with an offset are moved to their canonical unit before
    /// they enter a product
    fn without_offset(&self) -> Result<Value, ValueError> {
        if self.unit.offset() == 0.0 {
            return Ok(*self);
        }
        let canonical = Unit::canonical(self.unit.dimension())
            .ok_or(ValueError::UnresolvedDimension(self.unit.dimension()))?;
        self.convert(canonical)
    }
}

/// Build a value from its partial derivatives with respect to `inputs`.
///
/// Each term is `(∂f/∂x_i, x_i)`. The result carries an error only when at
/// least one input does, and an asymmetric error only when at least one
/// input is asymmetric.
pub(crate) fn linear_combination(value: f64, unit: Unit, terms: &[(f64, &Value)]) -> Value {
    if !terms.iter().any(|(_, v)| v.has_error()) {
        return Value::new(value, unit);
    }
    let asymmetric = terms.iter().any(|(_, v)| v.is_asymmetric());
    let mut upper = 0.0;
    let mut lower = 0.0;
    for (partial, input) in terms {
        let (up, low) = if *partial >= 0.0 {
            (input.upper_error(), input.lower_error())
        } else {
            (input.lower_error(), input.upper_error())
        };
        upper += (partial * up).powi(2);
        lower += (partial * low).powi(2);
    }
    Value {
        value,
        unit,
        error: Some(upper.sqrt()),
        error2: asymmetric.then(|| lower.sqrt()),
    }
}

/// Relative step for central differences, cube root of machine epsilon
const DIFF_STEP: f64 = 6.055454452393343e-6;

/// Evaluate `f` at the input magnitudes and propagate their errors using
/// numerically estimated partial derivatives.
///
/// Inputs are used as given, so callers convert them to the units `f`
/// expects beforehand.
pub fn propagate<F>(inputs: &[Value], unit: Unit, f: F) -> Value
where
    F: Fn(&[f64]) -> f64,
{
    let mut x: Vec<f64> = inputs.iter().map(Value::value).collect();
    let value = f(&x);
    if !inputs.iter().any(Value::has_error) {
        return Value::new(value, unit);
    }

    let mut partials = Vec::with_capacity(inputs.len());
    for i in 0..x.len() {
        let xi = x[i];
        let h = DIFF_STEP * if xi != 0.0 { xi.abs() } else { 1.0 };
        x[i] = xi + h;
        let forward = f(&x);
        x[i] = xi - h;
        let backward = f(&x);
        x[i] = xi;
        partials.push((forward - backward) / (2.0 * h));
    }

    let terms: Vec<(f64, &Value)> = partials.into_iter().zip(inputs.iter()).collect();
    linear_combination(value, unit, &terms)
}

/// Number of decimals that keeps the first significant digit of `error`
fn display_decimals(error: f64) -> usize {
    if error <= 0.0 || !error.is_finite() {
        return 3;
    }
    let decimals = (-error.log10()).ceil();
    if decimals < 0.0 {
        0
    } else {
        decimals as usize
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            Unit::Dimensionless => String::new(),
            other => format!(" {}", other),
        };
        match (self.error, self.error2) {
            (Some(upper), Some(lower)) => {
                let smallest = [upper, lower]
                    .into_iter()
                    .filter(|e| *e > 0.0)
                    .fold(f64::INFINITY, f64::min);
                let decimals = display_decimals(smallest);
                write!(
                    f,
                    "{:.*} +{:.*}/-{:.*}{}",
                    decimals, self.value, decimals, upper, decimals, lower, unit
                )
            }
            (Some(error), None) => {
                let decimals = display_decimals(error);
                write!(
                    f,
                    "{:.*} ± {:.*}{}",
                    decimals, self.value, decimals, error, unit
                )
            }
            _ => write!(f, "{:.3}{}", self.value, unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_convert_wavenumber_units() {
        let v = Value::with_error(1500.0, Unit::ReciprocalCentimeter, 2.0).unwrap();
        let m = v.convert(Unit::ReciprocalMeter).unwrap();
        assert!(close(m.value(), 150_000.0, 1e-12));
        assert!(close(m.error().unwrap(), 200.0, 1e-12));
    }

    #[test]
    fn test_convert_across_dimensions_fails() {
        let v = Value::new(1500.0, Unit::ReciprocalCentimeter);
        let err = v.convert(Unit::Centimeter).unwrap_err();
        assert!(matches!(err, ValueError::UnitMismatch { .. }));
    }

    #[test]
    fn test_self_subtraction_error() {
        let x = Value::with_error(3.0, Unit::Gram, 0.2).unwrap();
        let d = Value::combine(&x, &x, Operation::Subtract).unwrap();
        assert_eq!(d.value(), 0.0);
        assert!(close(d.error().unwrap(), 0.2 * 2f64.sqrt(), 1e-12));
    }

    #[test]
    fn test_add_converts_second_operand() {
        let a = Value::with_error(1.0, Unit::Gram, 0.1).unwrap();
        let b = Value::with_error(500.0, Unit::Milligram, 100.0).unwrap();
        let sum = Value::combine(&a, &b, Operation::Add).unwrap();
        assert_eq!(sum.unit(), Unit::Gram);
        assert!(close(sum.value(), 1.5, 1e-12));
        assert!(close(sum.error().unwrap(), (0.01f64 + 0.01).sqrt(), 1e-12));
    }

    #[test]
    fn test_multiply_resolves_unit() {
        let area = Value::new(2.0, Unit::SquareCentimeter);
        let band = Value::new(3.0, Unit::ReciprocalCentimeter);
        let product = Value::combine(&area, &band, Operation::Multiply).unwrap();
        assert_eq!(product.unit(), Unit::Centimeter);
        assert!(close(product.value(), 6.0, 1e-12));
    }

    #[test]
    fn test_divide_falls_back_to_canonical_unit() {
        let amount = Value::new(5.0, Unit::Millimole);
        let mass = Value::new(2.0, Unit::Milligram);
        let q = Value::combine(&amount, &mass, Operation::Divide).unwrap();
        // mmol/mg = mol/g = 1000 mol/kg
        assert_eq!(q.unit(), Unit::MolePerKilogram);
        assert!(close(q.value(), 2500.0, 1e-12));
    }

    #[test]
    fn test_divide_by_zero() {
        let a = Value::new(1.0, Unit::Gram);
        let b = Value::new(0.0, Unit::Gram);
        assert_eq!(
            Value::combine(&a, &b, Operation::Divide),
            Err(ValueError::DivisionByZero)
        );
    }

    #[test]
    fn test_unresolvable_product() {
        let t = Value::new(2.0, Unit::Second);
        let m = Value::new(2.0, Unit::Gram);
        let err = Value::combine(&t, &m, Operation::Multiply).unwrap_err();
        assert!(matches!(err, ValueError::UnresolvedDimension(_)));
    }

    #[test]
    fn test_negative_partial_swaps_asymmetric_sides() {
        let a = Value::new(10.0, Unit::Gram);
        let b = Value::with_asymmetric_error(4.0, Unit::Gram, 0.3, 0.1).unwrap();
        let d = Value::combine(&a, &b, Operation::Subtract).unwrap();
        assert!(close(d.error().unwrap(), 0.1, 1e-12));
        assert!(close(d.error2().unwrap(), 0.3, 1e-12));
    }

    #[test]
    fn test_propagate_matches_analytic_quotient() {
        let a = Value::with_error(6.0, Unit::Dimensionless, 0.3).unwrap();
        let b = Value::with_error(2.0, Unit::Dimensionless, 0.1).unwrap();
        let q = propagate(&[a, b], Unit::Dimensionless, |x| x[0] / x[1]);
        let expected = ((0.3f64 / 2.0).powi(2) + (6.0f64 * 0.1 / 4.0).powi(2)).sqrt();
        assert!(close(q.value(), 3.0, 1e-12));
        assert!(close(q.error().unwrap(), expected, 1e-6));
    }

    #[test]
    fn test_exact_inputs_stay_exact() {
        let a = Value::new(6.0, Unit::Gram);
        let q = propagate(&[a], Unit::Gram, |x| x[0] * 2.0);
        assert_eq!(q.error(), None);
        assert_eq!(q.value(), 12.0);
    }

    #[test]
    fn test_rejects_negative_error() {
        assert!(Value::with_error(1.0, Unit::Gram, -0.1).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"value":1.0,"unit":"g","error":-1.0}"#).is_err());
    }

    #[test]
    fn test_serde_skips_missing_errors() {
        let json = serde_json::to_string(&Value::new(1.5, Unit::Gram)).unwrap();
        assert_eq!(json, r#"{"value":1.5,"unit":"g"}"#);
    }

    #[test]
    fn test_display_rounds_to_error() {
        let v = Value::with_error(1545.2371, Unit::ReciprocalCentimeter, 0.034).unwrap();
        assert_eq!(v.to_string(), "1545.24 ± 0.03 cm^-1");
        let v = Value::with_error(123.4, Unit::Gram, 12.0).unwrap();
        assert_eq!(v.to_string(), "123 ± 12 g");
        assert_eq!(Value::new(0.5, Unit::Dimensionless).to_string(), "0.500");
    }

    fn length_unit() -> impl Strategy<Value = Unit> {
        prop_oneof![
            Just(Unit::Nanometer),
            Just(Unit::Micrometer),
            Just(Unit::Millimeter),
            Just(Unit::Centimeter),
            Just(Unit::Meter),
        ]
    }

    proptest! {
        #[test]
        fn prop_conversion_round_trip(v in -1e6f64..1e6, e in 0f64..1e3, from in length_unit(), to in length_unit()) {
            let original = Value::with_error(v, from, e).unwrap();
            let back = original.convert(to).unwrap().convert(from).unwrap();
            prop_assert!(close(back.value(), v, 1e-9));
            prop_assert!(close(back.error().unwrap(), e, 1e-9));
        }

        #[test]
        fn prop_temperature_round_trip(t in -200f64..1500.0) {
            let c = Value::new(t, Unit::Celsius);
            let back = c.convert(Unit::Kelvin).unwrap().convert(Unit::Celsius).unwrap();
            prop_assert!((back.value() - t).abs() < 1e-9);
        }

        #[test]
        fn prop_self_subtraction(v in -1e4f64..1e4, e in 1e-6f64..1e2) {
            let x = Value::with_error(v, Unit::Micromole, e).unwrap();
            let d = Value::combine(&x, &x, Operation::Subtract).unwrap();
            prop_assert_eq!(d.value(), 0.0);
            prop_assert!(close(d.error().unwrap(), e * 2f64.sqrt(), 1e-12));
        }
    }
}
