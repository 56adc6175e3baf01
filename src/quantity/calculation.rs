use log::debug;
use serde::{Deserialize, Serialize};

use super::error::QuantityError;
use super::formula::Formula;
use crate::experiment::SamplePreparation;
use crate::fitting::Band;
use crate::units::Unit;
use crate::value::Value;

/// Record of a formula evaluation: the formula and its inputs in the slot
/// units, positionally aligned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalculationRepr")]
pub struct Calculation {
    formula: Formula,
    parameters: Vec<f64>,
    units: Vec<Unit>,
}

#[derive(Deserialize)]
struct CalculationRepr {
    formula: Formula,
    parameters: Vec<f64>,
    units: Vec<Unit>,
}

impl TryFrom<CalculationRepr> for Calculation {
    type Error = QuantityError;

    fn try_from(repr: CalculationRepr) -> Result<Self, Self::Error> {
        Calculation::new(repr.formula, repr.parameters, repr.units)
    }
}

impl Calculation {
    /// `parameters` and `units` must both match the formula's arity
    pub fn new(formula: Formula, parameters: Vec<f64>, units: Vec<Unit>) -> Result<Self, QuantityError> {
        formula.check_arity(parameters.len())?;
        formula.check_arity(units.len())?;
        Ok(Self {
            formula,
            parameters,
            units,
        })
    }

    pub fn formula(&self) -> Formula {
        self.formula
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Re-evaluate from the recorded magnitudes. Errors are not recorded, so
    /// the result is exact.
    pub fn evaluate(&self, name: &str) -> Result<MeasurementResult, QuantityError> {
        let inputs: Vec<Value> = self
            .parameters
            .iter()
            .zip(&self.units)
            .map(|(&v, &u)| Value::new(v, u))
            .collect();
        let value = self.formula.evaluate(&inputs)?;
        Ok(MeasurementResult::new(name, value))
    }
}

/// A named quantity produced by an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub name: String,
    pub value: Value,
}

impl MeasurementResult {
    pub fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// List-based result layout: `values` holds the magnitude followed by the
/// error and the lower error when present; every entry shares one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatResult {
    pub name: String,
    pub values: Vec<f64>,
    pub units: Vec<Unit>,
}

impl From<&MeasurementResult> for FlatResult {
    fn from(result: &MeasurementResult) -> Self {
        let v = &result.value;
        let values: Vec<f64> = std::iter::once(v.value())
            .chain(v.error())
            .chain(v.error2())
            .collect();
        Self {
            name: result.name.clone(),
            units: vec![v.unit(); values.len()],
            values,
        }
    }
}

impl TryFrom<FlatResult> for MeasurementResult {
    type Error = QuantityError;

    fn try_from(flat: FlatResult) -> Result<Self, Self::Error> {
        let invalid = |reason: String| QuantityError::InvalidFlatResult {
            name: flat.name.clone(),
            reason,
        };
        if flat.values.len() != flat.units.len() {
            return Err(invalid(format!(
                "{} values but {} units",
                flat.values.len(),
                flat.units.len()
            )));
        }
        let unit = *flat.units.first().ok_or_else(|| invalid("no values".to_string()))?;
        if flat.units.iter().any(|u| *u != unit) {
            return Err(invalid("units differ between entries".to_string()));
        }
        let value = match *flat.values.as_slice() {
            [v] => Value::new(v, unit),
            [v, e] => Value::with_error(v, unit, e)?,
            [v, upper, lower] => Value::with_asymmetric_error(v, unit, upper, lower)?,
            _ => return Err(invalid(format!("{} values, expected 1 to 3", flat.values.len()))),
        };
        Ok(MeasurementResult::new(&flat.name, value))
    }
}

/// A calculation together with the result it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub calculation: Calculation,
    pub result: MeasurementResult,
}

/// Evaluate `formula` on `inputs` and record both the calculation and the
/// named result
pub fn evaluate(name: &str, formula: Formula, inputs: &[Value]) -> Result<Evaluation, QuantityError> {
    let working = formula.working_inputs(inputs)?;
    let value = formula.evaluate(&working)?;
    let calculation = Calculation::new(
        formula,
        working.iter().map(Value::value).collect(),
        working.iter().map(Value::unit).collect(),
    )?;
    debug!("{} = {} via {}", name, value, formula.expression());
    Ok(Evaluation {
        calculation,
        result: MeasurementResult::new(name, value),
    })
}

/// Active-site density of every assigned band that carries an extinction
/// coefficient, named `"<assignment> site density"`.
///
/// Fails with [`QuantityError::MissingInput`] when such a band exists but
/// the preparation lacks the wafer mass or area.
pub fn quantify_bands(bands: &[Band], preparation: &SamplePreparation) -> Result<Vec<Evaluation>, QuantityError> {
    let formula = Formula::ActiveSiteDensity;
    let mut evaluations = Vec::new();
    for band in bands.iter().filter(|b| b.is_assigned()) {
        let Some(coefficient) = band.extinction_coefficient() else {
            continue;
        };
        let area = preparation.sample_area.ok_or(QuantityError::MissingInput {
            formula,
            input: "sample_area",
        })?;
        let mass = preparation.mass.ok_or(QuantityError::MissingInput {
            formula,
            input: "mass",
        })?;
        let name = format!("{} site density", band.assignment());
        evaluations.push(evaluate(&name, formula, &[*band.area(), area, mass, *coefficient])?);
    }
    Ok(evaluations)
}
