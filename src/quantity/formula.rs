use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::QuantityError;
use crate::units::Unit;
use crate::value::{propagate, Value, ValueError};

/// A formula input with the unit the formula is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub unit: Unit,
}

const fn slot(name: &'static str, unit: Unit) -> Slot {
    Slot { name, unit }
}

const ACTIVE_SITE_DENSITY: [Slot; 4] = [
    slot("band_area", Unit::ReciprocalCentimeter),
    slot("sample_area", Unit::SquareCentimeter),
    slot("sample_mass", Unit::Gram),
    slot("extinction_coefficient", Unit::CentimeterPerMicromole),
];

const EXTINCTION_COEFFICIENT: [Slot; 4] = [
    slot("band_area", Unit::ReciprocalCentimeter),
    slot("sample_area", Unit::SquareCentimeter),
    slot("sample_mass", Unit::Gram),
    slot("site_density", Unit::MicromolePerGram),
];

const ADSORBED_AMOUNT: [Slot; 3] = [
    slot("band_area", Unit::ReciprocalCentimeter),
    slot("sample_area", Unit::SquareCentimeter),
    slot("extinction_coefficient", Unit::CentimeterPerMicromole),
];

const AREA_RATIO: [Slot; 2] = [
    slot("numerator_area", Unit::ReciprocalCentimeter),
    slot("denominator_area", Unit::ReciprocalCentimeter),
];

/// Quantities derivable from integrated band areas.
///
/// All formulas follow the Beer-Lambert law for self-supporting wafers
/// (Emeis, J. Catal. 141, 1993).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `n = A * S / (m * eps)`, acid sites per gram of catalyst
    ActiveSiteDensity,
    /// `eps = A * S / (m * n)`, molar extinction coefficient from a known
    /// site density
    ExtinctionCoefficient,
    /// `N = A * S / eps`, adsorbed probe amount in the wafer
    AdsorbedAmount,
    /// `A1 / A2`
    AreaRatio,
}

impl Formula {
    pub const ALL: [Formula; 4] = [
        Formula::ActiveSiteDensity,
        Formula::ExtinctionCoefficient,
        Formula::AdsorbedAmount,
        Formula::AreaRatio,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Formula::ActiveSiteDensity => "active_site_density",
            Formula::ExtinctionCoefficient => "extinction_coefficient",
            Formula::AdsorbedAmount => "adsorbed_amount",
            Formula::AreaRatio => "area_ratio",
        }
    }

    pub fn expression(&self) -> &'static str {
        match self {
            Formula::ActiveSiteDensity => "n = A * S / (m * eps)",
            Formula::ExtinctionCoefficient => "eps = A * S / (m * n)",
            Formula::AdsorbedAmount => "N = A * S / eps",
            Formula::AreaRatio => "r = A1 / A2",
        }
    }

    /// Inputs in positional order
    pub fn slots(&self) -> &'static [Slot] {
        match self {
            Formula::ActiveSiteDensity => &ACTIVE_SITE_DENSITY,
            Formula::ExtinctionCoefficient => &EXTINCTION_COEFFICIENT,
            Formula::AdsorbedAmount => &ADSORBED_AMOUNT,
            Formula::AreaRatio => &AREA_RATIO,
        }
    }

    pub fn arity(&self) -> usize {
        self.slots().len()
    }

    pub fn output_unit(&self) -> Unit {
        match self {
            Formula::ActiveSiteDensity => Unit::MicromolePerGram,
            Formula::ExtinctionCoefficient => Unit::CentimeterPerMicromole,
            Formula::AdsorbedAmount => Unit::Micromole,
            Formula::AreaRatio => Unit::Dimensionless,
        }
    }

    /// Evaluate on magnitudes already expressed in the slot units
    pub fn apply(&self, x: &[f64]) -> f64 {
        match self {
            Formula::ActiveSiteDensity | Formula::ExtinctionCoefficient => x[0] * x[1] / (x[2] * x[3]),
            Formula::AdsorbedAmount => x[0] * x[1] / x[2],
            Formula::AreaRatio => x[0] / x[1],
        }
    }

    pub(crate) fn check_arity(&self, found: usize) -> Result<(), QuantityError> {
        if found != self.arity() {
            return Err(QuantityError::FormulaParameterCountMismatch {
                formula: *self,
                expected: self.arity(),
                found,
            });
        }
        Ok(())
    }

    /// Convert every input into its slot's unit
    pub fn working_inputs(&self, inputs: &[Value]) -> Result<Vec<Value>, QuantityError> {
        self.check_arity(inputs.len())?;
        inputs
            .iter()
            .zip(self.slots())
            .map(|(input, slot)| {
                input.convert(slot.unit).map_err(|e| match e {
                    ValueError::UnitMismatch { from, .. } => QuantityError::UnitMismatch {
                        formula: *self,
                        slot: slot.name,
                        expected: slot.unit,
                        found: from,
                    },
                    other => QuantityError::ValueError(other),
                })
            })
            .collect()
    }

    /// Evaluate with first-order error propagation
    pub fn evaluate(&self, inputs: &[Value]) -> Result<Value, QuantityError> {
        let working = self.working_inputs(inputs)?;
        let result = propagate(&working, self.output_unit(), |x| self.apply(x));
        let bounds = [Some(result.value()), result.error(), result.error2()];
        if let Some(bad) = bounds.into_iter().flatten().find(|v| !v.is_finite()) {
            return Err(QuantityError::NonFinite {
                formula: *self,
                value: bad,
            });
        }
        Ok(result)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Formula {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Formula::ALL
            .iter()
            .copied()
            .find(|f| f.name() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown formula: {}. Valid options: active_site_density, extinction_coefficient, adsorbed_amount, area_ratio",
                    s
                )
            })
    }
}
