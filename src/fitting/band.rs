use serde::{Deserialize, Serialize};

use super::error::FitError;
use super::lineshape::LineshapeModel;
use crate::value::Value;

/// Result of fitting one band's lineshape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FitRepr")]
pub struct Fit {
    model: LineshapeModel,
    formula: String,
    parameters: Vec<Value>,
    area: Value,
}

#[derive(Deserialize)]
struct FitRepr {
    model: LineshapeModel,
    #[serde(default)]
    formula: Option<String>,
    parameters: Vec<Value>,
    area: Value,
}

impl TryFrom<FitRepr> for Fit {
    type Error = FitError;

    fn try_from(repr: FitRepr) -> Result<Self, Self::Error> {
        let mut fit = Fit::new(repr.model, repr.parameters, repr.area)?;
        if let Some(formula) = repr.formula {
            fit.formula = formula;
        }
        Ok(fit)
    }
}

impl Fit {
    /// Parameters must match the model's parameter count, in formula order
    pub fn new(model: LineshapeModel, parameters: Vec<Value>, area: Value) -> Result<Self, FitError> {
        if parameters.len() != model.parameter_count() {
            return Err(FitError::InvalidConfig(format!(
                "{} takes {} parameters, got {}",
                model.name(),
                model.parameter_count(),
                parameters.len()
            )));
        }
        Ok(Self {
            model,
            formula: model.formula().to_string(),
            parameters,
            area,
        })
    }

    pub fn model(&self) -> LineshapeModel {
        self.model
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Parameter by name (`amplitude`, `center`, `width`, `lorentz_fraction`)
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.model
            .parameter_names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.parameters.get(i))
    }

    pub fn area(&self) -> &Value {
        &self.area
    }
}

/// A fitted vibrational band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    assignment: String,
    fit: Fit,
    location: Value,
    start: Value,
    end: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extinction_coefficient: Option<Value>,
}

impl Band {
    /// Assignment of bands no expected location matched
    pub const UNASSIGNED: &'static str = "unassigned";

    /// Band with `start <= location <= end` (values are reordered if needed)
    pub fn new(fit: Fit, location: Value, start: Value, end: Value) -> Self {
        let (start, end) = if start.value() <= end.value() {
            (start, end)
        } else {
            (end, start)
        };
        Self {
            assignment: Self::UNASSIGNED.to_string(),
            fit,
            location,
            start,
            end,
            extinction_coefficient: None,
        }
    }

    pub fn with_assignment(mut self, assignment: &str) -> Self {
        self.assignment = assignment.to_string();
        self
    }

    pub fn with_extinction_coefficient(mut self, coefficient: Option<Value>) -> Self {
        self.extinction_coefficient = coefficient;
        self
    }

    pub fn assignment(&self) -> &str {
        &self.assignment
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment != Self::UNASSIGNED
    }

    pub fn fit(&self) -> &Fit {
        &self.fit
    }

    pub fn location(&self) -> &Value {
        &self.location
    }

    pub fn start(&self) -> &Value {
        &self.start
    }

    pub fn end(&self) -> &Value {
        &self.end
    }

    pub fn extinction_coefficient(&self) -> Option<&Value> {
        self.extinction_coefficient.as_ref()
    }

    /// Integrated area of the band
    pub fn area(&self) -> &Value {
        self.fit.area()
    }
}
