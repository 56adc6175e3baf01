use super::formula::Formula;
use crate::units::Unit;
use crate::value::ValueError;

/// Errors raised while evaluating formulas
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuantityError {
    /// Number of inputs disagrees with the formula's arity
    #[error("Formula {formula} takes {expected} parameters, got {found}")]
    FormulaParameterCountMismatch {
        formula: Formula,
        expected: usize,
        found: usize,
    },

    /// An input's dimension does not fit its slot
    #[error("Formula {formula}: parameter '{slot}' must be compatible with {expected}, got {found}")]
    UnitMismatch {
        formula: Formula,
        slot: &'static str,
        expected: Unit,
        found: Unit,
    },

    /// The formula produced an infinite or undefined result
    #[error("Formula {formula} produced a non-finite result ({value})")]
    NonFinite { formula: Formula, value: f64 },

    /// Sample preparation lacks a quantity the formula needs
    #[error("Cannot evaluate {formula}: sample preparation has no {input}")]
    MissingInput {
        formula: Formula,
        input: &'static str,
    },

    /// Flat result that cannot be read back as a single value
    #[error("Result '{name}' cannot be read as a value: {reason}")]
    InvalidFlatResult { name: String, reason: String },

    /// Error from the value primitive
    #[error("Value error: {0}")]
    ValueError(#[from] ValueError),
}
