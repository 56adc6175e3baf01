use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use crate::units::Unit;
use crate::value::Value;

/// A non-empty array of finite numbers sharing one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRepr")]
pub struct Series {
    data_array: Vec<f64>,
    unit: Unit,
}

#[derive(Deserialize)]
struct SeriesRepr {
    data_array: Vec<f64>,
    unit: Unit,
}

impl TryFrom<SeriesRepr> for Series {
    type Error = DatasetError;

    fn try_from(repr: SeriesRepr) -> Result<Self, Self::Error> {
        Series::new(repr.data_array, repr.unit)
    }
}

impl Series {
    /// Validate and wrap an array
    pub fn new(data_array: Vec<f64>, unit: Unit) -> Result<Self, DatasetError> {
        if data_array.is_empty() {
            return Err(DatasetError::EmptySeries);
        }
        if let Some((index, &value)) = data_array.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DatasetError::NonFinite { index, value });
        }
        Ok(Self { data_array, unit })
    }

    /// All-zero series of the given length
    pub fn zeros(len: usize, unit: Unit) -> Result<Self, DatasetError> {
        Series::new(vec![0.0; len], unit)
    }

    pub fn data_array(&self) -> &[f64] {
        &self.data_array
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.data_array.len()
    }

    /// Always false for a validated series
    pub fn is_empty(&self) -> bool {
        self.data_array.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.data_array[0]
    }

    pub fn last(&self) -> f64 {
        self.data_array[self.data_array.len() - 1]
    }

    pub fn min(&self) -> f64 {
        self.data_array.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data_array.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Largest absolute entry, used as the magnitude scale of the series
    pub fn max_abs(&self) -> f64 {
        self.data_array.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// Entry `i` as a [`Value`]
    pub fn value_at(&self, i: usize) -> Option<Value> {
        self.data_array.get(i).map(|&v| Value::new(v, self.unit))
    }

    /// Express the series in another unit of the same dimension
    pub fn convert(&self, target: Unit) -> Result<Series, DatasetError> {
        if target == self.unit {
            return Ok(self.clone());
        }
        // Validates dimensions once; magnitudes are then mapped directly
        Value::new(self.first(), self.unit).convert(target)?;
        let data = self
            .data_array
            .iter()
            .map(|&v| self.unit.convert_magnitude(v, target))
            .collect();
        Series::new(data, target)
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.data_array
    }
}
