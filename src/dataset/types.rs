use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use super::series::Series;
use crate::units::Unit;

/// Tolerance (relative to the axis span) for points that sit on a range edge
pub(crate) const RANGE_TOLERANCE: f64 = 1e-9;

/// Ordering of the x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisDirection {
    Ascending,
    Descending,
}

/// Paired x/y series recorded at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetRepr")]
pub struct Dataset {
    timestamp: DateTime<Utc>,
    x_axis: Series,
    y_axis: Series,
}

#[derive(Deserialize)]
struct DatasetRepr {
    timestamp: DateTime<Utc>,
    x_axis: Series,
    y_axis: Series,
}

impl TryFrom<DatasetRepr> for Dataset {
    type Error = DatasetError;

    fn try_from(repr: DatasetRepr) -> Result<Self, Self::Error> {
        Dataset::with_timestamp(repr.timestamp, repr.x_axis, repr.y_axis)
    }
}

fn check_monotonic(x: &[f64]) -> Result<(), DatasetError> {
    if x.len() < 2 {
        return Ok(());
    }
    let ascending = x[1] > x[0];
    for (i, pair) in x.windows(2).enumerate() {
        let ok = if ascending {
            pair[1] > pair[0]
        } else {
            pair[1] < pair[0]
        };
        if !ok {
            return Err(DatasetError::NonMonotonic { index: i + 1 });
        }
    }
    Ok(())
}

impl Dataset {
    /// Build a dataset stamped with the current time
    pub fn new(x_axis: Series, y_axis: Series) -> Result<Self, DatasetError> {
        Dataset::with_timestamp(Utc::now(), x_axis, y_axis)
    }

    /// Build a dataset with an explicit creation timestamp
    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        x_axis: Series,
        y_axis: Series,
    ) -> Result<Self, DatasetError> {
        if x_axis.len() != y_axis.len() {
            return Err(DatasetError::LengthMismatch {
                x_len: x_axis.len(),
                y_len: y_axis.len(),
            });
        }
        check_monotonic(x_axis.data_array())?;
        Ok(Self {
            timestamp,
            x_axis,
            y_axis,
        })
    }

    /// Convenience constructor from raw arrays
    pub fn from_arrays(
        x: Vec<f64>,
        x_unit: Unit,
        y: Vec<f64>,
        y_unit: Unit,
    ) -> Result<Self, DatasetError> {
        Dataset::new(Series::new(x, x_unit)?, Series::new(y, y_unit)?)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn x_axis(&self) -> &Series {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &Series {
        &self.y_axis
    }

    pub fn x(&self) -> &[f64] {
        self.x_axis.data_array()
    }

    pub fn y(&self) -> &[f64] {
        self.y_axis.data_array()
    }

    pub fn len(&self) -> usize {
        self.x_axis.len()
    }

    /// Always false for a validated dataset
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_empty()
    }

    pub fn direction(&self) -> AxisDirection {
        if self.len() > 1 && self.x()[1] < self.x()[0] {
            AxisDirection::Descending
        } else {
            AxisDirection::Ascending
        }
    }

    /// `(min, max)` of the x axis
    pub fn x_range(&self) -> (f64, f64) {
        let (a, b) = (self.x_axis.first(), self.x_axis.last());
        (a.min(b), a.max(b))
    }

    /// True when `[min, max]` lies inside the x range, up to edge tolerance
    pub fn covers(&self, min: f64, max: f64) -> bool {
        let (lo, hi) = self.x_range();
        let tol = RANGE_TOLERANCE * (hi - lo).abs().max(1.0);
        min >= lo - tol && max <= hi + tol
    }

    /// Replace the y values, keeping x axis, y unit and timestamp
    pub fn with_y(&self, y: Vec<f64>) -> Result<Dataset, DatasetError> {
        Dataset::with_timestamp(
            self.timestamp,
            self.x_axis.clone(),
            Series::new(y, self.y_axis.unit())?,
        )
    }

    /// Express the x axis in another unit, keeping the timestamp
    pub fn convert_x(&self, unit: Unit) -> Result<Dataset, DatasetError> {
        if unit == self.x_axis.unit() {
            return Ok(self.clone());
        }
        Dataset::with_timestamp(self.timestamp, self.x_axis.convert(unit)?, self.y_axis.clone())
    }

    /// Linearly interpolate y at each requested x. Requests outside the x
    /// range (beyond edge tolerance) fail, no extrapolation is done.
    pub fn interpolate(&self, targets: &[f64]) -> Result<Vec<f64>, DatasetError> {
        let x = self.x();
        let y = self.y();
        let (lo, hi) = self.x_range();
        let tol = RANGE_TOLERANCE * (hi - lo).abs().max(1.0);
        let ascending = self.direction() == AxisDirection::Ascending;

        targets
            .iter()
            .map(|&t| {
                if t < lo - tol || t > hi + tol {
                    return Err(DatasetError::OutOfRange { x: t, min: lo, max: hi });
                }
                if x.len() == 1 {
                    return Ok(y[0]);
                }
                let t = t.clamp(lo, hi);
                // First index whose x lies beyond t in axis order
                let upper = if ascending {
                    x.partition_point(|&v| v < t)
                } else {
                    x.partition_point(|&v| v > t)
                };
                let i = upper.clamp(1, x.len() - 1);
                let (x0, x1) = (x[i - 1], x[i]);
                let (y0, y1) = (y[i - 1], y[i]);
                Ok(y0 + (y1 - y0) * (t - x0) / (x1 - x0))
            })
            .collect()
    }

    /// Keep only points with `min < x < max`
    pub fn truncate(&self, min: f64, max: f64) -> Result<Dataset, DatasetError> {
        let (min, max) = (min.min(max), min.max(max));
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .x()
            .iter()
            .zip(self.y())
            .filter(|(x, _)| **x > min && **x < max)
            .map(|(x, y)| (*x, *y))
            .unzip();
        if xs.is_empty() {
            return Err(DatasetError::EmptyWindow { min, max });
        }
        Dataset::with_timestamp(
            self.timestamp,
            Series::new(xs, self.x_axis.unit())?,
            Series::new(ys, self.y_axis.unit())?,
        )
    }

    /// Trapezoidal area under y, independent of axis direction
    pub fn trapezoid_area(&self) -> f64 {
        self.x()
            .windows(2)
            .zip(self.y().windows(2))
            .map(|(x, y)| (x[1] - x[0]).abs() * (y[0] + y[1]) / 2.0)
            .sum()
    }
}
