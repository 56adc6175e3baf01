//! # Quantity Calculator
//!
//! Turns integrated band areas into chemical quantities. Each [`Formula`]
//! declares its inputs ([`Slot`]s) with the unit it is written in; inputs
//! are converted into those units before evaluation, and uncertainty is
//! propagated by numeric differentiation.
//!
//! | Formula | Expression | Result |
//! |---------|------------|--------|
//! | `active_site_density` | `n = A * S / (m * eps)` | umol/g |
//! | `extinction_coefficient` | `eps = A * S / (m * n)` | cm/umol |
//! | `adsorbed_amount` | `N = A * S / eps` | umol |
//! | `area_ratio` | `r = A1 / A2` | 1 |
//!
//! ## Example
//!
//! ```rust
//! use irpeak::quantity::{evaluate, Formula};
//! use irpeak::units::Unit;
//! use irpeak::value::Value;
//!
//! let inputs = [
//!     Value::with_error(1.5, Unit::ReciprocalCentimeter, 0.05)?,
//!     Value::new(2.0, Unit::SquareCentimeter),
//!     Value::new(20.0, Unit::Milligram),
//!     Value::new(1.67, Unit::CentimeterPerMicromole),
//! ];
//! let evaluation = evaluate("Bronsted site density", Formula::ActiveSiteDensity, &inputs)?;
//! assert_eq!(evaluation.result.value.unit(), Unit::MicromolePerGram);
//! assert!((evaluation.result.value.value() - 89.82).abs() < 0.01);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod calculation;
mod error;
mod formula;

#[cfg(test)]
mod tests;

pub use calculation::{evaluate, quantify_bands, Calculation, Evaluation, FlatResult, MeasurementResult};
pub use error::QuantityError;
pub use formula::{Formula, Slot};
