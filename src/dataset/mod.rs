//! # Spectral Data Containers
//!
//! - [`Series`]: a non-empty array of finite numbers with one [`Unit`](crate::units::Unit)
//! - [`Dataset`]: paired x/y series plus the creation timestamp
//!
//! Both types validate on construction and on deserialization, so every
//! dataset that reaches the corrector or the fitter has equal-length axes
//! and a strictly monotonic x axis. Infrared exports are commonly written
//! with a descending wavenumber axis; both directions are accepted.
//!
//! ## Usage
//!
//! ```rust
//! use irpeak::dataset::Dataset;
//! use irpeak::units::Unit;
//!
//! let spectrum = Dataset::from_arrays(
//!     vec![1600.0, 1550.0, 1500.0],
//!     Unit::ReciprocalCentimeter,
//!     vec![0.1, 0.4, 0.1],
//!     Unit::Arbitrary,
//! )?;
//! assert_eq!(spectrum.x_range(), (1500.0, 1600.0));
//! # Ok::<(), irpeak::dataset::DatasetError>(())
//! ```

mod error;
mod series;
mod types;


pub use error::DatasetError;
pub use series::Series;
pub use types::{AxisDirection, Dataset};
