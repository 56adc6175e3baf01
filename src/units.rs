//! # Unit Vocabulary
//!
//! A closed set of physical units used by spectra, sample preparation and
//! derived quantities. Every unit knows its physical [`Dimension`], the scale
//! factor that takes it to the canonical SI unit of that dimension, and (for
//! temperatures) an additive offset.
//!
//! Where the Units of Measurement Ontology defines a term, the accession is
//! exposed through [`Unit::accession`].
//!
//! ## Reference
//! - OBO file: https://raw.githubusercontent.com/bio-ontology-research-group/unit-ontology/master/uo.obo

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// Exponents of the base quantities a unit is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub amount: i8,
    pub temperature: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0, 0, 0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(1, 0, 0, 0, 0);
    pub const RECIPROCAL_LENGTH: Dimension = Dimension::new(-1, 0, 0, 0, 0);
    pub const AREA: Dimension = Dimension::new(2, 0, 0, 0, 0);
    pub const MASS: Dimension = Dimension::new(0, 1, 0, 0, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1, 0, 0);
    pub const AMOUNT: Dimension = Dimension::new(0, 0, 0, 1, 0);
    pub const TEMPERATURE: Dimension = Dimension::new(0, 0, 0, 0, 1);
    pub const PRESSURE: Dimension = Dimension::new(-1, 1, -2, 0, 0);
    pub const LENGTH_PER_AMOUNT: Dimension = Dimension::new(1, 0, 0, -1, 0);
    pub const AMOUNT_PER_MASS: Dimension = Dimension::new(0, -1, 0, 1, 0);

    pub const fn new(length: i8, mass: i8, time: i8, amount: i8, temperature: i8) -> Self {
        Self {
            length,
            mass,
            time,
            amount,
            temperature,
        }
    }

    /// True for pure numbers (ratios, arbitrary intensities)
    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }
}

impl Add for Dimension {
    type Output = Dimension;

    fn add(self, rhs: Dimension) -> Dimension {
        Dimension::new(
            self.length + rhs.length,
            self.mass + rhs.mass,
            self.time + rhs.time,
            self.amount + rhs.amount,
            self.temperature + rhs.temperature,
        )
    }
}

impl Neg for Dimension {
    type Output = Dimension;

    fn neg(self) -> Dimension {
        Dimension::new(
            -self.length,
            -self.mass,
            -self.time,
            -self.amount,
            -self.temperature,
        )
    }
}

impl Sub for Dimension {
    type Output = Dimension;

    fn sub(self, rhs: Dimension) -> Dimension {
        self + (-rhs)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let parts = [
            ("L", self.length),
            ("M", self.mass),
            ("T", self.time),
            ("N", self.amount),
            ("Θ", self.temperature),
        ];
        let mut first = true;
        for (symbol, exponent) in parts {
            if exponent == 0 {
                continue;
            }
            if !first {
                write!(f, "·")?;
            }
            first = false;
            if exponent == 1 {
                write!(f, "{}", symbol)?;
            } else {
                write!(f, "{}^{}", symbol, exponent)?;
            }
        }
        Ok(())
    }
}

/// Units understood by the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "a.u.")]
    Arbitrary,
    #[serde(rename = "1")]
    Dimensionless,
    #[serde(rename = "nm")]
    Nanometer,
    #[serde(rename = "um")]
    Micrometer,
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "cm^-1")]
    ReciprocalCentimeter,
    #[serde(rename = "m^-1")]
    ReciprocalMeter,
    #[serde(rename = "cm^2")]
    SquareCentimeter,
    #[serde(rename = "m^2")]
    SquareMeter,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "mg")]
    Milligram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "mol")]
    Mole,
    #[serde(rename = "mmol")]
    Millimole,
    #[serde(rename = "umol")]
    Micromole,
    #[serde(rename = "K")]
    Kelvin,
    #[serde(rename = "degC")]
    Celsius,
    #[serde(rename = "Pa")]
    Pascal,
    #[serde(rename = "kPa")]
    Kilopascal,
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "mbar")]
    Millibar,
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "min")]
    Minute,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "cm/umol")]
    CentimeterPerMicromole,
    #[serde(rename = "m/mol")]
    MeterPerMole,
    #[serde(rename = "umol/g")]
    MicromolePerGram,
    #[serde(rename = "mol/kg")]
    MolePerKilogram,
}

impl Unit {
    /// Every unit in the vocabulary, in resolution preference order.
    pub const ALL: [Unit; 30] = [
        Unit::Dimensionless,
        Unit::Arbitrary,
        Unit::Nanometer,
        Unit::Micrometer,
        Unit::Millimeter,
        Unit::Centimeter,
        Unit::Meter,
        Unit::ReciprocalCentimeter,
        Unit::ReciprocalMeter,
        Unit::SquareCentimeter,
        Unit::SquareMeter,
        Unit::Gram,
        Unit::Milligram,
        Unit::Kilogram,
        Unit::Mole,
        Unit::Millimole,
        Unit::Micromole,
        Unit::Kelvin,
        Unit::Celsius,
        Unit::Pascal,
        Unit::Kilopascal,
        Unit::Bar,
        Unit::Millibar,
        Unit::Second,
        Unit::Minute,
        Unit::Hour,
        Unit::CentimeterPerMicromole,
        Unit::MeterPerMole,
        Unit::MicromolePerGram,
        Unit::MolePerKilogram,
    ];

    /// Short symbol, identical to the serialized form
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Arbitrary => "a.u.",
            Unit::Dimensionless => "1",
            Unit::Nanometer => "nm",
            Unit::Micrometer => "um",
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Meter => "m",
            Unit::ReciprocalCentimeter => "cm^-1",
            Unit::ReciprocalMeter => "m^-1",
            Unit::SquareCentimeter => "cm^2",
            Unit::SquareMeter => "m^2",
            Unit::Gram => "g",
            Unit::Milligram => "mg",
            Unit::Kilogram => "kg",
            Unit::Mole => "mol",
            Unit::Millimole => "mmol",
            Unit::Micromole => "umol",
            Unit::Kelvin => "K",
            Unit::Celsius => "degC",
            Unit::Pascal => "Pa",
            Unit::Kilopascal => "kPa",
            Unit::Bar => "bar",
            Unit::Millibar => "mbar",
            Unit::Second => "s",
            Unit::Minute => "min",
            Unit::Hour => "h",
            Unit::CentimeterPerMicromole => "cm/umol",
            Unit::MeterPerMole => "m/mol",
            Unit::MicromolePerGram => "umol/g",
            Unit::MolePerKilogram => "mol/kg",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Arbitrary => "arbitrary unit",
            Unit::Dimensionless => "dimensionless unit",
            Unit::Nanometer => "nanometer",
            Unit::Micrometer => "micrometer",
            Unit::Millimeter => "millimeter",
            Unit::Centimeter => "centimeter",
            Unit::Meter => "meter",
            Unit::ReciprocalCentimeter => "reciprocal centimeter",
            Unit::ReciprocalMeter => "reciprocal meter",
            Unit::SquareCentimeter => "square centimeter",
            Unit::SquareMeter => "square meter",
            Unit::Gram => "gram",
            Unit::Milligram => "milligram",
            Unit::Kilogram => "kilogram",
            Unit::Mole => "mole",
            Unit::Millimole => "millimole",
            Unit::Micromole => "micromole",
            Unit::Kelvin => "kelvin",
            Unit::Celsius => "degree Celsius",
            Unit::Pascal => "pascal",
            Unit::Kilopascal => "kilopascal",
            Unit::Bar => "bar",
            Unit::Millibar => "millibar",
            Unit::Second => "second",
            Unit::Minute => "minute",
            Unit::Hour => "hour",
            Unit::CentimeterPerMicromole => "centimeter per micromole",
            Unit::MeterPerMole => "meter per mole",
            Unit::MicromolePerGram => "micromole per gram",
            Unit::MolePerKilogram => "mole per kilogram",
        }
    }

    /// UO accession, if the ontology defines the unit
    pub fn accession(&self) -> Option<&'static str> {
        match self {
            Unit::Dimensionless => Some("UO:0000186"),
            Unit::Nanometer => Some("UO:0000018"),
            Unit::Micrometer => Some("UO:0000017"),
            Unit::Millimeter => Some("UO:0000016"),
            Unit::Centimeter => Some("UO:0000015"),
            Unit::Meter => Some("UO:0000008"),
            Unit::SquareCentimeter => Some("UO:0000081"),
            Unit::SquareMeter => Some("UO:0000080"),
            Unit::Gram => Some("UO:0000021"),
            Unit::Milligram => Some("UO:0000022"),
            Unit::Kilogram => Some("UO:0000009"),
            Unit::Mole => Some("UO:0000013"),
            Unit::Millimole => Some("UO:0000040"),
            Unit::Micromole => Some("UO:0000039"),
            Unit::Kelvin => Some("UO:0000012"),
            Unit::Celsius => Some("UO:0000027"),
            Unit::Pascal => Some("UO:0000110"),
            Unit::Second => Some("UO:0000010"),
            Unit::Minute => Some("UO:0000031"),
            Unit::Hour => Some("UO:0000032"),
            Unit::Arbitrary
            | Unit::ReciprocalCentimeter
            | Unit::ReciprocalMeter
            | Unit::Kilopascal
            | Unit::Bar
            | Unit::Millibar
            | Unit::CentimeterPerMicromole
            | Unit::MeterPerMole
            | Unit::MicromolePerGram
            | Unit::MolePerKilogram => None,
        }
    }

    /// Physical dimension of the unit
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Arbitrary | Unit::Dimensionless => Dimension::NONE,
            Unit::Nanometer
            | Unit::Micrometer
            | Unit::Millimeter
            | Unit::Centimeter
            | Unit::Meter => Dimension::LENGTH,
            Unit::ReciprocalCentimeter | Unit::ReciprocalMeter => Dimension::RECIPROCAL_LENGTH,
            Unit::SquareCentimeter | Unit::SquareMeter => Dimension::AREA,
            Unit::Gram | Unit::Milligram | Unit::Kilogram => Dimension::MASS,
            Unit::Mole | Unit::Millimole | Unit::Micromole => Dimension::AMOUNT,
            Unit::Kelvin | Unit::Celsius => Dimension::TEMPERATURE,
            Unit::Pascal | Unit::Kilopascal | Unit::Bar | Unit::Millibar => Dimension::PRESSURE,
            Unit::Second | Unit::Minute | Unit::Hour => Dimension::TIME,
            Unit::CentimeterPerMicromole | Unit::MeterPerMole => Dimension::LENGTH_PER_AMOUNT,
            Unit::MicromolePerGram | Unit::MolePerKilogram => Dimension::AMOUNT_PER_MASS,
        }
    }

    /// Factor taking a magnitude in this unit to the canonical SI unit
    pub fn scale(&self) -> f64 {
        match self {
            Unit::Arbitrary | Unit::Dimensionless => 1.0,
            Unit::Nanometer => 1e-9,
            Unit::Micrometer => 1e-6,
            Unit::Millimeter => 1e-3,
            Unit::Centimeter => 1e-2,
            Unit::Meter => 1.0,
            Unit::ReciprocalCentimeter => 1e2,
            Unit::ReciprocalMeter => 1.0,
            Unit::SquareCentimeter => 1e-4,
            Unit::SquareMeter => 1.0,
            Unit::Gram => 1e-3,
            Unit::Milligram => 1e-6,
            Unit::Kilogram => 1.0,
            Unit::Mole => 1.0,
            Unit::Millimole => 1e-3,
            Unit::Micromole => 1e-6,
            Unit::Kelvin | Unit::Celsius => 1.0,
            Unit::Pascal => 1.0,
            Unit::Kilopascal => 1e3,
            Unit::Bar => 1e5,
            Unit::Millibar => 1e2,
            Unit::Second => 1.0,
            Unit::Minute => 60.0,
            Unit::Hour => 3600.0,
            Unit::CentimeterPerMicromole => 1e4,
            Unit::MeterPerMole => 1.0,
            Unit::MicromolePerGram => 1e-3,
            Unit::MolePerKilogram => 1.0,
        }
    }

    /// Additive offset to the canonical unit (non-zero only for Celsius)
    pub fn offset(&self) -> f64 {
        match self {
            Unit::Celsius => 273.15,
            _ => 0.0,
        }
    }

    /// True when both units measure the same physical quantity
    pub fn is_compatible(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }

    /// Canonical SI unit for a dimension, if the vocabulary has one
    pub fn canonical(dimension: Dimension) -> Option<Unit> {
        Unit::ALL
            .iter()
            .copied()
            .find(|u| u.dimension() == dimension && u.scale() == 1.0 && u.offset() == 0.0)
    }

    /// Find the unit with the given dimension and scale.
    ///
    /// Scales are compared with a relative tolerance so that products such as
    /// `cm^2 * cm^-1` land on `cm` despite floating-point rounding.
    pub fn resolve(dimension: Dimension, scale: f64) -> Option<Unit> {
        Unit::ALL.iter().copied().find(|u| {
            u.dimension() == dimension
                && u.offset() == 0.0
                && (u.scale() - scale).abs() <= 1e-12 * scale.abs().max(u.scale())
        })
    }

    /// Convert a magnitude from this unit into `target`, assuming compatible units
    pub(crate) fn convert_magnitude(&self, value: f64, target: Unit) -> f64 {
        let si = value * self.scale() + self.offset();
        (si - target.offset()) / target.scale()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    /// Accepts symbols and full names, plus a few common spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(unit) = Unit::ALL
            .iter()
            .copied()
            .find(|u| u.symbol() == trimmed || u.name().eq_ignore_ascii_case(trimmed))
        {
            return Ok(unit);
        }
        match trimmed {
            "" | "au" | "arb. unit" | "arbitrary" => Ok(Unit::Arbitrary),
            "µm" | "μm" => Ok(Unit::Micrometer),
            "µmol" | "μmol" => Ok(Unit::Micromole),
            "1/cm" | "cm-1" | "wavenumber" => Ok(Unit::ReciprocalCentimeter),
            "°C" | "C" | "celsius" => Ok(Unit::Celsius),
            "cm/µmol" | "cm/μmol" => Ok(Unit::CentimeterPerMicromole),
            "µmol/g" | "μmol/g" => Ok(Unit::MicromolePerGram),
            "dimensionless" => Ok(Unit::Dimensionless),
            other => Err(format!("Unknown unit: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_unit_parses_from_its_symbol() {
        for unit in Unit::ALL {
            assert_eq!(unit.symbol().parse::<Unit>(), Ok(unit));
        }
    }

    #[test]
    fn test_every_dimension_has_a_canonical_unit() {
        for unit in Unit::ALL {
            let canonical = Unit::canonical(unit.dimension()).unwrap();
            assert_eq!(canonical.scale(), 1.0);
            assert!(canonical.is_compatible(unit));
        }
    }

    #[test]
    fn test_resolve_product_of_area_and_wavenumber() {
        let dim = Unit::SquareCentimeter.dimension() + Unit::ReciprocalCentimeter.dimension();
        let scale = Unit::SquareCentimeter.scale() * Unit::ReciprocalCentimeter.scale();
        assert_eq!(Unit::resolve(dim, scale), Some(Unit::Centimeter));
    }

    #[test]
    fn test_length_and_reciprocal_length_are_distinct() {
        assert!(!Unit::Centimeter.is_compatible(Unit::ReciprocalCentimeter));
        assert_ne!(Dimension::LENGTH, Dimension::RECIPROCAL_LENGTH);
    }

    #[test]
    fn test_celsius_offset() {
        let kelvin = Unit::Celsius.convert_magnitude(150.0, Unit::Kelvin);
        assert!((kelvin - 423.15).abs() < 1e-12);
    }

    #[test]
    fn test_serde_uses_symbols() {
        let json = serde_json::to_string(&Unit::ReciprocalCentimeter).unwrap();
        assert_eq!(json, "\"cm^-1\"");
        let unit: Unit = serde_json::from_str("\"umol/g\"").unwrap();
        assert_eq!(unit, Unit::MicromolePerGram);
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::PRESSURE.to_string(), "L^-1·M·T^-2");
        assert_eq!(Dimension::NONE.to_string(), "1");
    }
}
