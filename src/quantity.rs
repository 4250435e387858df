//! Quantity model

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convert::{Converter, IncompatibleUnits, UnitTag, UnknownUnit};

/// An amount of something in a known unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quantity {
    /// Value
    pub value: f64,
    /// Unit
    pub unit: UnitTag,
}

impl Quantity {
    /// Creates a new quantity
    pub fn new(value: f64, unit: UnitTag) -> Self {
        Self { value, unit }
    }

    /// Convert to another unit
    ///
    /// The value is not rounded.
    pub fn convert(&self, to: UnitTag, converter: &Converter) -> Result<Self, IncompatibleUnits> {
        let value = converter.convert(self.value, self.unit, to)?;
        Ok(Self::new(value, to))
    }

    /// Try adding two quantities
    ///
    /// The result is in the unit of `self`.
    pub fn try_add(&self, rhs: &Self, converter: &Converter) -> Result<Self, IncompatibleUnits> {
        let rhs = converter.convert(rhs.value, rhs.unit, self.unit)?;
        Ok(Self::new(self.value + rhs, self.unit))
    }

    /// Multiply the value by a factor
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.value * factor, self.unit)
    }

    /// Checks if the value is within `epsilon` of zero
    pub fn is_negligible(&self, epsilon: f64) -> bool {
        self.value.abs() <= epsilon
    }
}

/// Rounds the value to 3 decimal places
impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = (self.value * 1000.0).round() / 1000.0;
        match self.unit {
            UnitTag::Unitless => write!(f, "{value}"),
            unit => write!(f, "{value} {unit}"),
        }
    }
}

/// Parses `"500%g"`, `"500 g"`, `"1.5kg"` or a bare `"3"`
///
/// ```
/// # use pantry_reconcile::{Quantity, convert::UnitTag};
/// let q: Quantity = "500%g".parse().unwrap();
/// assert_eq!(q, Quantity::new(500.0, UnitTag::Gram));
/// let q: Quantity = "3".parse().unwrap();
/// assert_eq!(q.unit, UnitTag::Unitless);
/// ```
impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, unit) = match s.split_once('%') {
            Some((number, unit)) => (number.trim(), unit.trim()),
            None => {
                let split = s
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(s.len());
                (s[..split].trim(), s[split..].trim())
            }
        };
        let value: f64 = number
            .parse()
            .map_err(|_| QuantityParseError::Number(number.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(QuantityParseError::Number(number.to_string()));
        }
        let unit = UnitTag::parse(unit)?;
        Ok(Self::new(value, unit))
    }
}

/// Error parsing a [`Quantity`] from text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityParseError {
    #[error("Invalid number: '{0}'")]
    Number(String),

    #[error(transparent)]
    Unit(#[from] UnknownUnit),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("500%g" => Quantity::new(500.0, UnitTag::Gram))]
    #[test_case("1.5 kg" => Quantity::new(1.5, UnitTag::Kilogram))]
    #[test_case("2cups" => Quantity::new(2.0, UnitTag::Cup))]
    #[test_case(" 3 " => Quantity::new(3.0, UnitTag::Unitless) ; "bare number")]
    #[test_case("1 % bottle" => Quantity::new(1.0, UnitTag::Bottle) ; "spaced percent")]
    fn parse(input: &str) -> Quantity {
        input.parse().unwrap()
    }

    #[test_case("abc%g" ; "not a number")]
    #[test_case("-1%g" ; "negative")]
    #[test_case("1%handful" ; "unknown unit")]
    fn parse_error(input: &str) {
        assert!(input.parse::<Quantity>().is_err());
    }

    #[test]
    fn add_converts_to_lhs_unit() {
        let converter = Converter::bundled();
        let a = Quantity::new(1.0, UnitTag::Kilogram);
        let b = Quantity::new(500.0, UnitTag::Gram);
        assert_eq!(
            a.try_add(&b, &converter).unwrap(),
            Quantity::new(1.5, UnitTag::Kilogram)
        );
        let c = Quantity::new(1.0, UnitTag::Cup);
        assert!(a.try_add(&c, &converter).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Quantity::new(1.0 / 3.0, UnitTag::Cup).to_string(), "0.333 cup");
        assert_eq!(Quantity::new(2.0, UnitTag::Unitless).to_string(), "2");
    }
}
