//! Support for **configurable** unit conversion
//!
//! This includes:
//! - A closed set of [`UnitTag`]s grouped into [`UnitFamily`]s
//! - A layered configuration system for the conversion table
//! - Conversions inside a family, with cross-family pairs reported as
//!   [`IncompatibleUnits`]

use std::str::FromStr;

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use builder::{ConverterBuilder, ConverterBuilderError};
pub use units_file::UnitsFile;

mod builder;
pub mod units_file;

/// Main struct to perform conversions
///
/// This holds the conversion table: the ratio of every unit to the base unit
/// of its family and which discrete units are declared equivalent.
///
/// To create one use [`Converter::builder`].
///
/// [`Converter::default`] changes with the feature `bundled_units`:
/// - When enabled, [`Converter::bundled`].
/// - When disabled, [`Converter::empty`].
#[derive(Debug, Clone, PartialEq)]
pub struct Converter {
    ratios: EnumMap<UnitTag, Option<f64>>,
    discrete_groups: EnumMap<UnitTag, Option<usize>>,
}

impl Converter {
    /// Start to create a new [Converter]
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    /// Empty converter
    ///
    /// This is the default when the `bundled_units` feature is disabled.
    ///
    /// An empty converter only performs the identity conversion, every other
    /// pair is [`IncompatibleUnits`].
    pub fn empty() -> Self {
        Self {
            ratios: EnumMap::default(),
            discrete_groups: EnumMap::default(),
        }
    }

    /// Converter with the bundled units
    ///
    /// Metric and US customary mass and volume units. No discrete units are
    /// declared equivalent.
    ///
    /// This is only available when the `bundled_units` feature is enabled.
    ///
    /// This is the default when the `bundled_units` feature is enabled.
    #[cfg(feature = "bundled_units")]
    pub fn bundled() -> Self {
        ConverterBuilder::new()
            .with_units_file(UnitsFile::bundled())
            .expect("bundled units file is valid")
            .finish()
            .expect("bundled units file is valid")
    }

    /// Ratio of a unit to the base unit of its family, if known
    ///
    /// For discrete units this is the ratio inside its equivalence group.
    pub fn ratio(&self, unit: UnitTag) -> Option<f64> {
        self.ratios[unit]
    }

    /// Checks if `from` can be converted to `to` without needing a value
    pub fn is_convertible(&self, from: UnitTag, to: UnitTag) -> bool {
        if from == to {
            return true;
        }
        match (from.family(), to.family()) {
            (UnitFamily::Discrete, UnitFamily::Discrete) => {
                matches!(
                    (self.discrete_groups[from], self.discrete_groups[to]),
                    (Some(a), Some(b)) if a == b
                )
            }
            (a, b) if a == b => self.ratios[from].is_some() && self.ratios[to].is_some(),
            _ => false,
        }
    }

    /// Convert a value from one unit to another
    ///
    /// - Same unit: the value is returned unchanged.
    /// - Same family: `value * ratio(from) / ratio(to)`.
    /// - Otherwise: [`IncompatibleUnits`]. This is an expected outcome and
    ///   callers have to branch on it.
    ///
    /// The result is never rounded.
    ///
    /// ```
    /// # use pantry_reconcile::convert::{Converter, UnitTag};
    /// let converter = Converter::bundled();
    /// assert_eq!(converter.convert(2.5, UnitTag::Kilogram, UnitTag::Gram).unwrap(), 2500.0);
    /// assert!(converter.convert(1.0, UnitTag::Gram, UnitTag::Millilitre).is_err());
    /// ```
    pub fn convert(&self, value: f64, from: UnitTag, to: UnitTag) -> Result<f64, IncompatibleUnits> {
        if from == to {
            return Ok(value);
        }
        if !self.is_convertible(from, to) {
            return Err(IncompatibleUnits { from, to });
        }
        match (self.ratios[from], self.ratios[to]) {
            (Some(from_ratio), Some(to_ratio)) => Ok(value * from_ratio / to_ratio),
            _ => Err(IncompatibleUnits { from, to }),
        }
    }
}

#[cfg(not(feature = "bundled_units"))]
impl Default for Converter {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(feature = "bundled_units")]
impl Default for Converter {
    fn default() -> Self {
        Self::bundled()
    }
}

/// Group of units inside which conversion is well defined
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    enum_map::Enum,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UnitFamily {
    Mass,
    Volume,
    Discrete,
}

impl UnitFamily {
    /// Unit every ratio of the family is relative to
    ///
    /// Discrete units have no common base, only equivalence groups.
    pub fn base_unit(&self) -> Option<UnitTag> {
        match self {
            UnitFamily::Mass => Some(UnitTag::Gram),
            UnitFamily::Volume => Some(UnitTag::Millilitre),
            UnitFamily::Discrete => None,
        }
    }

    /// Whether the family measures a continuous amount
    pub fn is_continuous(&self) -> bool {
        !matches!(self, UnitFamily::Discrete)
    }
}

/// A known unit
///
/// The set is closed. Parsing is case insensitive and accepts symbols,
/// singular and plural names and a few common aliases. The [`Display`]
/// implementation writes the canonical symbol.
///
/// [`Display`]: std::fmt::Display
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
    enum_map::Enum,
)]
#[strum(ascii_case_insensitive)]
pub enum UnitTag {
    #[strum(to_string = "g", serialize = "gram", serialize = "grams", serialize = "gr")]
    Gram,
    #[strum(
        to_string = "kg",
        serialize = "kilogram",
        serialize = "kilograms",
        serialize = "kilo",
        serialize = "kilos"
    )]
    Kilogram,
    #[strum(to_string = "oz", serialize = "ounce", serialize = "ounces")]
    Ounce,
    #[strum(
        to_string = "lb",
        serialize = "lbs",
        serialize = "pound",
        serialize = "pounds"
    )]
    Pound,
    #[strum(
        to_string = "ml",
        serialize = "millilitre",
        serialize = "millilitres",
        serialize = "milliliter",
        serialize = "milliliters"
    )]
    Millilitre,
    #[strum(
        to_string = "l",
        serialize = "litre",
        serialize = "litres",
        serialize = "liter",
        serialize = "liters"
    )]
    Litre,
    #[strum(to_string = "tsp", serialize = "teaspoon", serialize = "teaspoons")]
    Teaspoon,
    #[strum(
        to_string = "tbsp",
        serialize = "tablespoon",
        serialize = "tablespoons",
        serialize = "tbs"
    )]
    Tablespoon,
    #[strum(to_string = "cup", serialize = "cups", serialize = "c")]
    Cup,
    #[strum(
        to_string = "piece",
        serialize = "pieces",
        serialize = "pc",
        serialize = "pcs"
    )]
    Piece,
    #[strum(to_string = "can", serialize = "cans", serialize = "tin", serialize = "tins")]
    Can,
    #[strum(to_string = "bottle", serialize = "bottles")]
    Bottle,
    #[strum(to_string = "box", serialize = "boxes")]
    Box,
    #[strum(to_string = "bag", serialize = "bags")]
    Bag,
    /// No unit at all, a bare count
    #[strum(to_string = "none")]
    Unitless,
}

impl UnitTag {
    /// The family this unit belongs to
    pub fn family(&self) -> UnitFamily {
        use UnitTag::*;
        match self {
            Gram | Kilogram | Ounce | Pound => UnitFamily::Mass,
            Millilitre | Litre | Teaspoon | Tablespoon | Cup => UnitFamily::Volume,
            Piece | Can | Bottle | Box | Bag | Unitless => UnitFamily::Discrete,
        }
    }

    /// Parse a unit from free text
    ///
    /// Surrounding whitespace is ignored and an empty text is
    /// [`UnitTag::Unitless`].
    ///
    /// ```
    /// # use pantry_reconcile::convert::UnitTag;
    /// assert_eq!(UnitTag::parse(" Cups ").unwrap(), UnitTag::Cup);
    /// assert_eq!(UnitTag::parse("").unwrap(), UnitTag::Unitless);
    /// assert!(UnitTag::parse("handful").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, UnknownUnit> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(UnitTag::Unitless);
        }
        UnitTag::from_str(text).map_err(|_| UnknownUnit(text.to_string()))
    }

    /// Canonical symbol
    pub fn symbol(&self) -> &'static str {
        self.into()
    }
}

impl Serialize for UnitTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for UnitTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        UnitTag::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Error when trying to parse an unknown unit
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown unit: '{0}'")]
pub struct UnknownUnit(pub String);

/// Two units that can't be converted between each other
///
/// Returned by [`Converter::convert`] for cross-family pairs and for
/// discrete units not declared equivalent.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Incompatible units: '{from}' ({}) can't be converted to '{to}' ({})", .from.family(), .to.family())]
pub struct IncompatibleUnits {
    pub from: UnitTag,
    pub to: UnitTag,
}
