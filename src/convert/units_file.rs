//! Configuration data structures used in [`ConverterBuilder`](super::ConverterBuilder)

use serde::Deserialize;
use thiserror::Error;

use super::{UnitFamily, UnitTag};

/// Configuration struct for the conversion table used in
/// [`ConverterBuilder`](super::ConverterBuilder)
///
/// This structure is designed for deserializing [TOML](https://toml.io/en/),
/// but you can try other formats supported by serde.
///
/// ```toml
/// [[family]]
/// family = "mass"
/// units = [
///     { unit = "g", ratio = 1.0 },
///     { unit = "kg", ratio = 1000.0 },
/// ]
///
/// [[equivalent]]
/// units = [{ unit = "piece", ratio = 1.0 }, { unit = "none", ratio = 1.0 }]
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct UnitsFile {
    /// Ratios of continuous units to the base unit of their family
    #[serde(default)]
    pub family: Vec<FamilyGroup>,
    /// Groups of discrete units declared convertible between each other
    #[serde(default)]
    pub equivalent: Vec<EquivalenceGroup>,
}

/// Ratios for the units of a continuous [`UnitFamily`]
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FamilyGroup {
    /// Family of all the units in the group
    pub family: UnitFamily,
    /// Units with their ratio to [`UnitFamily::base_unit`]
    pub units: Vec<UnitEntry>,
}

/// Discrete units that can be converted between each other
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EquivalenceGroup {
    /// Units with their ratio inside the group
    pub units: Vec<UnitEntry>,
}

/// A unit and its conversion ratio
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UnitEntry {
    pub unit: UnitTag,
    pub ratio: f64,
}

impl UnitsFile {
    /// Parse a units file from TOML
    pub fn parse(input: &str) -> Result<Self, UnitsFileError> {
        toml::from_str(input).map_err(|e| UnitsFileError::Parse(e.to_string()))
    }

    /// Get the bundled units file
    ///
    /// This is only available with the `bundled_units` feature.
    #[cfg(feature = "bundled_units")]
    pub fn bundled() -> Self {
        const TEXT: &str = include_str!("../../units.toml");
        Self::parse(TEXT).expect("bundled units file is valid TOML")
    }
}

/// Error reading a [`UnitsFile`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsFileError {
    #[error("Error parsing units file: {0}")]
    Parse(String),
}
