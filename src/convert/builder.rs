use enum_map::EnumMap;
use thiserror::Error;

use super::{
    units_file::{UnitEntry, UnitsFile},
    Converter, UnitFamily, UnitTag,
};

/// Builder to create a custom [`Converter`]
///
/// The builder uses [`UnitsFile`] to configure the converter. More than one
/// file can be layered. Order matters, as a ratio declared in a later file
/// overrides the one from a file added before. Equivalence groups from all
/// the layers are joined.
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    ratios: EnumMap<UnitTag, Option<f64>>,
    equivalent: Vec<Vec<UnitEntry>>,
}

impl ConverterBuilder {
    /// New empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the bundled units to the builder
    ///
    /// This is only available with the `bundled_units` feature.
    #[cfg(feature = "bundled_units")]
    pub fn with_bundled_units(mut self) -> Result<Self, ConverterBuilderError> {
        self.add_bundled_units()?;
        Ok(self)
    }

    /// Add the bundled units to the builder
    ///
    /// This is only available with the `bundled_units` feature.
    #[cfg(feature = "bundled_units")]
    pub fn add_bundled_units(&mut self) -> Result<&mut Self, ConverterBuilderError> {
        self.add_units_file(UnitsFile::bundled())?;
        Ok(self)
    }

    /// Add a [`UnitsFile`] to the builder
    pub fn with_units_file(mut self, units: UnitsFile) -> Result<Self, ConverterBuilderError> {
        self.add_units_file(units)?;
        Ok(self)
    }

    /// Add a [`UnitsFile`] to the builder
    pub fn add_units_file(&mut self, units: UnitsFile) -> Result<&mut Self, ConverterBuilderError> {
        for group in units.family {
            if !group.family.is_continuous() {
                return Err(ConverterBuilderError::DiscreteFamily);
            }
            for entry in group.units {
                if entry.unit.family() != group.family {
                    return Err(ConverterBuilderError::WrongFamily {
                        unit: entry.unit,
                        expected: group.family,
                    });
                }
                check_ratio(&entry)?;
                self.ratios[entry.unit] = Some(entry.ratio);
            }
        }

        for group in units.equivalent {
            if group.units.len() < 2 {
                return Err(ConverterBuilderError::SingleUnitGroup);
            }
            for entry in &group.units {
                if entry.unit.family() != UnitFamily::Discrete {
                    return Err(ConverterBuilderError::WrongFamily {
                        unit: entry.unit,
                        expected: UnitFamily::Discrete,
                    });
                }
                check_ratio(entry)?;
            }
            self.equivalent.push(group.units);
        }

        Ok(self)
    }

    /// Consume the builder and return the new [`Converter`]
    pub fn finish(self) -> Result<Converter, ConverterBuilderError> {
        let mut ratios = self.ratios;

        // the base of a declared family has to be exactly 1
        for family in [UnitFamily::Mass, UnitFamily::Volume] {
            let Some(base) = family.base_unit() else {
                continue;
            };
            let declared = ratios
                .iter()
                .any(|(unit, ratio)| unit.family() == family && ratio.is_some());
            if !declared {
                continue;
            }
            if ratios[base] != Some(1.0) {
                return Err(ConverterBuilderError::InvalidBase { family, base });
            }
            // a declared family converts between all of its units
            if let Some((unit, _)) = ratios
                .iter()
                .find(|(unit, ratio)| unit.family() == family && ratio.is_none())
            {
                return Err(ConverterBuilderError::MissingRatio { unit });
            }
        }

        let mut discrete_groups: EnumMap<UnitTag, Option<usize>> = EnumMap::default();
        for (id, group) in self.equivalent.iter().enumerate() {
            for entry in group {
                if discrete_groups[entry.unit].is_some() {
                    return Err(ConverterBuilderError::DuplicateEquivalence { unit: entry.unit });
                }
                discrete_groups[entry.unit] = Some(id);
                ratios[entry.unit] = Some(entry.ratio);
            }
        }

        Ok(Converter {
            ratios,
            discrete_groups,
        })
    }
}

fn check_ratio(entry: &UnitEntry) -> Result<(), ConverterBuilderError> {
    if entry.ratio.is_finite() && entry.ratio > 0.0 {
        Ok(())
    } else {
        Err(ConverterBuilderError::InvalidRatio {
            unit: entry.unit,
            ratio: entry.ratio,
        })
    }
}

/// Errors generated by [`ConverterBuilder`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConverterBuilderError {
    #[error("Discrete units can only be declared in equivalence groups")]
    DiscreteFamily,

    #[error("Unit '{unit}' does not belong to the {expected} family")]
    WrongFamily { unit: UnitTag, expected: UnitFamily },

    #[error("Invalid ratio for unit '{unit}': {ratio}")]
    InvalidRatio { unit: UnitTag, ratio: f64 },

    #[error("The base unit '{base}' of the {family} family must have a ratio of 1")]
    InvalidBase { family: UnitFamily, base: UnitTag },

    #[error("Unit '{unit}' has no ratio, but other units of its family do")]
    MissingRatio { unit: UnitTag },

    #[error("Equivalence groups need at least two units")]
    SingleUnitGroup,

    #[error("Unit '{unit}' is declared in more than one equivalence group")]
    DuplicateEquivalence { unit: UnitTag },
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn build(input: &str) -> Result<Converter, ConverterBuilderError> {
        Converter::builder()
            .with_units_file(UnitsFile::parse(input).unwrap())?
            .finish()
    }

    #[test]
    fn equivalent_discrete_units() {
        let converter = build(indoc! {r#"
            [[equivalent]]
            units = [{ unit = "piece", ratio = 1.0 }, { unit = "box", ratio = 12.0 }]
        "#})
        .unwrap();
        assert_eq!(
            converter.convert(2.0, UnitTag::Box, UnitTag::Piece),
            Ok(24.0)
        );
        assert!(converter.convert(1.0, UnitTag::Can, UnitTag::Piece).is_err());
    }

    #[test]
    fn layers_override_ratios() {
        let mut builder = Converter::builder();
        builder.add_bundled_units().unwrap();
        builder
            .add_units_file(
                UnitsFile::parse(indoc! {r#"
                    [[family]]
                    family = "volume"
                    units = [{ unit = "cup", ratio = 250.0 }]
                "#})
                .unwrap(),
            )
            .unwrap();
        let converter = builder.finish().unwrap();
        assert_eq!(
            converter.convert(2.0, UnitTag::Cup, UnitTag::Millilitre),
            Ok(500.0)
        );
        // untouched units still come from the first layer
        assert_eq!(
            converter.convert(1.0, UnitTag::Kilogram, UnitTag::Gram),
            Ok(1000.0)
        );
    }

    #[test]
    fn wrong_family() {
        let err = build(indoc! {r#"
            [[family]]
            family = "mass"
            units = [{ unit = "g", ratio = 1.0 }, { unit = "ml", ratio = 1.0 }]
        "#})
        .unwrap_err();
        assert_eq!(
            err,
            ConverterBuilderError::WrongFamily {
                unit: UnitTag::Millilitre,
                expected: UnitFamily::Mass
            }
        );
    }

    #[test]
    fn discrete_family_rejected() {
        let err = build(indoc! {r#"
            [[family]]
            family = "discrete"
            units = [{ unit = "piece", ratio = 1.0 }]
        "#})
        .unwrap_err();
        assert_eq!(err, ConverterBuilderError::DiscreteFamily);
    }

    #[test]
    fn invalid_ratio() {
        let err = build(indoc! {r#"
            [[family]]
            family = "mass"
            units = [{ unit = "g", ratio = 1.0 }, { unit = "kg", ratio = -1000.0 }]
        "#})
        .unwrap_err();
        assert!(matches!(err, ConverterBuilderError::InvalidRatio { .. }));
    }

    #[test]
    fn partial_family_rejected() {
        let err = build(indoc! {r#"
            [[family]]
            family = "mass"
            units = [{ unit = "g", ratio = 1.0 }]
        "#})
        .unwrap_err();
        assert_eq!(
            err,
            ConverterBuilderError::MissingRatio {
                unit: UnitTag::Kilogram
            }
        );

        // a family left out entirely is fine
        let converter = build(indoc! {r#"
            [[family]]
            family = "mass"
            units = [
                { unit = "g", ratio = 1.0 },
                { unit = "kg", ratio = 1000.0 },
                { unit = "oz", ratio = 28.349523125 },
                { unit = "lb", ratio = 453.59237 },
            ]
        "#})
        .unwrap();
        assert_eq!(
            converter.convert(1.0, UnitTag::Kilogram, UnitTag::Gram),
            Ok(1000.0)
        );
        assert!(converter.convert(1.0, UnitTag::Cup, UnitTag::Millilitre).is_err());
    }

    #[test]
    fn base_must_be_one() {
        let err = build(indoc! {r#"
            [[family]]
            family = "mass"
            units = [{ unit = "kg", ratio = 1.0 }]
        "#})
        .unwrap_err();
        assert_eq!(
            err,
            ConverterBuilderError::InvalidBase {
                family: UnitFamily::Mass,
                base: UnitTag::Gram
            }
        );
    }

    #[test]
    fn duplicate_equivalence() {
        let err = build(indoc! {r#"
            [[equivalent]]
            units = [{ unit = "piece", ratio = 1.0 }, { unit = "box", ratio = 12.0 }]

            [[equivalent]]
            units = [{ unit = "piece", ratio = 1.0 }, { unit = "bag", ratio = 6.0 }]
        "#})
        .unwrap_err();
        assert_eq!(
            err,
            ConverterBuilderError::DuplicateEquivalence {
                unit: UnitTag::Piece
            }
        );
    }
}
