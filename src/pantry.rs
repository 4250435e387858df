//! Pantry inventory file parser
//!
//! This module reads and writes an [`Inventory`] snapshot in TOML format.
//!
//! ## Format
//!
//! ```toml
//! # Top level items have no location
//! salt = "1%kg"
//!
//! [freezer]
//! # Simple item with just quantity
//! cranberries = "500%g"
//!
//! [fridge]
//! # Item with attributes
//! butter = { quantity = "250%g", low = "100%g", store = "market", id = "b-1" }
//! ```
//!
//! Each section is a location. Quantities use a `%` between the number and
//! the unit, a missing unit is [`UnitTag::Unitless`]. The known attributes
//! are `quantity` (required), `low`, `store`, `id`, `archived` and
//! `original`. Others are logged and ignored.
//!
//! Items without `id` get `<location>.<name>`, or just `<name>` at the top
//! level. A top level table with a string `quantity` is an item, any other
//! table is a section.
//!
//! This module is only available with the `pantry` [feature](crate::_features).
//!
use thiserror::Error;

use crate::{
    convert::{Converter, UnitTag},
    error::ReconcileError,
    model::{Inventory, InventoryItem},
    quantity::{Quantity, QuantityParseError},
};

const KNOWN_ATTRIBUTES: &[&str] = &["quantity", "low", "store", "id", "archived", "original"];

/// Parse an [`Inventory`] from TOML format
///
/// Low stock thresholds are converted to the item unit with the default
/// [`Converter`]. The inventory is validated before returning it.
///
/// ```
/// let pantry = r#"
/// [freezer]
/// cranberries = "500%g"
/// spinach = { quantity = "1%kg", low = "200%g" }
/// "#;
///
/// let inventory = pantry_reconcile::pantry::parse(pantry).unwrap();
/// assert_eq!(inventory.len(), 2);
/// let spinach = inventory.get("freezer.spinach").unwrap();
/// assert_eq!(spinach.low_stock_threshold, Some(0.2));
/// ```
pub fn parse(input: &str) -> Result<Inventory, PantryError> {
    let converter = Converter::default();
    let value: toml::Value = toml::from_str(input).map_err(|e| PantryError::Parse {
        message: format!("TOML parse error: {}", e),
    })?;
    let table = value.as_table().ok_or_else(|| PantryError::Parse {
        message: "Expected TOML table at root".to_string(),
    })?;

    let mut inventory = Inventory::new();
    for (key, value) in table {
        match value {
            toml::Value::String(_) => {
                inventory.push(parse_item(key, value, None, &converter)?);
            }
            toml::Value::Table(t) if is_top_level_item(t) => {
                inventory.push(parse_item(key, value, None, &converter)?);
            }
            toml::Value::Table(section) => {
                for (name, value) in section {
                    inventory.push(parse_item(name, value, Some(key.as_str()), &converter)?);
                }
            }
            _ => {
                return Err(PantryError::Parse {
                    message: format!("Invalid section type for '{}'", key),
                })
            }
        }
    }

    inventory.validate()?;
    Ok(inventory)
}

fn is_top_level_item(table: &toml::value::Table) -> bool {
    matches!(table.get("quantity"), Some(toml::Value::String(_)))
        && table
            .keys()
            .all(|k| KNOWN_ATTRIBUTES.contains(&k.as_str()))
}

fn default_id(name: &str, location: Option<&str>) -> String {
    match location {
        Some(location) => format!("{location}.{name}"),
        None => name.to_string(),
    }
}

fn parse_item(
    name: &str,
    value: &toml::Value,
    location: Option<&str>,
    converter: &Converter,
) -> Result<InventoryItem, PantryError> {
    let quantity_error = |source: QuantityParseError| PantryError::Quantity {
        item: name.to_string(),
        source,
    };

    let mut item = match value {
        toml::Value::String(quantity) => {
            let q: Quantity = quantity.parse().map_err(quantity_error)?;
            InventoryItem::new(default_id(name, location), name, q.value, q.unit)
        }
        toml::Value::Table(attrs) => {
            let mut attrs = attrs.clone();
            let string_attr = |attrs: &mut toml::value::Table, key: &str| match attrs.remove(key) {
                Some(toml::Value::String(s)) => Ok(Some(s)),
                None => Ok(None),
                Some(other) => Err(PantryError::Attribute {
                    item: name.to_string(),
                    attribute: key.to_string(),
                    found: other.type_str(),
                }),
            };

            let q: Quantity = string_attr(&mut attrs, "quantity")?
                .ok_or_else(|| PantryError::MissingQuantity(name.to_string()))?
                .parse()
                .map_err(quantity_error)?;
            let id = string_attr(&mut attrs, "id")?.unwrap_or_else(|| default_id(name, location));
            let mut item = InventoryItem::new(id, name, q.value, q.unit);

            // amounts in the item unit
            let unit = item.unit;
            let amount_attr = |attrs: &mut toml::value::Table,
                               key: &'static str|
             -> Result<Option<f64>, PantryError> {
                let Some(text) = string_attr(attrs, key)? else {
                    return Ok(None);
                };
                let q: Quantity = text.parse().map_err(quantity_error)?;
                let converted = q.convert(unit, converter).map_err(|_| PantryError::AttributeUnit {
                    item: name.to_string(),
                    attribute: key,
                    unit: q.unit,
                    expected: unit,
                })?;
                Ok(Some(converted.value))
            };
            item.low_stock_threshold = amount_attr(&mut attrs, "low")?;
            item.original_quantity = amount_attr(&mut attrs, "original")?;
            item.store_id = string_attr(&mut attrs, "store")?;
            match attrs.remove("archived") {
                Some(toml::Value::Boolean(archived)) => item.is_archived = archived,
                None => {}
                Some(other) => {
                    return Err(PantryError::Attribute {
                        item: name.to_string(),
                        attribute: "archived".to_string(),
                        found: other.type_str(),
                    })
                }
            }

            for key in attrs.keys() {
                tracing::warn!(
                    item = name,
                    attribute = %key,
                    "unknown pantry attribute ignored, valid attributes are: {}",
                    KNOWN_ATTRIBUTES.join(", ")
                );
            }
            item
        }
        _ => {
            return Err(PantryError::Parse {
                message: format!(
                    "Invalid value type for item '{}', expected string or table",
                    name
                ),
            })
        }
    };
    item.location = location.map(str::to_string);
    Ok(item)
}

fn quantity_string(value: f64, unit: UnitTag) -> String {
    match unit {
        UnitTag::Unitless => value.to_string(),
        unit => format!("{value}%{}", unit.symbol()),
    }
}

fn item_value(item: &InventoryItem) -> toml::Value {
    let location = item.location.as_deref();
    let plain = item.low_stock_threshold.is_none()
        && item.store_id.is_none()
        && !item.is_archived
        && item.original_quantity.is_none()
        && item.id == default_id(&item.name, location);
    let quantity = quantity_string(item.quantity, item.unit);
    if plain {
        return toml::Value::String(quantity);
    }

    let mut t = toml::value::Table::new();
    t.insert("quantity".into(), toml::Value::String(quantity));
    if item.id != default_id(&item.name, location) {
        t.insert("id".into(), toml::Value::String(item.id.clone()));
    }
    if let Some(low) = item.low_stock_threshold {
        t.insert("low".into(), toml::Value::String(quantity_string(low, item.unit)));
    }
    if let Some(store) = &item.store_id {
        t.insert("store".into(), toml::Value::String(store.clone()));
    }
    if item.is_archived {
        t.insert("archived".into(), toml::Value::Boolean(true));
    }
    if let Some(original) = item.original_quantity {
        t.insert(
            "original".into(),
            toml::Value::String(quantity_string(original, item.unit)),
        );
    }
    toml::Value::Table(t)
}

/// Write an [`Inventory`] in TOML format
///
/// Items are grouped by location. An item whose name is repeated in the same
/// location can't be represented and is an error.
pub fn write(inventory: &Inventory, mut write: impl std::io::Write) -> std::io::Result<()> {
    let mut root = toml::value::Table::new();
    for item in inventory.iter() {
        let table = match &item.location {
            Some(location) => {
                let section = root
                    .entry(location.clone())
                    .or_insert_with(|| toml::Value::Table(Default::default()));
                match section {
                    toml::Value::Table(t) => t,
                    _ => return Err(invalid_data(format!("location '{location}' is also an item"))),
                }
            }
            None => &mut root,
        };
        if table.insert(item.name.clone(), item_value(item)).is_some() {
            return Err(invalid_data(format!("item '{}' is repeated", item.name)));
        }
    }

    let toml_string = toml::to_string_pretty(&toml::Value::Table(root))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    write.write_all(toml_string.as_bytes())
}

fn invalid_data(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}

/// Error generated by [`parse`].
#[derive(Debug, Error, PartialEq)]
pub enum PantryError {
    #[error("Error parsing input: {message}")]
    Parse { message: String },

    #[error("Item '{0}' has no quantity")]
    MissingQuantity(String),

    #[error("Invalid quantity in item '{item}'")]
    Quantity {
        item: String,
        #[source]
        source: QuantityParseError,
    },

    #[error("Attribute '{attribute}' in item '{item}' has the wrong type: {found}")]
    Attribute {
        item: String,
        attribute: String,
        found: &'static str,
    },

    #[error("Attribute '{attribute}' of '{item}' is in {unit}, which can't be converted to {expected}")]
    AttributeUnit {
        item: String,
        attribute: &'static str,
        unit: UnitTag,
        expected: UnitTag,
    },

    #[error(transparent)]
    Invalid(#[from] ReconcileError),
}
