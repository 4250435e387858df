//! Recipe and inventory representation
//!
//! These are the snapshots handed over by the persistence layer. All of them
//! (de)serialize with `camelCase` fields.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    convert::{Converter, UnitTag},
    error::{is_valid_amount, ReconcileError},
    normalize::Normalizer,
    quantity::Quantity,
};

/// A recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe name
    pub name: String,
    /// Number of servings the ingredient quantities are written for
    pub default_servings: f64,
    /// All the ingredients
    pub ingredients: Vec<RecipeIngredient>,
}

/// An ingredient of a [`Recipe`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: UnitTag,
    /// Optional ingredients are only used when explicitly selected
    #[serde(default)]
    pub is_optional: bool,
}

impl RecipeIngredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: UnitTag) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit,
            is_optional: false,
        }
    }

    /// Same ingredient, but optional
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    pub fn quantity(&self) -> Quantity {
        Quantity::new(self.quantity, self.unit)
    }
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        default_servings: f64,
        ingredients: Vec<RecipeIngredient>,
    ) -> Self {
        Self {
            name: name.into(),
            default_servings,
            ingredients,
        }
    }

    /// Check the invariants of the recipe
    ///
    /// Default servings must be positive and every quantity finite and not
    /// negative.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if !(self.default_servings.is_finite() && self.default_servings > 0.0) {
            return Err(ReconcileError::InvalidDefaultServings {
                recipe: self.name.clone(),
                value: self.default_servings,
            });
        }
        for igr in &self.ingredients {
            if !is_valid_amount(igr.quantity) {
                return Err(ReconcileError::InvalidIngredientQuantity {
                    recipe: self.name.clone(),
                    ingredient: igr.name.clone(),
                    value: igr.quantity,
                });
            }
        }
        Ok(())
    }

    /// Iterate over the ingredients that are not optional
    pub fn required_ingredients(&self) -> impl Iterator<Item = &RecipeIngredient> {
        self.ingredients.iter().filter(|i| !i.is_optional)
    }
}

/// An item in the user inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: UnitTag,
    /// Archived items are kept, with quantity 0, after running out
    #[serde(default)]
    pub is_archived: bool,
    /// The item is low on stock when its quantity is at or below this, in
    /// the item unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<f64>,
    /// Store where the item is usually bought
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    /// Where the item is kept, like `fridge`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Quantity the item had before it was archived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_quantity: Option<f64>,
}

impl InventoryItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: f64, unit: UnitTag) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
            unit,
            is_archived: false,
            low_stock_threshold: None,
            store_id: None,
            location: None,
            original_quantity: None,
        }
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn quantity(&self) -> Quantity {
        Quantity::new(self.quantity, self.unit)
    }

    /// Check if the item is low on stock
    ///
    /// Archived items are not low, they are out. Items without threshold are
    /// never low.
    pub fn is_low_stock(&self) -> bool {
        match self.low_stock_threshold {
            Some(threshold) if !self.is_archived => self.quantity <= threshold,
            _ => false,
        }
    }

    /// Archive the item, remembering the quantity it had
    pub(crate) fn archive(&mut self, original_quantity: f64) {
        self.quantity = 0.0;
        self.is_archived = true;
        self.original_quantity = Some(original_quantity);
    }
}

/// Snapshot of the user inventory
///
/// The order of the items is kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl From<Vec<InventoryItem>> for Inventory {
    fn from(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }
}

impl FromIterator<InventoryItem> for Inventory {
    fn from_iter<T: IntoIterator<Item = InventoryItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Inventory {
    type Item = InventoryItem;

    type IntoIter = std::vec::IntoIter<InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl Inventory {
    /// Empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [InventoryItem] {
        &mut self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by its id
    pub fn get(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Add a new item at the end
    pub fn push(&mut self, item: InventoryItem) {
        self.items.push(item)
    }

    /// Check the invariants of the inventory
    ///
    /// Ids must be unique and quantities and thresholds finite and not
    /// negative.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        let mut ids = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.insert(item.id.as_str()) {
                return Err(ReconcileError::DuplicateItemId(item.id.clone()));
            }
            if !is_valid_amount(item.quantity) {
                return Err(ReconcileError::InvalidItemQuantity {
                    id: item.id.clone(),
                    value: item.quantity,
                });
            }
            if let Some(threshold) = item.low_stock_threshold {
                if !is_valid_amount(threshold) {
                    return Err(ReconcileError::InvalidThreshold {
                        id: item.id.clone(),
                        value: threshold,
                    });
                }
            }
        }
        Ok(())
    }

    /// All the items low on stock
    pub fn low_stock_items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|i| i.is_low_stock())
    }

    /// First item with the name, preferring active ones
    ///
    /// `name` is normalized before the lookup.
    pub fn find(&self, name: &str, normalizer: &Normalizer) -> Option<&InventoryItem> {
        let key = normalizer.normalize(name);
        self.index(normalizer).find(&key).map(|(_, item)| item)
    }

    /// Item to use for `name` measured in `unit`
    ///
    /// See [`InventoryIndex::find_compatible`].
    pub fn find_compatible(
        &self,
        name: &str,
        unit: UnitTag,
        normalizer: &Normalizer,
        converter: &Converter,
    ) -> Option<&InventoryItem> {
        let key = normalizer.normalize(name);
        self.index(normalizer)
            .find_compatible(&key, unit, converter)
            .map(|(_, item)| item)
    }

    /// Add stock of an ingredient
    ///
    /// The quantity is added into the item that [`Self::find_compatible`]
    /// selects, converted to the item unit. An archived item is reactivated
    /// and forgets its original quantity. When no item with that name can
    /// take the unit, a new one is created with an id derived from the
    /// normalized name.
    ///
    /// Returns the id of the restocked item.
    pub fn restock(
        &mut self,
        name: &str,
        quantity: Quantity,
        normalizer: &Normalizer,
        converter: &Converter,
    ) -> Result<String, ReconcileError> {
        let key = normalizer.normalize(name);
        if !is_valid_amount(quantity.value) {
            return Err(ReconcileError::InvalidItemQuantity {
                id: key,
                value: quantity.value,
            });
        }

        let target = self
            .index(normalizer)
            .find_compatible(&key, quantity.unit, converter)
            .and_then(|(idx, item)| {
                converter
                    .convert(quantity.value, quantity.unit, item.unit)
                    .ok()
                    .map(|amount| (idx, amount))
            });

        if let Some((idx, amount)) = target {
            let item = &mut self.items[idx];
            item.quantity += amount;
            if item.is_archived {
                tracing::debug!(id = %item.id, "reactivating archived item");
                item.is_archived = false;
                item.original_quantity = None;
            }
            return Ok(item.id.clone());
        }

        let id = self.unused_id(&key);
        tracing::debug!(%id, "new inventory item");
        self.items
            .push(InventoryItem::new(id.clone(), name.trim(), quantity.value, quantity.unit));
        Ok(id)
    }

    fn unused_id(&self, base: &str) -> String {
        let taken = |id: &str| self.items.iter().any(|i| i.id == id);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|id| !taken(id))
            .unwrap_or_else(|| base.to_string())
    }

    /// Build a lookup index by normalized name
    pub fn index<'a>(&'a self, normalizer: &Normalizer) -> InventoryIndex<'a> {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, item) in self.items.iter().enumerate() {
            by_name
                .entry(normalizer.normalize(&item.name))
                .or_default()
                .push(idx);
        }
        InventoryIndex {
            inventory: self,
            by_name,
        }
    }
}

/// Lookup of [`Inventory`] items by normalized name
///
/// Obtained from [`Inventory::index`]. Keys must already be normalized with
/// the same [`Normalizer`].
#[derive(Debug)]
pub struct InventoryIndex<'a> {
    inventory: &'a Inventory,
    by_name: HashMap<String, Vec<usize>>,
}

impl<'a> InventoryIndex<'a> {
    /// Position and item of all the items with a name, in inventory order
    pub fn matching<'s>(
        &'s self,
        key: &str,
    ) -> impl Iterator<Item = (usize, &'a InventoryItem)> + 's {
        let inventory = self.inventory;
        self.by_name
            .get(key)
            .into_iter()
            .flatten()
            .map(move |&idx| (idx, &inventory.items[idx]))
    }

    /// Checks if there is any item, archived or not, with the name
    pub fn contains(&self, key: &str) -> bool {
        self.by_name.contains_key(key)
    }

    /// The first item with the name, preferring active ones
    pub fn find(&self, key: &str) -> Option<(usize, &'a InventoryItem)> {
        self.matching(key)
            .min_by_key(|(_, item)| item.is_archived)
    }

    /// The item to use for an ingredient measured in `unit`
    ///
    /// When more than one item has the same name, the first one in this order
    /// is selected:
    /// 1. active and convertible to `unit`
    /// 2. active
    /// 3. archived and convertible to `unit`
    /// 4. archived
    pub fn find_compatible(
        &self,
        key: &str,
        unit: UnitTag,
        converter: &Converter,
    ) -> Option<(usize, &'a InventoryItem)> {
        self.matching(key).min_by_key(|(_, item)| {
            let incompatible = !converter.is_convertible(item.unit, unit);
            (item.is_archived, incompatible)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory() -> Inventory {
        Inventory::from(vec![
            InventoryItem::new("1", "Flour", 500.0, UnitTag::Gram),
            InventoryItem::new("2", "milk", 1.0, UnitTag::Litre),
            InventoryItem::new("3", "Fresh Milk", 2.0, UnitTag::Bottle),
            InventoryItem::new("4", "eggs", 6.0, UnitTag::Unitless).with_threshold(6.0),
        ])
    }

    #[test]
    fn index_by_normalized_name() {
        let inv = inventory();
        let normalizer = Normalizer::default();
        let index = inv.index(&normalizer);
        assert!(index.contains("flour"));
        assert_eq!(index.matching("milk").count(), 2);
        assert_eq!(index.find("milk").unwrap().1.id, "2");
        assert!(index.find("butter").is_none());
    }

    #[test]
    fn find_compatible_prefers_unit() {
        let inv = inventory();
        let normalizer = Normalizer::default();
        let converter = Converter::bundled();
        let index = inv.index(&normalizer);
        let (_, item) = index
            .find_compatible("milk", UnitTag::Bottle, &converter)
            .unwrap();
        assert_eq!(item.id, "3");
        let (_, item) = index
            .find_compatible("milk", UnitTag::Cup, &converter)
            .unwrap();
        assert_eq!(item.id, "2");
        // no compatible, first active
        let (_, item) = index
            .find_compatible("milk", UnitTag::Gram, &converter)
            .unwrap();
        assert_eq!(item.id, "2");
    }

    #[test]
    fn find_prefers_active() {
        let mut inv = inventory();
        inv.items_mut()[1].archive(1.0);
        let normalizer = Normalizer::default();
        let converter = Converter::bundled();
        let index = inv.index(&normalizer);
        assert_eq!(index.find("milk").unwrap().1.id, "3");
        // an active item in another unit wins over an archived compatible one
        let (_, item) = index
            .find_compatible("milk", UnitTag::Cup, &converter)
            .unwrap();
        assert_eq!(item.id, "3");
    }

    #[test]
    fn validate() {
        assert!(inventory().validate().is_ok());

        let mut dup = inventory();
        dup.push(InventoryItem::new("1", "salt", 1.0, UnitTag::Gram));
        assert_eq!(
            dup.validate(),
            Err(ReconcileError::DuplicateItemId("1".into()))
        );

        let negative = Inventory::from(vec![InventoryItem::new("x", "salt", -1.0, UnitTag::Gram)]);
        assert!(matches!(
            negative.validate(),
            Err(ReconcileError::InvalidItemQuantity { .. })
        ));

        let recipe = Recipe::new("bad", 0.0, vec![]);
        assert!(matches!(
            recipe.validate(),
            Err(ReconcileError::InvalidDefaultServings { .. })
        ));

        let recipe = Recipe::new(
            "bad",
            2.0,
            vec![RecipeIngredient::new("salt", f64::NAN, UnitTag::Gram)],
        );
        assert!(matches!(
            recipe.validate(),
            Err(ReconcileError::InvalidIngredientQuantity { .. })
        ));
    }

    #[test]
    fn low_stock() {
        let mut inv = inventory();
        let low: Vec<_> = inv.low_stock_items().map(|i| i.id.as_str()).collect();
        assert_eq!(low, ["4"]);
        inv.items_mut()[3].archive(6.0);
        assert_eq!(inv.low_stock_items().count(), 0);
    }

    #[test]
    fn find_by_name() {
        let inv = inventory();
        let normalizer = Normalizer::default();
        let converter = Converter::bundled();
        assert_eq!(inv.find("FLOUR", &normalizer).unwrap().id, "1");
        assert_eq!(inv.find("chopped eggs", &normalizer).unwrap().id, "4");
        assert!(inv.find("butter", &normalizer).is_none());
        let item = inv
            .find_compatible("milk", UnitTag::Bottle, &normalizer, &converter)
            .unwrap();
        assert_eq!(item.id, "3");
    }

    #[test]
    fn restock() {
        let normalizer = Normalizer::default();
        let converter = Converter::bundled();
        let mut inv = inventory();
        inv.items_mut()[0].archive(500.0);

        let id = inv
            .restock("flour", Quantity::new(1.0, UnitTag::Kilogram), &normalizer, &converter)
            .unwrap();
        assert_eq!(id, "1");
        let flour = inv.get("1").unwrap();
        assert_eq!(flour.quantity, 1000.0);
        assert!(!flour.is_archived);
        assert_eq!(flour.original_quantity, None);

        // incompatible with the existing flour, so a new item
        let id = inv
            .restock("Flour", Quantity::new(2.0, UnitTag::Bag), &normalizer, &converter)
            .unwrap();
        assert_eq!(id, "flour");
        assert_eq!(inv.len(), 5);
        let id = inv
            .restock("flour", Quantity::new(1.0, UnitTag::Cup), &normalizer, &converter)
            .unwrap();
        assert_eq!(id, "flour-2");

        let id = inv
            .restock("butter", Quantity::new(250.0, UnitTag::Gram), &normalizer, &converter)
            .unwrap();
        assert_eq!(id, "butter");
        assert_eq!(inv.get("butter").unwrap().quantity, 250.0);

        assert!(matches!(
            inv.restock("salt", Quantity::new(f64::NAN, UnitTag::Gram), &normalizer, &converter),
            Err(ReconcileError::InvalidItemQuantity { .. })
        ));
    }

    #[test]
    fn json_shape() {
        let json = r#"[
            { "id": "a", "name": "rice", "quantity": 2, "unit": "kg", "storeId": "market" },
            { "id": "b", "name": "beans", "quantity": 0, "unit": "can", "isArchived": true, "originalQuantity": 3 }
        ]"#;
        let inv: Inventory = serde_json::from_str(json).unwrap();
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.items()[0].store_id.as_deref(), Some("market"));
        assert_eq!(inv.items()[0].unit, UnitTag::Kilogram);
        assert!(inv.items()[1].is_archived);
        assert_eq!(inv.items()[1].original_quantity, Some(3.0));

        let back = serde_json::to_value(&inv).unwrap();
        assert_eq!(back[0]["storeId"], "market");
        assert!(back[0].get("originalQuantity").is_none());
    }
}
