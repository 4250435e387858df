//! Generate a shopping list from several recipes
//!
//! Ingredients from every selected recipe are merged by normalized name into
//! entries. A contribution goes into the first entry with the same name whose
//! unit it converts into, so the same ingredient measured in mass and in
//! volume ends up in two entries. Then the stock on hand is subtracted and
//! only what is still needed is listed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    convert::UnitTag,
    error::ReconcileError,
    model::Inventory,
    quantity::Quantity,
    readiness::TOLERANCE,
    Reconciler, Recipe,
};

/// A recipe selected to be cooked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSelection {
    pub recipe: Recipe,
    pub servings: f64,
    /// Names of the optional ingredients to include
    ///
    /// Compared normalized with the recipe ingredient names.
    #[serde(default)]
    pub included_optional: Vec<String>,
}

impl RecipeSelection {
    pub fn new(recipe: Recipe, servings: f64) -> Self {
        Self {
            recipe,
            servings,
            included_optional: Vec::new(),
        }
    }

    /// Include an optional ingredient
    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.included_optional.push(name.into());
        self
    }
}

/// Contribution of a recipe to a [`ShoppingListItem`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSource {
    pub recipe_name: String,
    /// Scaled quantity, in the recipe unit
    pub quantity: f64,
    pub unit: UnitTag,
}

/// Something to buy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    /// Normalized ingredient name
    pub name: String,
    /// Shortfall after subtracting the stock on hand
    pub needed_quantity: f64,
    pub unit: UnitTag,
    /// Recipes that need this, in selection order
    pub recipe_sources: SmallVec<[RecipeSource; 2]>,
    /// Store of the first inventory item with this name that has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
}

impl ShoppingListItem {
    pub fn quantity(&self) -> Quantity {
        Quantity::new(self.needed_quantity, self.unit)
    }
}

/// List of things to buy
///
/// Created with [`Reconciler::aggregate`]. Items with the same name are
/// next to each other, in the order the name first appeared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShoppingListItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if there is nothing to buy
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All the entries for a normalized name
    pub fn get<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ShoppingListItem> {
        self.items.iter().filter(move |i| i.name == name)
    }
}

impl IntoIterator for ShoppingList {
    type Item = ShoppingListItem;

    type IntoIter = std::vec::IntoIter<ShoppingListItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ShoppingList {
    type Item = &'a ShoppingListItem;

    type IntoIter = std::slice::Iter<'a, ShoppingListItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

struct Entry {
    key: String,
    quantity: Quantity,
    sources: SmallVec<[RecipeSource; 2]>,
}

impl Reconciler {
    /// Builds the shopping list for the selected recipes
    ///
    /// Every selection is scaled to its servings. Optional ingredients are
    /// only listed when named in [`RecipeSelection::included_optional`].
    ///
    /// After merging, active inventory items with the entry name and a
    /// convertible unit are subtracted, in inventory order. Stock used for
    /// one entry is not available for the next. Entries whose shortfall is
    /// not above the configured epsilon are not listed.
    ///
    /// Fails only if a recipe, the inventory or some servings are invalid.
    #[tracing::instrument(level = "debug", skip_all, fields(recipes = selections.len()))]
    pub fn aggregate(
        &self,
        selections: &[RecipeSelection],
        inventory: &Inventory,
    ) -> Result<ShoppingList, ReconcileError> {
        inventory.validate()?;
        let normalizer = self.normalizer();
        let converter = self.converter();

        let mut entries: Vec<Entry> = Vec::new();
        let mut by_key: IndexMap<String, SmallVec<[usize; 1]>> = IndexMap::new();

        for selection in selections {
            let scaled = selection
                .recipe
                .scale_to_servings(selection.servings, normalizer)?;
            let selected: Vec<String> = selection
                .included_optional
                .iter()
                .map(|name| normalizer.normalize(name))
                .collect();

            for ingredient in scaled.with_optional(&selected) {
                let incoming = ingredient.quantity;
                let source = RecipeSource {
                    recipe_name: selection.recipe.name.clone(),
                    quantity: incoming.value,
                    unit: incoming.unit,
                };

                let slots = by_key.entry(ingredient.key.clone()).or_default();
                let merged = slots.iter().copied().find_map(|idx| {
                    let entry = &entries[idx];
                    entry
                        .quantity
                        .try_add(&incoming, converter)
                        .ok()
                        .map(|sum| (idx, sum))
                });

                match merged {
                    Some((idx, sum)) => {
                        tracing::debug!(key = %ingredient.key, unit = %sum.unit, "merged");
                        let entry = &mut entries[idx];
                        entry.quantity = sum;
                        entry.sources.push(source);
                    }
                    None => {
                        if !slots.is_empty() {
                            tracing::debug!(
                                key = %ingredient.key,
                                unit = %incoming.unit,
                                "no compatible entry, listing separately"
                            );
                        }
                        slots.push(entries.len());
                        entries.push(Entry {
                            key: ingredient.key.clone(),
                            quantity: incoming,
                            sources: SmallVec::from_elem(source, 1),
                        });
                    }
                }
            }
        }

        let index = inventory.index(normalizer);
        let mut stock: Vec<f64> = inventory
            .iter()
            .map(|item| if item.is_archived { 0.0 } else { item.quantity })
            .collect();

        let mut items = Vec::with_capacity(entries.len());
        for idx in by_key.values().flatten().copied() {
            let entry = &entries[idx];
            let unit = entry.quantity.unit;
            let mut remaining = entry.quantity.value;

            for (item_idx, item) in index.matching(&entry.key) {
                if remaining <= 0.0 {
                    break;
                }
                if item.is_archived || stock[item_idx] <= 0.0 {
                    continue;
                }
                let Ok(on_hand) = converter.convert(stock[item_idx], item.unit, unit) else {
                    continue;
                };
                if on_hand >= remaining - TOLERANCE * remaining.max(1.0) {
                    let used = converter
                        .convert(remaining, unit, item.unit)
                        .unwrap_or(stock[item_idx]);
                    stock[item_idx] = (stock[item_idx] - used).max(0.0);
                    remaining = 0.0;
                } else {
                    stock[item_idx] = 0.0;
                    remaining -= on_hand;
                }
            }

            if remaining <= self.config().epsilon {
                tracing::debug!(key = %entry.key, remaining, "covered by stock");
                continue;
            }

            let store_id = index
                .matching(&entry.key)
                .find_map(|(_, item)| item.store_id.clone());

            items.push(ShoppingListItem {
                name: entry.key.clone(),
                needed_quantity: remaining,
                unit,
                recipe_sources: entry.sources.clone(),
                store_id,
            });
        }

        Ok(ShoppingList { items })
    }
}

#[cfg(feature = "aisle")]
pub use categorized::*;

#[cfg(feature = "aisle")]
mod categorized {
    use super::*;
    use crate::aisle::AisleConf;

    /// Name of the category for items not in the aisle configuration
    pub const OTHER_CATEGORY: &str = "other";

    /// Shopping list split into categories.
    ///
    /// Obtained from [`ShoppingList::categorize`].
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct CategorizedShoppingList {
        /// Items per category, in the order of the aisle configuration
        pub categories: IndexMap<String, Vec<ShoppingListItem>>,
        /// Items with no category assigned
        pub other: Vec<ShoppingListItem>,
    }

    impl CategorizedShoppingList {
        /// Iterate over all categories. If [`Self::other`] is not empty, adds
        /// an `"other"` category at the end.
        pub fn iter(&self) -> impl Iterator<Item = (&str, &[ShoppingListItem])> {
            self.categories
                .iter()
                .map(|(name, items)| (name.as_str(), items.as_slice()))
                .chain(
                    Some((OTHER_CATEGORY, self.other.as_slice())).filter(|(_, l)| !l.is_empty()),
                )
        }
    }

    impl ShoppingList {
        /// Split this list into different categories.
        ///
        /// Items without category will be placed in `"other"`.
        pub fn categorize(self, aisle: &AisleConf) -> CategorizedShoppingList {
            let mut categorized = CategorizedShoppingList::default();
            for category in aisle.categories() {
                categorized
                    .categories
                    .insert(category.name.clone(), Vec::new());
            }
            for item in self.items {
                match aisle.category_of(&item.name) {
                    Some(category) => categorized
                        .categories
                        .entry(category.to_string())
                        .or_default()
                        .push(item),
                    None => categorized.other.push(item),
                }
            }
            categorized.categories.retain(|_, items| !items.is_empty());
            categorized
        }
    }
}
