//! How ready a recipe is given the current inventory

use serde::{Deserialize, Serialize};

use crate::{
    convert::{Converter, UnitTag},
    error::ReconcileError,
    model::{Inventory, InventoryIndex},
    scale::ScaledIngredient,
    Reconciler, Recipe,
};

/// Float tolerance when comparing amounts that should be equal
///
/// This absorbs conversion noise only. It is much smaller than the
/// configured epsilon.
pub(crate) const TOLERANCE: f64 = 1e-9;

/// Result of [`Reconciler::analyze`]
///
/// Only non-optional ingredients are taken into account, and
/// `available_ingredients + missing_ingredients.len() == total_ingredients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResult {
    pub total_ingredients: usize,
    pub available_ingredients: usize,
    pub missing_ingredients: Vec<MissingIngredient>,
    pub max_possible_servings: MaxServings,
    /// `0..=100`
    pub completion_percentage: u8,
}

impl ReadinessResult {
    /// All the required ingredients are available
    pub fn is_ready(&self) -> bool {
        self.missing_ingredients.is_empty()
    }
}

/// An ingredient that is not available in the needed quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingIngredient {
    /// Name as written in the recipe
    pub name: String,
    /// Quantity needed for the requested servings
    pub needed_quantity: f64,
    pub unit: UnitTag,
    /// Quantity on hand, converted to [`Self::unit`]
    ///
    /// [`None`] when there is no item or it can't be converted.
    pub available_quantity: Option<f64>,
    pub reason: MissingReason,
}

/// Why an ingredient is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum MissingReason {
    /// No inventory item has this name
    NotInInventory,
    /// There is an item, but not enough
    Insufficient,
    /// There is an item, but in a unit that can't be converted
    #[serde(rename_all = "camelCase")]
    IncompatibleUnits { inventory_unit: UnitTag },
}

/// Maximum number of servings that can be made
///
/// Serialized as a plain number, or `null` when unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxServings {
    Finite(u32),
    /// No required ingredient limits the recipe
    Unlimited,
}

impl MaxServings {
    /// Checks if `servings` can be made
    pub fn allows(&self, servings: f64) -> bool {
        match self {
            MaxServings::Finite(max) => servings <= f64::from(*max),
            MaxServings::Unlimited => true,
        }
    }

    /// The finite value, if any
    pub fn as_finite(&self) -> Option<u32> {
        match self {
            MaxServings::Finite(n) => Some(*n),
            MaxServings::Unlimited => None,
        }
    }

    fn min(self, other: Self) -> Self {
        match (self, other) {
            (MaxServings::Finite(a), MaxServings::Finite(b)) => MaxServings::Finite(a.min(b)),
            (MaxServings::Unlimited, x) | (x, MaxServings::Unlimited) => x,
        }
    }
}

impl std::fmt::Display for MaxServings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxServings::Finite(n) => write!(f, "{n}"),
            MaxServings::Unlimited => write!(f, "∞"),
        }
    }
}

/// Availability of a single scaled ingredient
#[derive(Debug, Clone)]
pub(crate) struct IngredientCheck {
    /// Item quantity converted to the ingredient unit
    pub available: Option<f64>,
    pub missing: Option<MissingReason>,
    /// Servings this ingredient allows
    pub limit: MaxServings,
}

pub(crate) fn check_ingredient(
    ingredient: &ScaledIngredient,
    index: &InventoryIndex,
    converter: &Converter,
) -> IngredientCheck {
    let needed = ingredient.quantity;
    let Some((_, item)) = index.find_compatible(&ingredient.key, needed.unit, converter) else {
        return IngredientCheck {
            available: None,
            missing: Some(MissingReason::NotInInventory),
            limit: MaxServings::Finite(0),
        };
    };

    let available = match converter.convert(item.quantity, item.unit, needed.unit) {
        Ok(available) => available,
        Err(_) => {
            return IngredientCheck {
                available: None,
                missing: Some(MissingReason::IncompatibleUnits {
                    inventory_unit: item.unit,
                }),
                limit: MaxServings::Finite(0),
            };
        }
    };

    let missing = if is_enough(available, needed.value) {
        None
    } else {
        Some(MissingReason::Insufficient)
    };

    let limit = if ingredient.per_serving > 0.0 {
        let servings = (available / ingredient.per_serving) * (1.0 + TOLERANCE);
        // float to int casts saturate
        MaxServings::Finite(servings.floor() as u32)
    } else {
        MaxServings::Unlimited
    };

    IngredientCheck {
        available: Some(available),
        missing,
        limit,
    }
}

pub(crate) fn is_enough(available: f64, needed: f64) -> bool {
    available >= needed - TOLERANCE * needed.max(1.0)
}

impl Reconciler {
    /// Computes how ready a recipe is with the given inventory
    ///
    /// The recipe is scaled to `servings` and each non-optional ingredient is
    /// looked up in the inventory by normalized name.
    ///
    /// An ingredient is missing when there is no item for it, the item unit
    /// can't be converted to the ingredient unit, or there is not enough.
    ///
    /// The max possible servings is the minimum over all required
    /// ingredients of `floor(available / per_serving)`. An ingredient without
    /// item, or with an incompatible one, limits the recipe to 0 servings.
    /// A recipe without required ingredients has unlimited servings.
    ///
    /// Fails only if the recipe, inventory or servings are invalid.
    #[tracing::instrument(level = "debug", skip_all, fields(recipe = %recipe.name, servings = servings))]
    pub fn analyze(
        &self,
        recipe: &Recipe,
        servings: f64,
        inventory: &Inventory,
    ) -> Result<ReadinessResult, ReconcileError> {
        inventory.validate()?;
        let scaled = recipe.scale_to_servings(servings, self.normalizer())?;
        let index = inventory.index(self.normalizer());

        let mut total = 0;
        let mut available_count = 0;
        let mut missing_ingredients = Vec::new();
        let mut max = MaxServings::Unlimited;

        for ingredient in scaled.required() {
            total += 1;
            let check = check_ingredient(ingredient, &index, self.converter());
            max = max.min(check.limit);
            match check.missing {
                None => available_count += 1,
                Some(reason) => {
                    tracing::debug!(
                        ingredient = %ingredient.key,
                        ?reason,
                        needed = ingredient.quantity.value,
                        available = ?check.available,
                        "missing ingredient"
                    );
                    missing_ingredients.push(MissingIngredient {
                        name: ingredient.ingredient.name.clone(),
                        needed_quantity: ingredient.quantity.value,
                        unit: ingredient.quantity.unit,
                        available_quantity: check.available,
                        reason,
                    })
                }
            }
        }

        let completion_percentage = if total == 0 {
            100
        } else {
            (100.0 * available_count as f64 / total as f64).round() as u8
        };

        Ok(ReadinessResult {
            total_ingredients: total,
            available_ingredients: available_count,
            missing_ingredients,
            max_possible_servings: max,
            completion_percentage,
        })
    }
}
