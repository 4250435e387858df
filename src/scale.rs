//! Support for recipe scaling
//!
//! Every quantity used by the engine goes through here first, scaled by
//! `servings / default_servings`.

use serde::{Deserialize, Serialize};

use crate::{
    error::ReconcileError, model::RecipeIngredient, normalize::Normalizer, quantity::Quantity,
    Recipe,
};

/// Configures the scaling target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTarget {
    servings: f64,
    default_servings: f64,
}

impl ScaleTarget {
    /// Creates a new [`ScaleTarget`].
    ///
    /// Both numbers of servings have to be finite and positive.
    pub fn new(servings: f64, default_servings: f64) -> Result<Self, ReconcileError> {
        if !(servings.is_finite() && servings > 0.0) {
            return Err(ReconcileError::InvalidServings(servings));
        }
        if !(default_servings.is_finite() && default_servings > 0.0) {
            return Err(ReconcileError::InvalidServings(default_servings));
        }
        Ok(Self {
            servings,
            default_servings,
        })
    }

    /// Wanted servings
    pub fn servings(&self) -> f64 {
        self.servings
    }

    /// Get the calculated scaling factor
    pub fn factor(&self) -> f64 {
        self.servings / self.default_servings
    }
}

/// An ingredient after scaling
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledIngredient<'a> {
    /// Ingredient definition
    pub ingredient: &'a RecipeIngredient,
    /// Normalized name
    pub key: String,
    /// Quantity for the target servings
    pub quantity: Quantity,
    /// Quantity for a single serving, in the same unit
    pub per_serving: f64,
}

/// A recipe scaled to a number of servings
///
/// Created with [`Recipe::scale_to_servings`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledRecipe<'a> {
    pub recipe: &'a Recipe,
    pub target: ScaleTarget,
    /// All the ingredients, in recipe order
    pub ingredients: Vec<ScaledIngredient<'a>>,
}

impl Recipe {
    /// Scale the recipe to a number of servings
    ///
    /// The recipe is validated first.
    pub fn scale_to_servings(
        &self,
        servings: f64,
        normalizer: &Normalizer,
    ) -> Result<ScaledRecipe<'_>, ReconcileError> {
        self.validate()?;
        let target = ScaleTarget::new(servings, self.default_servings)?;
        let factor = target.factor();
        let ingredients = self
            .ingredients
            .iter()
            .map(|ingredient| ScaledIngredient {
                ingredient,
                key: normalizer.normalize(&ingredient.name),
                quantity: ingredient.quantity().scale(factor),
                per_serving: ingredient.quantity / self.default_servings,
            })
            .collect();
        Ok(ScaledRecipe {
            recipe: self,
            target,
            ingredients,
        })
    }
}

impl<'a> ScaledRecipe<'a> {
    /// Ingredients that are not optional
    pub fn required(&self) -> impl Iterator<Item = &ScaledIngredient<'a>> {
        self.ingredients.iter().filter(|i| !i.ingredient.is_optional)
    }

    /// Required ingredients plus the optional ones selected
    ///
    /// `selected` are normalized keys of optional ingredients.
    pub fn with_optional<'s>(
        &'s self,
        selected: &'s [String],
    ) -> impl Iterator<Item = &'s ScaledIngredient<'a>> {
        self.ingredients
            .iter()
            .filter(move |i| !i.ingredient.is_optional || selected.contains(&i.key))
    }
}
