//! Error type for the reconciliation engine
//!
//! Missing ingredients and incompatible units are not errors, they are
//! reported as data in the results. These errors are invariant violations in
//! the input and the call is rejected before doing any work.

use thiserror::Error;

/// Invalid input to the engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("Recipe '{recipe}' has an invalid number of default servings: {value}")]
    InvalidDefaultServings { recipe: String, value: f64 },

    #[error("Invalid number of servings requested: {0}")]
    InvalidServings(f64),

    #[error("Ingredient '{ingredient}' in recipe '{recipe}' has an invalid quantity: {value}")]
    InvalidIngredientQuantity {
        recipe: String,
        ingredient: String,
        value: f64,
    },

    #[error("Inventory item '{id}' has an invalid quantity: {value}")]
    InvalidItemQuantity { id: String, value: f64 },

    #[error("Inventory item '{id}' has an invalid low stock threshold: {value}")]
    InvalidThreshold { id: String, value: f64 },

    #[error("Inventory item id '{0}' is duplicated")]
    DuplicateItemId(String),
}

/// Checks that a value can be used as an amount
pub(crate) fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
