//! Deduct the ingredients of a prepared recipe from the inventory
//!
//! A preparation goes through these states:
//!
//! ```text
//! Validating ──> Committing ──> Committed
//!     │              │
//!     └──────────────┴────────> Rejected
//! ```
//!
//! It is all or nothing. When rejected, the returned inventory is the same
//! as the input one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    convert::UnitTag,
    error::ReconcileError,
    model::Inventory,
    quantity::Quantity,
    readiness::{check_ingredient, MissingIngredient, MissingReason, ReadinessResult},
    Reconciler, Recipe,
};

/// State of a preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "reason")]
pub enum PreparationState {
    /// Checking there is enough of everything
    Validating,
    /// Deducting on a working copy of the inventory
    Committing,
    /// Done, the updated inventory has the deductions
    Committed,
    /// Nothing was deducted
    Rejected(RejectionReason),
}

impl PreparationState {
    /// Checks if this is a final state
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Committed | Self::Rejected(_))
    }
}

/// Why a preparation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionReason {
    /// Some required ingredients are missing
    MissingIngredients,
    /// An ingredient could not be converted to the unit of its item
    IncompatibleUnits,
    /// More than one ingredient draws from the same item and together they
    /// need more than it has
    Overdrawn,
}

/// A problem found while preparing a recipe
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PreparationError {
    #[error("Not enough {ingredient}: need {needed}, have {}", fmt_available(.available))]
    #[serde(rename_all = "camelCase")]
    Insufficient {
        ingredient: String,
        needed: Quantity,
        available: Option<Quantity>,
    },

    #[error("No {ingredient} in the inventory: need {needed}")]
    #[serde(rename_all = "camelCase")]
    NotInInventory { ingredient: String, needed: Quantity },

    #[error("Can't use {ingredient}: need {needed}, but the inventory has it in {inventory_unit}")]
    #[serde(rename_all = "camelCase")]
    IncompatibleUnits {
        ingredient: String,
        needed: Quantity,
        inventory_unit: UnitTag,
    },

    #[error("Item '{item_id}' is overdrawn by {ingredient}: {remaining} would be left")]
    #[serde(rename_all = "camelCase")]
    Overdrawn {
        ingredient: String,
        item_id: String,
        remaining: Quantity,
    },
}

fn fmt_available(available: &Option<Quantity>) -> String {
    match available {
        Some(q) => q.to_string(),
        None => "none".to_string(),
    }
}

/// A single deduction from an inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deduction {
    /// Name as written in the recipe
    pub ingredient_name: String,
    pub item_id: String,
    /// Amount deducted, in the item unit
    pub amount_deducted: f64,
    /// Item unit
    pub unit: UnitTag,
    /// Quantity left in the item
    pub remaining_in_inventory: f64,
    /// The item ran out and was archived
    pub archived: bool,
}

/// Every deduction of a preparation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionRecord {
    pub success: bool,
    /// In recipe order. Empty if rejected.
    pub entries: Vec<Deduction>,
}

/// Outcome of [`Reconciler::prepare`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preparation {
    /// Final state, [`PreparationState::Committed`] or
    /// [`PreparationState::Rejected`]
    pub state: PreparationState,
    pub success: bool,
    /// New inventory snapshot
    pub updated_inventory: Inventory,
    pub record: DeductionRecord,
    /// Empty on success
    pub errors: Vec<PreparationError>,
    /// Readiness at the requested servings, computed while validating
    pub readiness: ReadinessResult,
}

impl Preparation {
    fn rejected(
        reason: RejectionReason,
        inventory: &Inventory,
        errors: Vec<PreparationError>,
        readiness: ReadinessResult,
    ) -> Self {
        tracing::warn!(?reason, errors = errors.len(), "preparation rejected");
        Self {
            state: PreparationState::Rejected(reason),
            success: false,
            updated_inventory: inventory.clone(),
            record: DeductionRecord::default(),
            errors,
            readiness,
        }
    }
}

fn missing_error(missing: &MissingIngredient) -> PreparationError {
    let needed = Quantity::new(missing.needed_quantity, missing.unit);
    let ingredient = missing.name.clone();
    match missing.reason {
        MissingReason::NotInInventory => PreparationError::NotInInventory { ingredient, needed },
        MissingReason::Insufficient => PreparationError::Insufficient {
            ingredient,
            needed,
            available: missing
                .available_quantity
                .map(|value| Quantity::new(value, missing.unit)),
        },
        MissingReason::IncompatibleUnits { inventory_unit } => PreparationError::IncompatibleUnits {
            ingredient,
            needed,
            inventory_unit,
        },
    }
}

impl Reconciler {
    /// Prepares a recipe, deducting its ingredients from the inventory
    ///
    /// Only required ingredients are deducted, scaled to `servings`. The
    /// preparation is rejected if any of them is missing, see
    /// [`Reconciler::analyze`], or if `servings` is more than
    /// [`max_possible_servings`](ReadinessResult::max_possible_servings).
    ///
    /// Each ingredient is deducted from the item that
    /// [`Inventory::find_compatible`] selects, converted to the item unit.
    /// When what is left in an item is within the configured epsilon of
    /// zero, the item is archived with quantity 0, remembering the quantity
    /// it had.
    ///
    /// The input inventory is never modified. Fails only if the recipe,
    /// inventory or servings are invalid.
    #[tracing::instrument(level = "debug", skip_all, fields(recipe = %recipe.name, servings = servings))]
    pub fn prepare(
        &self,
        recipe: &Recipe,
        servings: f64,
        inventory: &Inventory,
    ) -> Result<Preparation, ReconcileError> {
        let mut state = PreparationState::Validating;
        tracing::debug!(?state);

        let readiness = self.analyze(recipe, servings, inventory)?;
        let converter = self.converter();
        let scaled = recipe.scale_to_servings(servings, self.normalizer())?;
        let index = inventory.index(self.normalizer());

        if !readiness.is_ready() {
            let errors = readiness.missing_ingredients.iter().map(missing_error).collect();
            return Ok(Preparation::rejected(
                RejectionReason::MissingIngredients,
                inventory,
                errors,
                readiness,
            ));
        }

        if !readiness.max_possible_servings.allows(servings) {
            // every ingredient covers the request on its own, but a
            // fractional request goes over the whole servings possible
            let errors = scaled
                .required()
                .filter_map(|ingredient| {
                    let check = check_ingredient(ingredient, &index, converter);
                    if check.limit.allows(servings) {
                        return None;
                    }
                    Some(PreparationError::Insufficient {
                        ingredient: ingredient.ingredient.name.clone(),
                        needed: ingredient.quantity,
                        available: check
                            .available
                            .map(|value| Quantity::new(value, ingredient.quantity.unit)),
                    })
                })
                .collect();
            tracing::debug!(
                max = %readiness.max_possible_servings,
                "more servings than possible"
            );
            return Ok(Preparation::rejected(
                RejectionReason::MissingIngredients,
                inventory,
                errors,
                readiness,
            ));
        }

        state = PreparationState::Committing;
        tracing::debug!(?state);

        let epsilon = self.config().epsilon;
        let mut working = inventory.clone();
        let mut entries = Vec::new();

        for ingredient in scaled.required() {
            let needed = ingredient.quantity;
            if needed.value == 0.0 {
                continue;
            }
            let Some((idx, original)) = index.find_compatible(&ingredient.key, needed.unit, converter)
            else {
                // analyze found it, so this only happens with a broken index
                let errors = vec![PreparationError::NotInInventory {
                    ingredient: ingredient.ingredient.name.clone(),
                    needed,
                }];
                return Ok(Preparation::rejected(
                    RejectionReason::MissingIngredients,
                    inventory,
                    errors,
                    readiness,
                ));
            };

            let amount = match converter.convert(needed.value, needed.unit, original.unit) {
                Ok(amount) => amount,
                Err(_) => {
                    let errors = vec![PreparationError::IncompatibleUnits {
                        ingredient: ingredient.ingredient.name.clone(),
                        needed,
                        inventory_unit: original.unit,
                    }];
                    return Ok(Preparation::rejected(
                        RejectionReason::IncompatibleUnits,
                        inventory,
                        errors,
                        readiness,
                    ));
                }
            };

            let item = &mut working.items_mut()[idx];
            let remaining = item.quantity - amount;
            if remaining < -epsilon {
                let errors = vec![PreparationError::Overdrawn {
                    ingredient: ingredient.ingredient.name.clone(),
                    item_id: item.id.clone(),
                    remaining: Quantity::new(remaining, item.unit),
                }];
                return Ok(Preparation::rejected(
                    RejectionReason::Overdrawn,
                    inventory,
                    errors,
                    readiness,
                ));
            }

            let archived = remaining.abs() <= epsilon;
            if archived {
                item.archive(original.quantity);
            } else {
                item.quantity = remaining;
            }
            tracing::debug!(
                item = %item.id,
                amount,
                remaining = item.quantity,
                archived,
                "deducted"
            );

            entries.push(Deduction {
                ingredient_name: ingredient.ingredient.name.clone(),
                item_id: item.id.clone(),
                amount_deducted: amount,
                unit: item.unit,
                remaining_in_inventory: item.quantity,
                archived,
            });
        }

        state = PreparationState::Committed;
        tracing::debug!(?state, deductions = entries.len());

        Ok(Preparation {
            state,
            success: true,
            updated_inventory: working,
            record: DeductionRecord {
                success: true,
                entries,
            },
            errors: Vec::new(),
            readiness,
        })
    }
}
