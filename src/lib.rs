//! Ingredient reconciliation between recipes, a pantry inventory and
//! shopping lists.
//!
//! Given recipes, each with ingredients measured in some unit and written for
//! a number of servings, and an inventory of what is on hand, this crate:
//! - Checks how ready a recipe is and how many servings can be made with
//!   [`Reconciler::analyze`].
//! - Builds a single shopping list for several recipes with
//!   [`Reconciler::aggregate`].
//! - Deducts what a recipe uses from the inventory with
//!   [`Reconciler::prepare`].
//!
//! Also includes:
//! - Ingredient name normalization, see [`normalize`](mod@normalize).
//! - Unit conversion with a closed set of units, see [`convert`].
//! - A TOML pantry file format, see [`pantry`].
//! - An aisle configuration file to categorize shopping lists, see [`aisle`].
//!
//! Everything works on snapshots. Inputs are never modified and new
//! snapshots are returned, so persisting them is up to the caller.
//!
//! # Basic usage
//! If you just want to check a single recipe, see [`analyze`].
//!
//! To change the configuration, construct a reconciler yourself with
//! [`Reconciler::new`] or use [`Reconciler::default`].
//!
//! ```rust
//! # use pantry_reconcile::{Reconciler, ReconcileConfig, Converter};
//! // Create a reconciler
//! // (this is the default configuration)
//! let reconciler = Reconciler::new(ReconcileConfig::default(), Converter::default());
//! # assert_eq!(reconciler, Reconciler::default());
//! ```
//!
//! Then use it:
//!
//! ```rust
//! # use pantry_reconcile::*;
//! # use pantry_reconcile::convert::UnitTag;
//! # let reconciler = Reconciler::default();
//! let recipe = Recipe::new(
//!     "pancakes",
//!     4.0,
//!     vec![RecipeIngredient::new("flour", 2.0, UnitTag::Cup)],
//! );
//! let inventory = Inventory::from(vec![
//!     InventoryItem::new("1", "Flour", 1.0, UnitTag::Cup),
//! ]);
//!
//! let readiness = reconciler.analyze(&recipe, 4.0, &inventory)?;
//! assert_eq!(readiness.max_possible_servings, MaxServings::Finite(2));
//!
//! let preparation = reconciler.prepare(&recipe, 2.0, &inventory)?;
//! assert!(preparation.success);
//! assert!(preparation.updated_inventory.get("1").unwrap().is_archived);
//! # Ok::<(), ReconcileError>(())
//! ```

#![warn(rustdoc::broken_intra_doc_links, clippy::doc_markdown)]

#[cfg(doc)]
pub mod _features {
    //! This lib has 3 features, all enabled by default:
    //! - `bundled_units`. Includes a units file with the ratios of the mass
    //!   and volume units. The default [`Converter`](crate::convert::Converter)
    //!   uses them if this feature is enabled. Without it, only identity
    //!   conversions are possible unless another units file is loaded.
    //!
    //! - `pantry`. Enables the [`pantry`](crate::pantry) module.
    //!
    //! - `aisle`. Enables the [`aisle`](crate::aisle) module and
    //!   [`ShoppingList::categorize`](crate::ShoppingList::categorize).
}

#[cfg(feature = "aisle")]
pub mod aisle;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod normalize;
#[cfg(feature = "pantry")]
pub mod pantry;
pub mod prepare;
pub mod quantity;
pub mod readiness;
pub mod scale;
pub mod shopping_list;

use once_cell::sync::Lazy;

pub use config::ReconcileConfig;
pub use convert::Converter;
pub use error::ReconcileError;
pub use model::*;
pub use normalize::Normalizer;
pub use prepare::{Deduction, DeductionRecord, Preparation, PreparationError, PreparationState};
pub use quantity::Quantity;
pub use readiness::{MaxServings, MissingIngredient, MissingReason, ReadinessResult};
pub use scale::{ScaleTarget, ScaledRecipe};
pub use shopping_list::{RecipeSelection, RecipeSource, ShoppingList, ShoppingListItem};

/// The reconciliation engine
///
/// Bundles the [`Converter`] used to compare quantities, the [`Normalizer`]
/// used to match ingredient names and the rest of the [`ReconcileConfig`].
///
/// Building the converter takes some time, so you may want to create only
/// one and reuse it. It has no interior mutability and can be shared between
/// threads.
///
/// The 3 main methods are [`Reconciler::analyze`], [`Reconciler::aggregate`]
/// and [`Reconciler::prepare`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reconciler {
    config: ReconcileConfig,
    normalizer: Normalizer,
    converter: Converter,
}

impl Reconciler {
    /// Creates a new reconciler.
    ///
    /// The config is not validated, see [`Self::try_new`].
    pub fn new(config: ReconcileConfig, converter: Converter) -> Self {
        Self {
            normalizer: config.normalizer(),
            config,
            converter,
        }
    }

    /// Creates a new reconciler checking the config first
    pub fn try_new(
        config: ReconcileConfig,
        converter: Converter,
    ) -> Result<Self, config::ConfigError> {
        config.validate()?;
        Ok(Self::new(config, converter))
    }

    /// Get the reconciler inner converter
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Get the normalizer used to match names
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Normalize an ingredient name with this reconciler qualifiers
    pub fn normalize(&self, name: &str) -> String {
        self.normalizer.normalize(name)
    }

    /// Adds stock to a copy of the inventory
    ///
    /// See [`Inventory::restock`]. Returns the new snapshot and the id of the
    /// restocked item.
    #[tracing::instrument(level = "debug", skip_all, fields(ingredient = name, quantity = %quantity))]
    pub fn restock(
        &self,
        inventory: &Inventory,
        name: &str,
        quantity: Quantity,
    ) -> Result<(Inventory, String), ReconcileError> {
        inventory.validate()?;
        let mut updated = inventory.clone();
        let id = updated.restock(name, quantity, &self.normalizer, &self.converter)?;
        Ok((updated, id))
    }
}

static DEFAULT_RECONCILER: Lazy<Reconciler> = Lazy::new(Reconciler::default);

/// Normalize an ingredient name with the default qualifiers
///
/// See [`Normalizer::normalize`].
pub fn normalize(name: &str) -> String {
    DEFAULT_RECONCILER.normalize(name)
}

/// Analyze a recipe with the default [`Reconciler`]
///
/// The default reconciler is built once, on first use.
pub fn analyze(
    recipe: &Recipe,
    servings: f64,
    inventory: &Inventory,
) -> Result<ReadinessResult, ReconcileError> {
    DEFAULT_RECONCILER.analyze(recipe, servings, inventory)
}

/// Build a shopping list with the default [`Reconciler`]
pub fn aggregate(
    selections: &[RecipeSelection],
    inventory: &Inventory,
) -> Result<ShoppingList, ReconcileError> {
    DEFAULT_RECONCILER.aggregate(selections, inventory)
}

/// Prepare a recipe with the default [`Reconciler`]
pub fn prepare(
    recipe: &Recipe,
    servings: f64,
    inventory: &Inventory,
) -> Result<Preparation, ReconcileError> {
    DEFAULT_RECONCILER.prepare(recipe, servings, inventory)
}
