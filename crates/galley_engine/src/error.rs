//! # Engine Error Types
//!
//! Two families exist: configuration errors raised once while the static
//! tables are loaded and indexed, and the small set of runtime errors a
//! caller can trigger with an unknown id. "No recipe for this pair" is not
//! an error anywhere in this crate; it is an `Option::None`.

use thiserror::Error;

use crate::catalog::{Grade, ItemId};
use crate::recipe::RecipeId;

/// Errors that can occur in the crafting engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Config file could not be deserialized.
    #[error("config parse error: {0}")]
    Parse(String),

    /// Two catalog rows share the same item id.
    #[error("duplicate item id {0} in catalog")]
    DuplicateItem(ItemId),

    /// A recipe references an item id missing from the catalog.
    #[error("recipe {recipe_id} references unknown item {item_id}")]
    UnknownRecipeItem {
        /// The offending recipe.
        recipe_id: RecipeId,
        /// The id that is not in the catalog.
        item_id: ItemId,
    },

    /// A non-tradable item appears as a recipe input.
    #[error("recipe {recipe_id} uses non-tradable item {item_id} as an input")]
    InputNotTradable {
        /// The offending recipe.
        recipe_id: RecipeId,
        /// The dish-only item used as an ingredient.
        item_id: ItemId,
    },

    /// Two recipes share the same unordered input pair.
    #[error("recipes {first} and {second} share the input pair ({a}, {b})")]
    DuplicatePair {
        /// Recipe that registered the pair first.
        first: RecipeId,
        /// Recipe that tried to register it again.
        second: RecipeId,
        /// Lower input id of the pair.
        a: ItemId,
        /// Higher input id of the pair.
        b: ItemId,
    },

    /// An item is produced by more than one recipe.
    #[error("item {item_id} is produced by both recipe {first} and recipe {second}")]
    DuplicateProducer {
        /// The item with two producers.
        item_id: ItemId,
        /// First producing recipe.
        first: RecipeId,
        /// Second producing recipe.
        second: RecipeId,
    },

    /// A base (leaf) item has no fixed base price to anchor valuation.
    #[error("base item {0} has no base_price")]
    MissingBasePrice(ItemId),

    /// The recipe graph contains a cycle through the given item.
    #[error("cycle detected in recipe graph at item {0}")]
    CycleDetected(ItemId),

    /// No probability profile is configured for a grade.
    #[error("no grade profile configured for grade {0:?}")]
    MissingGradeProfile(Grade),

    /// An outcome entry references an item id missing from the catalog.
    #[error("outcome entry \"{name}\" references unknown item {item_id}")]
    UnknownOutcomeItem {
        /// The id that is not in the catalog.
        item_id: ItemId,
        /// Display name of the offending entry.
        name: String,
    },

    /// An outcome entry's weight is outside (0, 100].
    #[error("outcome entry \"{name}\" for item {item_id} has invalid weight {weight}")]
    InvalidOutcomeWeight {
        /// Item the entry belongs to.
        item_id: ItemId,
        /// Display name of the offending entry.
        name: String,
        /// The rejected weight.
        weight: f64,
    },

    /// An item's combined critical and fail probability leaves no room
    /// for a success window.
    #[error(
        "item {item_id}: critical {critical_total} + fail {fail_total} >= 100, \
         success window would be negative"
    )]
    InconsistentProbability {
        /// The offending item.
        item_id: ItemId,
        /// Sum of the item's critical weights (or grade default).
        critical_total: f64,
        /// Sum of the item's fail weights (or grade default).
        fail_total: f64,
    },

    /// A runtime lookup used an id that is not in the catalog.
    #[error("item not found: {0}")]
    UnknownItem(ItemId),

    /// Crafting-step traversal reached an id that is neither a base item
    /// nor any recipe's result. Load-time validation makes this unreachable
    /// for ids taken from the catalog.
    #[error("item {0} is neither a base item nor a recipe result")]
    UncraftableItem(ItemId),

    /// The unlock-ledger persistence collaborator failed.
    #[error("unlock store failure: {0}")]
    Storage(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
