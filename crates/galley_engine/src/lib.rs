//! # GALLEY Engine
//!
//! Crafting resolution and probabilistic outcome engine: the part of the
//! game with actual algorithmic structure.
//!
//! ## Design Principles
//!
//! 1. **Tables are configuration** - catalog, recipes, outcome overrides,
//!    and grade profiles load once from TOML and stay immutable
//! 2. **Validate once** - every referential-integrity rule is enforced at
//!    startup with an error naming the offending id; the runtime never
//!    trips over bad data
//! 3. **Integer money** - prices and multipliers use basis points; the only
//!    floats are probability-window widths
//! 4. **Deterministic prices** - sale multipliers derive from the item id
//!    alone, so prices survive reloads without persisted state
//!
//! ## Example
//!
//! ```rust,ignore
//! use galley_engine::{CookBonuses, Engine, EngineConfig, FileStore};
//!
//! let config = EngineConfig::from_path("data/galley.toml")?;
//! let mut engine = Engine::new(config, Box::new(FileStore::new("save/unlocks.toml")))?;
//!
//! match engine.find_recipe(rice, water) {
//!     Some(recipe) => {
//!         let result = engine.cook_dish(recipe.result, CookBonuses::default())?;
//!         engine.unlock(recipe.result)?;
//!     }
//!     None => {
//!         let result = engine.total_fail_result();
//!     }
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod outcome;
pub mod pricing;
pub mod recipe;

pub use catalog::{Grade, Item, ItemCatalog, ItemId};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use ledger::{FileStore, MemoryStore, UnlockLedger, UnlockStore};
pub use outcome::{
    CookBonuses, CookResult, GradeProfile, GradeTable, OutcomeClass, OutcomeClassifier,
    OutcomeEntry, OutcomeKind, OutcomeTable,
};
pub use pricing::{sell_multiplier_bp, PriceResolver};
pub use recipe::{pair_key, CraftStep, Recipe, RecipeBook, RecipeId};
