//! # Engine Context
//!
//! One explicit object owning every table and every piece of runtime
//! state: catalog, recipe index, grade profiles, outcome overrides, price
//! caches, the shared roll source, and the unlock ledger. Constructed once
//! from a validated [`EngineConfig`] plus a persistence collaborator, and
//! trivially instantiable per test - there is no module-level state
//! anywhere in this crate.

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::{Item, ItemCatalog, ItemId};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{UnlockLedger, UnlockStore};
use crate::outcome::{
    total_fail_result, CookBonuses, CookResult, GradeTable, OutcomeClassifier, OutcomeTable,
};
use crate::pricing::PriceResolver;
use crate::recipe::{CraftStep, Recipe, RecipeBook};

/// The crafting resolution and outcome engine.
pub struct Engine {
    catalog: ItemCatalog,
    book: RecipeBook,
    classifier: OutcomeClassifier,
    prices: PriceResolver,
    ledger: UnlockLedger,
    roll_rng: Mutex<ChaCha8Rng>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("items", &self.catalog.len())
            .field("recipes", &self.book.len())
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Builds the engine from parsed configuration and an unlock store.
    ///
    /// This is the single validation gate: referential integrity of every
    /// table is checked here, and a failure is fatal to startup. A
    /// successfully constructed engine never reports table corruption at
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns the first integrity violation, naming the offending id, or
    /// [`EngineError::Storage`] if the unlock store cannot be read.
    pub fn new(config: EngineConfig, store: Box<dyn UnlockStore>) -> EngineResult<Self> {
        Self::build(config, store, ChaCha8Rng::from_entropy())
    }

    /// Builds the engine with a fixed roll-source seed.
    ///
    /// Outcome rolls become reproducible; prices are deterministic
    /// regardless. Intended for tests and balance simulations.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::new`].
    pub fn with_roll_seed(
        config: EngineConfig,
        store: Box<dyn UnlockStore>,
        seed: u64,
    ) -> EngineResult<Self> {
        Self::build(config, store, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build(
        config: EngineConfig,
        store: Box<dyn UnlockStore>,
        roll_rng: ChaCha8Rng,
    ) -> EngineResult<Self> {
        let catalog = ItemCatalog::from_items(config.items)?;
        let book = RecipeBook::from_recipes(config.recipes, &catalog)?;

        // Every item must resolve to a base ingredient or a recipe chain,
        // and the leaves of that chain must carry fixed prices.
        for item in catalog.iter() {
            if book.find_by_result(item.id).is_none() {
                if !item.tradable {
                    return Err(EngineError::UncraftableItem(item.id));
                }
                if item.base_price.is_none() {
                    return Err(EngineError::MissingBasePrice(item.id));
                }
            }
        }

        let grades = GradeTable::from_map(config.grades)?;
        let table = OutcomeTable::from_entries(config.outcomes, &catalog, &grades)?;
        let classifier = OutcomeClassifier::new(grades, table);

        let seed: Vec<ItemId> = {
            let mut ids: Vec<ItemId> = catalog
                .iter()
                .filter(|item| book.is_base(item))
                .map(|item| item.id)
                .collect();
            ids.sort_unstable();
            ids
        };
        let ledger = UnlockLedger::open(seed, store)?;

        tracing::info!(
            items = catalog.len(),
            recipes = book.len(),
            unlocked = ledger.len(),
            "engine tables loaded and validated"
        );

        Ok(Self {
            catalog,
            book,
            classifier,
            prices: PriceResolver::new(),
            ledger,
            roll_rng: Mutex::new(roll_rng),
        })
    }

    /// The item catalog.
    #[must_use]
    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// Looks up an item by id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for unregistered ids.
    pub fn item(&self, id: ItemId) -> EngineResult<&Item> {
        self.catalog.require(id)
    }

    /// Resolves an unordered pair of ingredients to a recipe, order-blind.
    /// `None` means the combination is not a recipe; the caller decides
    /// whether that is a "nothing here" or a total failure.
    #[must_use]
    pub fn find_recipe(&self, a: ItemId, b: ItemId) -> Option<&Recipe> {
        self.book.find(a, b)
    }

    /// Reverse lookup: the recipe producing `result`, if any.
    #[must_use]
    pub fn find_recipe_by_result(&self, result: ItemId) -> Option<&Recipe> {
        self.book.find_by_result(result)
    }

    /// Ordered crafting plan from base ingredients up to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for ids outside the catalog.
    pub fn crafting_steps(&self, target: ItemId) -> EngineResult<Vec<CraftStep>> {
        self.book.crafting_steps(target, &self.catalog)
    }

    /// Acquisition cost of an item. Memoized for the process lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for ids outside the catalog.
    pub fn calculate_buy_price(&self, id: ItemId) -> EngineResult<u32> {
        self.prices.buy_price(id, &self.catalog, &self.book)
    }

    /// Sale value of an item. Deterministic across reloads.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for ids outside the catalog.
    pub fn calculate_sell_price(&self, id: ItemId) -> EngineResult<u32> {
        self.prices.sell_price(id, &self.catalog, &self.book)
    }

    /// Grades one cooking attempt for the given dish.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for ids outside the catalog.
    /// Never errors for a registered item.
    pub fn cook_dish(&self, id: ItemId, bonuses: CookBonuses) -> EngineResult<CookResult> {
        let item = self.catalog.require(id)?;
        let sell_price = self.calculate_sell_price(id)?;
        let mut rng = self.roll_rng.lock();
        Ok(self.classifier.cook(item, sell_price, bonuses, &mut *rng))
    }

    /// The always-available total-failure result for attempts with no
    /// valid recipe. Sale value is always zero; no probability table is
    /// consulted.
    #[must_use]
    pub fn total_fail_result(&self) -> CookResult {
        let mut rng = self.roll_rng.lock();
        total_fail_result(&mut *rng)
    }

    /// Marks an item as discovered and persists the ledger. Idempotent;
    /// returns whether the item was newly unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if persisting fails.
    pub fn unlock(&mut self, id: ItemId) -> EngineResult<bool> {
        self.ledger.unlock(id)
    }

    /// Whether the player has discovered the item.
    #[must_use]
    pub fn is_unlocked(&self, id: ItemId) -> bool {
        self.ledger.is_unlocked(id)
    }

    /// Sorted snapshot of all discovered item ids.
    #[must_use]
    pub fn unlocked_items(&self) -> Vec<ItemId> {
        self.ledger.list()
    }

    /// Clears all discovery progress back to the base-tier seed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if persisting fails.
    pub fn reset_unlocks(&mut self) -> EngineResult<()> {
        self.ledger.reset()
    }
}
