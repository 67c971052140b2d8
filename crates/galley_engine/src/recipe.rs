//! # Recipe Graph
//!
//! Immutable index mapping an unordered pair of item ids to the single
//! recipe that produces a result item. Both the forward (pair -> result)
//! and reverse (result -> pair) indices are built once at load time.
//!
//! The recipe set forms a DAG from base ingredients up to the highest-tier
//! dishes. Acyclicity is enforced at load with Kahn's algorithm; the
//! post-order traversal in [`RecipeBook::crafting_steps`] additionally
//! carries a visited set so malformed data can never hang it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::{Item, ItemCatalog, ItemId};
use crate::error::{EngineError, EngineResult};

/// Unique identifier for a recipe.
pub type RecipeId = u32;

/// A rule mapping an unordered pair of inputs to one result item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe identifier.
    pub id: RecipeId,
    /// The item this recipe produces.
    pub result: ItemId,
    /// The two ingredients, in authoring order. Lookup is order-blind.
    pub inputs: [ItemId; 2],
}

/// One executable step of a crafting plan.
///
/// A step's inputs are guaranteed to be base items or the results of
/// earlier steps in the same plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CraftStep {
    /// The two ingredients consumed.
    pub inputs: [ItemId; 2],
    /// The item produced.
    pub result: ItemId,
}

/// Canonical key for an unordered pair: ids sorted ascending.
#[inline]
#[must_use]
pub fn pair_key(a: ItemId, b: ItemId) -> (ItemId, ItemId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// The recipe index.
#[derive(Debug, Default)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
    by_pair: HashMap<(ItemId, ItemId), usize>,
    by_result: HashMap<ItemId, usize>,
}

impl RecipeBook {
    /// Builds and validates the recipe index against a catalog.
    ///
    /// Referential integrity is settled here, once: every input and result
    /// must exist in the catalog, inputs must be tradable, no two recipes
    /// may share an unordered input pair, no item may have two producers,
    /// and the resulting graph must be acyclic. Grade regressions (a result
    /// graded below one of its inputs) are an authoring-rule violation and
    /// only logged.
    ///
    /// # Errors
    ///
    /// Returns the first integrity violation found, naming the offending
    /// recipe and item ids.
    pub fn from_recipes(recipes: Vec<Recipe>, catalog: &ItemCatalog) -> EngineResult<Self> {
        let mut by_pair = HashMap::with_capacity(recipes.len());
        let mut by_result = HashMap::with_capacity(recipes.len());

        for (index, recipe) in recipes.iter().enumerate() {
            let result_item = catalog
                .get(recipe.result)
                .ok_or(EngineError::UnknownRecipeItem {
                    recipe_id: recipe.id,
                    item_id: recipe.result,
                })?;

            for &input in &recipe.inputs {
                let input_item = catalog.get(input).ok_or(EngineError::UnknownRecipeItem {
                    recipe_id: recipe.id,
                    item_id: input,
                })?;
                if !input_item.tradable {
                    return Err(EngineError::InputNotTradable {
                        recipe_id: recipe.id,
                        item_id: input,
                    });
                }
                if result_item.grade < input_item.grade {
                    tracing::warn!(
                        recipe = recipe.id,
                        result = recipe.result,
                        input,
                        "recipe result is graded below one of its inputs"
                    );
                }
            }

            let key = pair_key(recipe.inputs[0], recipe.inputs[1]);
            if let Some(&prev) = by_pair.get(&key) {
                let prev_recipe: &Recipe = &recipes[prev];
                return Err(EngineError::DuplicatePair {
                    first: prev_recipe.id,
                    second: recipe.id,
                    a: key.0,
                    b: key.1,
                });
            }
            by_pair.insert(key, index);

            if let Some(&prev) = by_result.get(&recipe.result) {
                let prev_recipe: &Recipe = &recipes[prev];
                return Err(EngineError::DuplicateProducer {
                    item_id: recipe.result,
                    first: prev_recipe.id,
                    second: recipe.id,
                });
            }
            by_result.insert(recipe.result, index);
        }

        let book = Self {
            recipes,
            by_pair,
            by_result,
        };
        book.validate_acyclic()?;
        Ok(book)
    }

    /// Resolves the unordered pair to its recipe, if one exists.
    ///
    /// `find(a, b)` and `find(b, a)` are the same lookup. `None` means the
    /// combination is not a recipe - an expected, frequent outcome of
    /// player experimentation, never an error.
    #[must_use]
    pub fn find(&self, a: ItemId, b: ItemId) -> Option<&Recipe> {
        self.by_pair.get(&pair_key(a, b)).map(|&i| &self.recipes[i])
    }

    /// Reverse lookup: the recipe producing `result`, if any.
    #[must_use]
    pub fn find_by_result(&self, result: ItemId) -> Option<&Recipe> {
        self.by_result.get(&result).map(|&i| &self.recipes[i])
    }

    /// Whether an item is a base (leaf) ingredient: tradable with no
    /// producing recipe.
    #[must_use]
    pub fn is_base(&self, item: &Item) -> bool {
        item.tradable && !self.by_result.contains_key(&item.id)
    }

    /// Returns all recipes in authoring order.
    #[must_use]
    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Computes the ordered crafting plan for `target`.
    ///
    /// Depth-first post-order from the target: both inputs of a produced
    /// item are planned before the step that combines them, each item is
    /// visited at most once, and base items contribute no step. The last
    /// step always produces `target` itself (unless `target` is a base
    /// item, in which case the plan is empty).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] if an id is not in the catalog,
    /// or [`EngineError::UncraftableItem`] if a non-tradable item has no
    /// producing recipe. Both indicate table corruption that load-time
    /// validation rejects, so callers holding a validated engine never see
    /// them for catalog ids.
    pub fn crafting_steps(
        &self,
        target: ItemId,
        catalog: &ItemCatalog,
    ) -> EngineResult<Vec<CraftStep>> {
        let mut steps = Vec::new();
        let mut visited = HashSet::new();
        self.collect_steps(target, catalog, &mut visited, &mut steps)?;
        Ok(steps)
    }

    fn collect_steps(
        &self,
        id: ItemId,
        catalog: &ItemCatalog,
        visited: &mut HashSet<ItemId>,
        steps: &mut Vec<CraftStep>,
    ) -> EngineResult<()> {
        if !visited.insert(id) {
            return Ok(());
        }
        let item = catalog.require(id)?;
        match self.find_by_result(id) {
            Some(recipe) => {
                let inputs = recipe.inputs;
                for input in inputs {
                    self.collect_steps(input, catalog, visited, steps)?;
                }
                steps.push(CraftStep { inputs, result: id });
                Ok(())
            }
            None if item.tradable => Ok(()),
            None => Err(EngineError::UncraftableItem(id)),
        }
    }

    /// Validates that the item graph has no cycles using Kahn's algorithm.
    ///
    /// Edges run input -> result. If topological sorting cannot consume
    /// every produced item, the leftover with the smallest id names the
    /// cycle.
    fn validate_acyclic(&self) -> EngineResult<()> {
        let mut in_degree: HashMap<ItemId, usize> = HashMap::new();
        let mut consumers: HashMap<ItemId, Vec<ItemId>> = HashMap::new();

        for recipe in &self.recipes {
            in_degree.entry(recipe.result).or_insert(0);
            for &input in &recipe.inputs {
                in_degree.entry(input).or_insert(0);
                consumers.entry(input).or_default().push(recipe.result);
                *in_degree.entry(recipe.result).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<ItemId> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut sorted = 0usize;

        while let Some(id) = queue.pop_front() {
            sorted += 1;
            if let Some(results) = consumers.get(&id) {
                for &result in results {
                    if let Some(deg) = in_degree.get_mut(&result) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(result);
                        }
                    }
                }
            }
        }

        if sorted == in_degree.len() {
            Ok(())
        } else {
            let stuck = in_degree
                .iter()
                .filter(|(_, &deg)| deg > 0)
                .map(|(&id, _)| id)
                .min()
                .unwrap_or(0);
            Err(EngineError::CycleDetected(stuck))
        }
    }
}
