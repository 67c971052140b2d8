//! # Price Resolver
//!
//! Derives acquisition cost and sale value for every item from the base
//! ingredients upward. All arithmetic is integer: the crafting discount and
//! the sale multiplier are expressed in basis points (10000 = 100%).
//!
//! Both prices are pure functions of the immutable tables, so results are
//! memoized for the process lifetime. Evaluation walks the topological
//! order produced by the recipe graph instead of recursing, which bounds
//! stack usage on deep crafting chains.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hasher;

use siphasher::sip::SipHasher24;

use crate::catalog::{ItemCatalog, ItemId};
use crate::error::{EngineError, EngineResult};
use crate::recipe::RecipeBook;

/// Crafting discount applied to the summed ingredient cost, in basis points.
const BUY_DISCOUNT_BP: u64 = 9_000;

/// Lower bound of the sale multiplier, in basis points (2.0x).
const SELL_MULT_FLOOR_BP: u64 = 20_000;

/// Width of the sale multiplier band, in basis points (up to but excluding 3.0x).
const SELL_MULT_SPAN_BP: u64 = 10_000;

/// Fixed SipHash-2-4 keys for the sale multiplier.
///
/// These are part of the pricing contract: any implementation hashing the
/// same item id with these keys reproduces the same multiplier, so prices
/// survive reloads with no persisted seed state.
const SELL_HASH_KEYS: (u64, u64) = (0x6761_6c6c_6579_5f70, 0x7269_6365_5f76_3031);

/// Rounds to the nearest multiple of ten, halves up.
#[inline]
#[must_use]
const fn round_to_ten(value: u64) -> u32 {
    (((value + 5) / 10) * 10) as u32
}

/// Deterministic sale multiplier for an item id, in basis points.
///
/// Maps the SipHash of the id into `[20_000, 30_000)`, i.e. 2.0x to 3.0x.
#[inline]
#[must_use]
pub fn sell_multiplier_bp(id: ItemId) -> u64 {
    let mut hasher = SipHasher24::new_with_keys(SELL_HASH_KEYS.0, SELL_HASH_KEYS.1);
    hasher.write_u32(id);
    SELL_MULT_FLOOR_BP + hasher.finish() % SELL_MULT_SPAN_BP
}

/// Memoizing resolver for buy and sell prices.
#[derive(Debug, Default)]
pub struct PriceResolver {
    buy_cache: Mutex<HashMap<ItemId, u32>>,
    sell_cache: Mutex<HashMap<ItemId, u32>>,
}

impl PriceResolver {
    /// Creates a resolver with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquisition cost of an item.
    ///
    /// Base items cost their fixed `base_price`. Non-tradable dishes cost 0;
    /// they can never be rebought as ingredients. A crafted ingredient costs
    /// the sum of its inputs' buy prices, discounted to 90% and rounded to
    /// the nearest ten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for ids absent from the catalog.
    /// Integrity failures below a known id are rejected at load time.
    pub fn buy_price(
        &self,
        id: ItemId,
        catalog: &ItemCatalog,
        book: &RecipeBook,
    ) -> EngineResult<u32> {
        if let Some(&price) = self.buy_cache.lock().get(&id) {
            return Ok(price);
        }

        let item = catalog.require(id)?;
        if !item.tradable {
            self.buy_cache.lock().insert(id, 0);
            return Ok(0);
        }

        let steps = book.crafting_steps(id, catalog)?;
        if steps.is_empty() {
            let price = item.base_price.ok_or(EngineError::MissingBasePrice(id))?;
            self.buy_cache.lock().insert(id, price);
            return Ok(price);
        }

        // Iterative fold in plan order: every input is either a base item
        // or an earlier step's result.
        let mut computed: HashMap<ItemId, u32> = HashMap::with_capacity(steps.len());
        for step in &steps {
            let mut cost = 0u64;
            for input in step.inputs {
                cost += u64::from(self.leaf_or_computed(input, &computed, catalog)?);
            }
            let price = round_to_ten(cost * BUY_DISCOUNT_BP / 10_000);
            computed.insert(step.result, price);
        }

        let price = computed[&id];
        self.buy_cache.lock().extend(computed);
        Ok(price)
    }

    /// Sale value of an item.
    ///
    /// An explicit catalog `sell_price` wins outright. An item with no
    /// producing recipe sells for twice its base price. A crafted item
    /// sells for its ingredient cost scaled by the id-derived multiplier
    /// from [`sell_multiplier_bp`], rounded to the nearest ten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] for ids absent from the catalog.
    pub fn sell_price(
        &self,
        id: ItemId,
        catalog: &ItemCatalog,
        book: &RecipeBook,
    ) -> EngineResult<u32> {
        if let Some(&price) = self.sell_cache.lock().get(&id) {
            return Ok(price);
        }

        let item = catalog.require(id)?;
        let price = if let Some(fixed) = item.sell_price {
            fixed
        } else if let Some(recipe) = book.find_by_result(id) {
            let cost = u64::from(self.buy_price(recipe.inputs[0], catalog, book)?)
                + u64::from(self.buy_price(recipe.inputs[1], catalog, book)?);
            round_to_ten(cost * sell_multiplier_bp(id) / 10_000)
        } else {
            let base = item.base_price.ok_or(EngineError::MissingBasePrice(id))?;
            base * 2
        };

        self.sell_cache.lock().insert(id, price);
        Ok(price)
    }

    fn leaf_or_computed(
        &self,
        id: ItemId,
        computed: &HashMap<ItemId, u32>,
        catalog: &ItemCatalog,
    ) -> EngineResult<u32> {
        if let Some(&price) = computed.get(&id) {
            return Ok(price);
        }
        if let Some(&price) = self.buy_cache.lock().get(&id) {
            return Ok(price);
        }
        catalog
            .require(id)?
            .base_price
            .ok_or(EngineError::MissingBasePrice(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Grade, Item};
    use crate::recipe::Recipe;

    fn item(id: ItemId, base_price: Option<u32>, tradable: bool) -> Item {
        Item {
            id,
            name: format!("item-{id}"),
            grade: Grade::F,
            tradable,
            base_price,
            sell_price: None,
        }
    }

    fn fixture() -> (ItemCatalog, RecipeBook) {
        let catalog = ItemCatalog::from_items(vec![
            item(1, Some(50), true),
            item(7, Some(40), true),
            item(101, None, true),
            item(102, None, false),
        ])
        .unwrap();
        let recipes = vec![
            Recipe { id: 1, result: 101, inputs: [1, 7] },
            Recipe { id: 2, result: 102, inputs: [101, 1] },
        ];
        let book = RecipeBook::from_recipes(recipes, &catalog).unwrap();
        (catalog, book)
    }

    #[test]
    fn test_buy_price_cascade() {
        let (catalog, book) = fixture();
        let resolver = PriceResolver::new();
        // (50 + 40) * 0.9 = 81, rounded to nearest ten.
        assert_eq!(resolver.buy_price(101, &catalog, &book).unwrap(), 80);
    }

    #[test]
    fn test_buy_price_base_item() {
        let (catalog, book) = fixture();
        let resolver = PriceResolver::new();
        assert_eq!(resolver.buy_price(1, &catalog, &book).unwrap(), 50);
    }

    #[test]
    fn test_buy_price_dish_is_zero() {
        let (catalog, book) = fixture();
        let resolver = PriceResolver::new();
        assert_eq!(resolver.buy_price(102, &catalog, &book).unwrap(), 0);
    }

    #[test]
    fn test_prices_deterministic() {
        let (catalog, book) = fixture();
        let resolver = PriceResolver::new();
        let buy1 = resolver.buy_price(101, &catalog, &book).unwrap();
        let sell1 = resolver.sell_price(101, &catalog, &book).unwrap();
        // Second pass hits the cache; a fresh resolver recomputes.
        assert_eq!(resolver.buy_price(101, &catalog, &book).unwrap(), buy1);
        assert_eq!(resolver.sell_price(101, &catalog, &book).unwrap(), sell1);
        let fresh = PriceResolver::new();
        assert_eq!(fresh.buy_price(101, &catalog, &book).unwrap(), buy1);
        assert_eq!(fresh.sell_price(101, &catalog, &book).unwrap(), sell1);
    }

    #[test]
    fn test_sell_price_base_is_double() {
        let (catalog, book) = fixture();
        let resolver = PriceResolver::new();
        assert_eq!(resolver.sell_price(1, &catalog, &book).unwrap(), 100);
        assert_eq!(resolver.sell_price(7, &catalog, &book).unwrap(), 80);
    }

    #[test]
    fn test_sell_price_within_multiplier_band() {
        let (catalog, book) = fixture();
        let resolver = PriceResolver::new();
        let cost = 50 + 40;
        let sell = resolver.sell_price(101, &catalog, &book).unwrap();
        // 2.0x..3.0x of cost, plus up to 5 from rounding to the nearest ten.
        assert!(sell >= cost * 2 - 5, "sell {sell} below multiplier band");
        assert!(sell < cost * 3 + 5, "sell {sell} above multiplier band");
        assert_eq!(sell % 10, 0, "sell price must land on a multiple of ten");
    }

    #[test]
    fn test_sell_multiplier_stable_per_id() {
        for id in [1u32, 7, 101, 9999] {
            let a = sell_multiplier_bp(id);
            let b = sell_multiplier_bp(id);
            assert_eq!(a, b);
            assert!((SELL_MULT_FLOOR_BP..SELL_MULT_FLOOR_BP + SELL_MULT_SPAN_BP).contains(&a));
        }
    }

    #[test]
    fn test_sell_price_override_wins() {
        let catalog = ItemCatalog::from_items(vec![Item {
            id: 5,
            name: "festival skewer".to_string(),
            grade: Grade::F,
            tradable: true,
            base_price: Some(30),
            sell_price: Some(777),
        }])
        .unwrap();
        let book = RecipeBook::from_recipes(Vec::new(), &catalog).unwrap();
        let resolver = PriceResolver::new();
        assert_eq!(resolver.sell_price(5, &catalog, &book).unwrap(), 777);
    }
}
