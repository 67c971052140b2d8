//! # Engine Verification Tests
//!
//! End-to-end checks of the engine's contract over a realistic menu:
//!
//! 1. **Recipe resolution**: order-blind pair lookup, plan ordering
//! 2. **Valuation**: deterministic price cascade from base ingredients
//! 3. **Outcome windows**: statistical distribution and bonus monotonicity
//! 4. **Unlock ledger**: seeding, growth, reset
//!
//! Run with: cargo test --test engine_verification -- --nocapture

use std::collections::{HashMap, HashSet};

use galley_engine::{
    CookBonuses, Engine, EngineConfig, ItemId, MemoryStore, OutcomeClass,
};

/// A five-ingredient menu with two intermediate ingredients and three
/// dishes, deep enough to exercise multi-step plans.
const MENU: &str = r#"
    [[items]]
    id = 1
    name = "rice"
    grade = "G"
    tradable = true
    base_price = 50

    [[items]]
    id = 2
    name = "flour"
    grade = "G"
    tradable = true
    base_price = 30

    [[items]]
    id = 3
    name = "egg"
    grade = "G"
    tradable = true
    base_price = 20

    [[items]]
    id = 7
    name = "water"
    grade = "G"
    tradable = true
    base_price = 40

    [[items]]
    id = 8
    name = "oil"
    grade = "G"
    tradable = true
    base_price = 60

    [[items]]
    id = 101
    name = "rice dish"
    grade = "F"
    tradable = false

    [[items]]
    id = 110
    name = "dough"
    grade = "F"
    tradable = true

    [[items]]
    id = 111
    name = "batter"
    grade = "F"
    tradable = true

    [[items]]
    id = 120
    name = "fried noodles"
    grade = "E"
    tradable = false

    [[items]]
    id = 121
    name = "layer cake"
    grade = "D"
    tradable = false

    [[recipes]]
    id = 1
    result = 101
    inputs = [1, 7]

    [[recipes]]
    id = 2
    result = 110
    inputs = [2, 7]

    [[recipes]]
    id = 3
    result = 111
    inputs = [2, 3]

    [[recipes]]
    id = 4
    result = 120
    inputs = [110, 8]

    [[recipes]]
    id = 5
    result = 121
    inputs = [110, 111]

    [[outcomes]]
    item_id = 120
    kind = "critical"
    name = "Wok-kissed noodles"
    weight = 4.0
    price_multiplier = 2.5

    [[outcomes]]
    item_id = 120
    kind = "fail"
    name = "Oil-logged tangle"
    weight = 9.0
    price_multiplier = 0.3
    description = "Slick enough to light."

    [grades.G]
    critical_percent = 3.0
    fail_percent = 12.0
    critical_multiplier = 1.3
    fail_multiplier = 0.6

    [grades.F]
    critical_percent = 5.0
    fail_percent = 7.0
    critical_multiplier = 1.5
    fail_multiplier = 0.5

    [grades.E]
    critical_percent = 5.0
    fail_percent = 8.0
    critical_multiplier = 1.8
    fail_multiplier = 0.45

    [grades.D]
    critical_percent = 4.0
    fail_percent = 9.0
    critical_multiplier = 2.0
    fail_multiplier = 0.4

    [grades.C]
    critical_percent = 4.0
    fail_percent = 10.0
    critical_multiplier = 2.2
    fail_multiplier = 0.4

    [grades.B]
    critical_percent = 3.0
    fail_percent = 11.0
    critical_multiplier = 2.5
    fail_multiplier = 0.35

    [grades.A]
    critical_percent = 2.5
    fail_percent = 12.0
    critical_multiplier = 3.0
    fail_multiplier = 0.3

    [grades.R]
    critical_percent = 2.0
    fail_percent = 13.0
    critical_multiplier = 4.0
    fail_multiplier = 0.25
"#;

fn engine_with_seed(seed: u64) -> Engine {
    let config = EngineConfig::from_toml_str(MENU).expect("menu parses");
    Engine::with_roll_seed(config, Box::new(MemoryStore::new()), seed).expect("menu validates")
}

// ============================================================================
// RECIPE RESOLUTION
// ============================================================================

#[test]
fn verify_pair_lookup_is_order_independent() {
    let engine = engine_with_seed(1);
    for recipe in [(1, 7), (2, 7), (2, 3), (110, 8), (110, 111)] {
        let forward = engine.find_recipe(recipe.0, recipe.1).expect("recipe exists");
        let reversed = engine.find_recipe(recipe.1, recipe.0).expect("recipe exists");
        assert_eq!(forward.id, reversed.id);
    }
    assert!(engine.find_recipe(1, 1).is_none(), "rice + rice is not a recipe");
    assert!(engine.find_recipe(1, 8).is_none());
}

#[test]
fn verify_rice_and_water_make_rice_dish() {
    let engine = engine_with_seed(1);
    assert_eq!(engine.find_recipe(1, 7).unwrap().result, 101);
    assert_eq!(engine.find_recipe(7, 1).unwrap().result, 101);
    assert_eq!(engine.find_recipe_by_result(101).unwrap().inputs, [1, 7]);
}

#[test]
fn verify_crafting_plans_are_executable() {
    let engine = engine_with_seed(1);
    for target in [101u32, 110, 111, 120, 121] {
        let steps = engine.crafting_steps(target).unwrap();
        assert_eq!(
            steps.last().expect("non-base target has steps").result,
            target
        );

        // Each intermediate appears at most once, and every input is
        // available by the time its step runs.
        let mut produced: HashSet<ItemId> = HashSet::new();
        for step in &steps {
            for input in step.inputs {
                let available = produced.contains(&input)
                    || engine.find_recipe_by_result(input).is_none();
                assert!(available, "step for {} uses unproduced {input}", step.result);
            }
            assert!(produced.insert(step.result), "{} produced twice", step.result);
        }
    }
}

#[test]
fn verify_no_two_recipes_share_a_pair() {
    let engine = engine_with_seed(1);
    let mut seen: HashSet<(ItemId, ItemId)> = HashSet::new();
    for recipe in [(1u32, 7u32), (2, 7), (2, 3), (110, 8), (110, 111)] {
        let found = engine.find_recipe(recipe.0, recipe.1).unwrap();
        let key = galley_engine::pair_key(found.inputs[0], found.inputs[1]);
        assert!(seen.insert(key), "pair {key:?} resolved twice");
    }
}

// ============================================================================
// VALUATION
// ============================================================================

#[test]
fn verify_price_cascade_from_base_ingredients() {
    let engine = engine_with_seed(1);
    // rice 50 + water 40, discounted to 90% and rounded to the nearest ten.
    assert_eq!(engine.calculate_buy_price(101).unwrap(), 80);
    // dough: (30 + 40) * 0.9 = 63 -> 60
    assert_eq!(engine.calculate_buy_price(110).unwrap(), 60);
    // batter: (30 + 20) * 0.9 = 45 -> 50 (halves round up)
    assert_eq!(engine.calculate_buy_price(111).unwrap(), 50);
    // dishes cannot be rebought as ingredients
    assert_eq!(engine.calculate_buy_price(120).unwrap(), 0);
}

#[test]
fn verify_prices_stable_across_reloads() {
    let first = engine_with_seed(1);
    let second = engine_with_seed(999);
    for id in [1u32, 7, 101, 110, 111, 120, 121] {
        assert_eq!(
            first.calculate_buy_price(id).unwrap(),
            second.calculate_buy_price(id).unwrap(),
            "buy price of {id} drifted"
        );
        assert_eq!(
            first.calculate_sell_price(id).unwrap(),
            second.calculate_sell_price(id).unwrap(),
            "sell price of {id} drifted"
        );
    }
    // Base ingredients sell at a flat markup.
    assert_eq!(first.calculate_sell_price(1).unwrap(), 100);
    assert_eq!(first.calculate_sell_price(3).unwrap(), 40);
}

#[test]
fn verify_crafted_sell_price_in_multiplier_band() {
    let engine = engine_with_seed(1);
    // layer cake costs dough 60 + batter 50 = 110 to assemble.
    let sell = engine.calculate_sell_price(121).unwrap();
    assert!(sell >= 110 * 2 - 5 && sell < 110 * 3 + 5, "sell {sell} out of band");
    assert_eq!(sell % 10, 0);
}

// ============================================================================
// OUTCOME WINDOWS
// ============================================================================

#[test]
fn verify_outcome_distribution_matches_grade_defaults() {
    // Grade F defaults: critical 5%, fail 7%, success 88%. With 100,000
    // rolls the 2-sigma band is about 0.14pp; assert within 1pp.
    let engine = engine_with_seed(20_240_817);
    let rolls = 100_000u32;
    let mut counts: HashMap<OutcomeClass, u32> = HashMap::new();

    for _ in 0..rolls {
        let result = engine.cook_dish(101, CookBonuses::default()).unwrap();
        *counts.entry(result.class).or_insert(0) += 1;
    }

    let pct = |class: OutcomeClass| {
        f64::from(counts.get(&class).copied().unwrap_or(0)) * 100.0 / f64::from(rolls)
    };
    let critical = pct(OutcomeClass::Critical);
    let success = pct(OutcomeClass::Success);
    let fail = pct(OutcomeClass::Fail);

    println!("critical {critical:.2}% | success {success:.2}% | fail {fail:.2}%");
    assert!((critical - 5.0).abs() < 1.0, "critical {critical:.2}% off 5%");
    assert!((fail - 7.0).abs() < 1.0, "fail {fail:.2}% off 7%");
    assert!((success - 88.0).abs() < 1.0, "success {success:.2}% off 88%");
    assert_eq!(counts.get(&OutcomeClass::TotalFail), None);
}

#[test]
fn verify_critical_bonus_is_monotone() {
    // The same roll sequence against a shrinking fail window: the combined
    // critical+success mass must never decrease as the bonus grows.
    let rolls = 20_000u32;
    let mut previous = 0u32;

    for bonus in [0.0, 2.0, 4.0, 6.0, 8.0] {
        let engine = engine_with_seed(777);
        let bonuses = CookBonuses {
            critical_bonus: bonus,
            fail_reduction: 0.0,
        };
        let mut good = 0u32;
        for _ in 0..rolls {
            let class = engine.cook_dish(101, bonuses).unwrap().class;
            if matches!(class, OutcomeClass::Critical | OutcomeClass::Success) {
                good += 1;
            }
        }
        assert!(
            good >= previous,
            "bonus {bonus}: {good} good outcomes < previous {previous}"
        );
        previous = good;
    }
}

#[test]
fn verify_explicit_entries_surface_in_results() {
    let engine = engine_with_seed(5);
    let mut saw_named_critical = false;
    let mut saw_named_fail = false;
    let base_sell = engine.calculate_sell_price(120).unwrap();

    for _ in 0..50_000 {
        let result = engine.cook_dish(120, CookBonuses::default()).unwrap();
        match result.class {
            OutcomeClass::Critical => {
                assert_eq!(result.display_name, "Wok-kissed noodles");
                assert_eq!(result.sell_price, (f64::from(base_sell) * 2.5).round() as u32);
                saw_named_critical = true;
            }
            OutcomeClass::Fail => {
                assert_eq!(result.display_name, "Oil-logged tangle");
                assert_eq!(result.sell_price, (f64::from(base_sell) * 0.3).round() as u32);
                saw_named_fail = true;
            }
            OutcomeClass::Success => assert_eq!(result.sell_price, base_sell),
            OutcomeClass::TotalFail => panic!("total fail cannot come from cook_dish"),
        }
    }
    assert!(saw_named_critical, "critical entry never rolled in 50k attempts");
    assert!(saw_named_fail, "fail entry never rolled in 50k attempts");
}

#[test]
fn verify_total_failure_is_isolated() {
    let engine = engine_with_seed(9);
    for _ in 0..100 {
        let result = engine.total_fail_result();
        assert_eq!(result.class, OutcomeClass::TotalFail);
        assert_eq!(result.sell_price, 0);
        assert!(!result.display_name.is_empty());
    }
}

// ============================================================================
// UNLOCK LEDGER
// ============================================================================

#[test]
fn verify_ledger_seeding_and_reset() {
    let mut engine = engine_with_seed(1);

    // Base-tier tradable ingredients only; dough and batter are crafted.
    assert_eq!(engine.unlocked_items(), vec![1, 2, 3, 7, 8]);
    assert!(!engine.is_unlocked(101));

    assert!(engine.unlock(101).unwrap());
    assert!(engine.is_unlocked(101));
    assert!(!engine.unlock(101).unwrap(), "second unlock is a no-op");

    engine.reset_unlocks().unwrap();
    assert_eq!(engine.unlocked_items(), vec![1, 2, 3, 7, 8]);
    assert!(!engine.is_unlocked(101));
}
