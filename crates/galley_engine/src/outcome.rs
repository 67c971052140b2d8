//! # Outcome Classifier
//!
//! Grades every cooking attempt as critical, success, or fail by rolling
//! once into a partitioned probability range, plus the separate
//! total-failure path for attempts with no valid recipe at all.
//!
//! ## Window model
//!
//! The range `[0, total)` is partitioned into three contiguous windows in
//! fixed order: critical, success, fail. Explicit per-item outcome entries
//! sub-slice their window in declaration order; items without entries fall
//! back to the grade's default widths. Bonuses shrink only the fail window,
//! which raises the relative odds of landing in critical or success without
//! changing their absolute widths - that is the intended bonus mechanism.
//!
//! One deliberate quirk is preserved from the original balance tables: the
//! success width subtracts the grade's *default* fail percent even when the
//! item overrides its fail probability. Items with a custom fail share do
//! not get a compensating success share.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{Grade, Item, ItemCatalog, ItemId};
use crate::error::{EngineError, EngineResult};

/// Per-grade default probability widths and price multipliers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeProfile {
    /// Default critical window width, in percent of the unmodified range.
    pub critical_percent: f64,
    /// Default fail window width, in percent of the unmodified range.
    pub fail_percent: f64,
    /// Default sale-price multiplier for critical results.
    pub critical_multiplier: f64,
    /// Default sale-price multiplier for fail results.
    pub fail_multiplier: f64,
}

/// Default profiles for all eight grades, indexed by [`Grade`].
#[derive(Clone, Debug)]
pub struct GradeTable {
    profiles: [GradeProfile; 8],
}

impl GradeTable {
    /// Builds the table, requiring a profile for every grade.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingGradeProfile`] naming the first grade
    /// without a configured profile.
    pub fn from_map(mut map: HashMap<Grade, GradeProfile>) -> EngineResult<Self> {
        let mut profiles = [GradeProfile {
            critical_percent: 0.0,
            fail_percent: 0.0,
            critical_multiplier: 1.0,
            fail_multiplier: 1.0,
        }; 8];
        for grade in Grade::ALL {
            let profile = map
                .remove(&grade)
                .ok_or(EngineError::MissingGradeProfile(grade))?;
            profiles[grade as usize] = profile;
        }
        Ok(Self { profiles })
    }

    /// The default profile for a grade.
    #[inline]
    #[must_use]
    pub fn profile(&self, grade: Grade) -> &GradeProfile {
        &self.profiles[grade as usize]
    }
}

/// Which window an explicit outcome entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// A named critical result.
    Critical,
    /// A named fail result.
    Fail,
}

/// A named, weighted override for one item's critical or fail window.
///
/// Sparse: most items have none and use their grade's defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    /// The item this entry applies to.
    pub item_id: ItemId,
    /// Whether this names a critical or a fail result.
    pub kind: OutcomeKind,
    /// Display name shown to the player.
    pub name: String,
    /// Window width in percent, `(0, 100]`.
    pub weight: f64,
    /// Sale-price multiplier applied when this entry is rolled.
    pub price_multiplier: f64,
    /// Optional flavor description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Explicit entries for a single item, declaration order preserved.
#[derive(Clone, Debug, Default)]
struct ItemOutcomes {
    critical: Vec<OutcomeEntry>,
    fail: Vec<OutcomeEntry>,
}

/// Sparse per-item outcome overrides, indexed once at load.
#[derive(Clone, Debug, Default)]
pub struct OutcomeTable {
    by_item: HashMap<ItemId, ItemOutcomes>,
}

impl OutcomeTable {
    /// Indexes and validates the entry rows.
    ///
    /// Every entry must reference a catalog item and carry a weight in
    /// `(0, 100]`. Afterwards every catalog item's effective critical and
    /// fail totals (entry sums, or grade defaults where no entries exist)
    /// must leave room for a success window; a combined total of 100 or
    /// more is rejected rather than silently producing a negative-width
    /// success window.
    ///
    /// # Errors
    ///
    /// Returns the first violation, naming the offending entry or item.
    pub fn from_entries(
        entries: Vec<OutcomeEntry>,
        catalog: &ItemCatalog,
        grades: &GradeTable,
    ) -> EngineResult<Self> {
        let mut by_item: HashMap<ItemId, ItemOutcomes> = HashMap::new();
        for entry in entries {
            if !catalog.contains(entry.item_id) {
                return Err(EngineError::UnknownOutcomeItem {
                    item_id: entry.item_id,
                    name: entry.name,
                });
            }
            if !entry.weight.is_finite() || entry.weight <= 0.0 || entry.weight > 100.0 {
                return Err(EngineError::InvalidOutcomeWeight {
                    item_id: entry.item_id,
                    name: entry.name,
                    weight: entry.weight,
                });
            }
            let slot = by_item.entry(entry.item_id).or_default();
            match entry.kind {
                OutcomeKind::Critical => slot.critical.push(entry),
                OutcomeKind::Fail => slot.fail.push(entry),
            }
        }

        let table = Self { by_item };
        for item in catalog.iter() {
            let profile = grades.profile(item.grade);
            let critical_total = table.critical_total(item.id, profile);
            let fail_total = table.fail_total(item.id, profile);
            if critical_total + fail_total >= 100.0 {
                return Err(EngineError::InconsistentProbability {
                    item_id: item.id,
                    critical_total,
                    fail_total,
                });
            }
        }
        Ok(table)
    }

    fn entries(&self, id: ItemId) -> (&[OutcomeEntry], &[OutcomeEntry]) {
        self.by_item
            .get(&id)
            .map_or((&[][..], &[][..]), |o| (o.critical.as_slice(), o.fail.as_slice()))
    }

    fn critical_total(&self, id: ItemId, profile: &GradeProfile) -> f64 {
        let (critical, _) = self.entries(id);
        if critical.is_empty() {
            profile.critical_percent
        } else {
            critical.iter().map(|e| e.weight).sum()
        }
    }

    fn fail_total(&self, id: ItemId, profile: &GradeProfile) -> f64 {
        let (_, fail) = self.entries(id);
        if fail.is_empty() {
            profile.fail_percent
        } else {
            fail.iter().map(|e| e.weight).sum()
        }
    }
}

/// Runtime modifiers supplied with a cooking attempt. Both shrink the fail
/// window; neither widens critical or success directly.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CookBonuses {
    /// Critical-focused bonus, subtracted from the fail window.
    pub critical_bonus: f64,
    /// Fail-reduction bonus, subtracted from the fail window.
    pub fail_reduction: f64,
}

/// The graded result of a cooking attempt, in descending value order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeClass {
    /// Rolled into the critical window.
    Critical,
    /// Rolled into the success window (or the floating-point fallback).
    Success,
    /// Rolled into the fail window.
    Fail,
    /// No valid recipe existed; the probability machinery was never
    /// consulted.
    TotalFail,
}

/// What the player is shown and paid for one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookResult {
    /// The graded class of the attempt.
    pub class: OutcomeClass,
    /// Concrete sale value of what came out of the pot.
    pub sell_price: u32,
    /// Display name - the matched entry's name or pool flavor text.
    pub display_name: String,
    /// Optional flavor description.
    pub description: Option<String>,
}

/// Fallback flavor for critical results without a matched entry.
const CRITICAL_FLAVOR: &[(&str, &str)] = &[
    ("Flawless plate", "Everything landed exactly where it should."),
    ("Chef's pride", "The kind of dish that gets remembered."),
    ("Golden batch", "Somehow better than the recipe deserves."),
];

/// Fallback flavor for plain successes.
const SUCCESS_FLAVOR: &[(&str, &str)] = &[
    ("Solid serving", "Exactly what the recipe promised."),
    ("Honest work", "No surprises, no complaints."),
    ("House standard", "Good enough for the regulars."),
];

/// Fallback flavor for fail results without a matched entry.
const FAIL_FLAVOR: &[(&str, &str)] = &[
    ("Overdone mess", "Edible. Technically."),
    ("Seasoning accident", "The salt jar slipped."),
    ("Rushed plate", "It shows."),
];

/// Flavor pool for the total-failure path.
const TOTAL_FAIL_FLAVOR: &[(&str, &str)] = &[
    ("Charred mystery", "Whatever that was, it isn't food now."),
    ("Smoking ruin", "The pot may never recover."),
    ("Inedible sludge", "Not even the gulls will touch it."),
    ("Kitchen disaster", "Best scraped straight into the bin."),
];

fn pick_flavor<R: Rng + ?Sized>(pool: &[(&str, &str)], rng: &mut R) -> (String, Option<String>) {
    let (name, description) = pool[rng.gen_range(0..pool.len())];
    (name.to_string(), Some(description.to_string()))
}

/// Builds the always-available total-failure result.
///
/// Returned when an attempted combination matched no recipe: sale value is
/// always zero and the flavor comes from a dedicated pool, independent of
/// every probability table.
pub fn total_fail_result<R: Rng + ?Sized>(rng: &mut R) -> CookResult {
    let (display_name, description) = pick_flavor(TOTAL_FAIL_FLAVOR, rng);
    CookResult {
        class: OutcomeClass::TotalFail,
        sell_price: 0,
        display_name,
        description,
    }
}

/// The classifier: grade defaults plus sparse per-item overrides.
#[derive(Clone, Debug)]
pub struct OutcomeClassifier {
    grades: GradeTable,
    table: OutcomeTable,
}

impl OutcomeClassifier {
    /// Creates a classifier over validated tables.
    #[must_use]
    pub fn new(grades: GradeTable, table: OutcomeTable) -> Self {
        Self { grades, table }
    }

    /// The grade-default table.
    #[must_use]
    pub fn grades(&self) -> &GradeTable {
        &self.grades
    }

    /// Grades one cooking attempt.
    ///
    /// `sell_price` is the item's resolved sale value; critical and fail
    /// results scale it by the matched entry's multiplier or the grade
    /// default, success returns it unchanged. Never errors for a valid
    /// item; a roll that escapes every window through floating-point edge
    /// error lands on success.
    pub fn cook<R: Rng + ?Sized>(
        &self,
        item: &Item,
        sell_price: u32,
        bonuses: CookBonuses,
        rng: &mut R,
    ) -> CookResult {
        let unit: f64 = rng.gen();
        let (class, matched) = self.resolve(item, bonuses, unit);
        self.present(class, matched, item.grade, sell_price, rng)
    }

    /// Partitions the range and resolves one roll, `unit` in `[0, 1)`.
    fn resolve(
        &self,
        item: &Item,
        bonuses: CookBonuses,
        unit: f64,
    ) -> (OutcomeClass, Option<&OutcomeEntry>) {
        let profile = self.grades.profile(item.grade);
        let (critical_entries, fail_entries) = self.table.entries(item.id);

        let critical_total = self.table.critical_total(item.id, profile);
        let fail_total = self.table.fail_total(item.id, profile);
        // Deliberate: the grade's default fail width, not the item's own.
        let success_total = 100.0 - critical_total - profile.fail_percent;
        let adjusted_fail =
            (fail_total - bonuses.critical_bonus - bonuses.fail_reduction).max(0.0);
        let total_range = critical_total + success_total + adjusted_fail;

        let roll = unit * total_range;
        let mut cursor = 0.0;

        if critical_entries.is_empty() {
            if roll < cursor + critical_total {
                return (OutcomeClass::Critical, None);
            }
            cursor += critical_total;
        } else {
            for entry in critical_entries {
                if roll < cursor + entry.weight {
                    return (OutcomeClass::Critical, Some(entry));
                }
                cursor += entry.weight;
            }
        }

        if roll < cursor + success_total {
            return (OutcomeClass::Success, None);
        }
        cursor += success_total;

        if fail_entries.is_empty() {
            if roll < cursor + adjusted_fail {
                return (OutcomeClass::Fail, None);
            }
        } else if fail_total > 0.0 {
            // Each entry keeps its share of the shrunken window.
            let scale = adjusted_fail / fail_total;
            for entry in fail_entries {
                let width = entry.weight * scale;
                if roll < cursor + width {
                    return (OutcomeClass::Fail, Some(entry));
                }
                cursor += width;
            }
        }

        // Floating-point edge fallthrough.
        (OutcomeClass::Success, None)
    }

    fn present<R: Rng + ?Sized>(
        &self,
        class: OutcomeClass,
        matched: Option<&OutcomeEntry>,
        grade: Grade,
        sell_price: u32,
        rng: &mut R,
    ) -> CookResult {
        let profile = self.grades.profile(grade);
        let (sell_price, pool) = match class {
            OutcomeClass::Critical => {
                let mult = matched.map_or(profile.critical_multiplier, |e| e.price_multiplier);
                (scale_price(sell_price, mult), CRITICAL_FLAVOR)
            }
            OutcomeClass::Fail => {
                let mult = matched.map_or(profile.fail_multiplier, |e| e.price_multiplier);
                (scale_price(sell_price, mult), FAIL_FLAVOR)
            }
            OutcomeClass::Success => (sell_price, SUCCESS_FLAVOR),
            OutcomeClass::TotalFail => (0, TOTAL_FAIL_FLAVOR),
        };

        let (display_name, description) = match matched {
            Some(entry) => (entry.name.clone(), entry.description.clone()),
            None => pick_flavor(pool, rng),
        };

        CookResult {
            class,
            sell_price,
            display_name,
            description,
        }
    }
}

#[inline]
fn scale_price(price: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(price) * multiplier).round();
    if scaled <= 0.0 {
        0
    } else {
        scaled as u32
    }
}
