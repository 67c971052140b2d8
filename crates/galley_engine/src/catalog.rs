//! # Item Catalog
//!
//! Immutable, session-scoped registry of every base ingredient and dish.
//! Built once from configuration rows and never mutated afterwards; every
//! other table in the engine is validated against it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// Unique identifier for an item type.
pub type ItemId = u32;

/// Quality tier assigned to every item, ordered lowest to highest.
///
/// Grades gate recipe progression (a result should never be graded below
/// its ingredients) and select the default probability profile when an item
/// has no explicit outcome entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Grade {
    /// Lowest tier - raw staples.
    G = 0,
    /// Common ingredients and simple dishes.
    F = 1,
    /// Uncommon tier.
    E = 2,
    /// Mid tier.
    D = 3,
    /// Upper-mid tier.
    C = 4,
    /// High tier.
    B = 5,
    /// Top craftable tier.
    A = 6,
    /// Rarest tier - signature dishes.
    R = 7,
}

impl Grade {
    /// All grades, lowest to highest.
    pub const ALL: [Self; 8] = [
        Self::G,
        Self::F,
        Self::E,
        Self::D,
        Self::C,
        Self::B,
        Self::A,
        Self::R,
    ];

    /// Converts from u8, saturating above the top tier.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::G,
            1 => Self::F,
            2 => Self::E,
            3 => Self::D,
            4 => Self::C,
            5 => Self::B,
            6 => Self::A,
            _ => Self::R,
        }
    }
}

/// A single catalog item - base ingredient or crafted dish.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Human-readable name.
    pub name: String,
    /// Quality tier.
    pub grade: Grade,
    /// Tradable items may appear as recipe inputs; non-tradable items are
    /// terminal dishes, usable only for sale.
    pub tradable: bool,
    /// Fixed acquisition price. Mandatory for base items, which anchor the
    /// whole valuation cascade.
    #[serde(default)]
    pub base_price: Option<u32>,
    /// Explicit sale-price override. When present it short-circuits the
    /// derived sell price.
    #[serde(default)]
    pub sell_price: Option<u32>,
}

/// The immutable item registry.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<ItemId, Item>,
}

impl ItemCatalog {
    /// Builds a catalog from configuration rows.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateItem`] if two rows share an id.
    pub fn from_items(rows: Vec<Item>) -> EngineResult<Self> {
        let mut items = HashMap::with_capacity(rows.len());
        for item in rows {
            if items.contains_key(&item.id) {
                return Err(EngineError::DuplicateItem(item.id));
            }
            items.insert(item.id, item);
        }
        Ok(Self { items })
    }

    /// Looks up an item by id.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Looks up an item by id, failing with a descriptive error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownItem`] if the id is not registered.
    pub fn require(&self, id: ItemId) -> EngineResult<&Item> {
        self.items.get(&id).ok_or(EngineError::UnknownItem(id))
    }

    /// Whether the catalog contains the given id.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Iterates over all items in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
