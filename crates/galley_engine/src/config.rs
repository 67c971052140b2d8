//! # Configuration Loading
//!
//! The static tables - item catalog, recipes, outcome entries, grade
//! profiles - are declarative TOML configuration, loaded once at startup
//! and indexed into the typed structures the engine runs on. All
//! referential-integrity checking happens in that single load pass; the
//! runtime never discovers table corruption lazily.
//!
//! ```toml
//! [[items]]
//! id = 1
//! name = "rice"
//! grade = "G"
//! tradable = true
//! base_price = 50
//!
//! [[recipes]]
//! id = 1
//! result = 101
//! inputs = [1, 7]
//!
//! [[outcomes]]
//! item_id = 101
//! kind = "critical"
//! name = "Glistening bowl"
//! weight = 5.0
//! price_multiplier = 2.0
//!
//! [grades.G]
//! critical_percent = 5.0
//! fail_percent = 10.0
//! critical_multiplier = 1.5
//! fail_multiplier = 0.5
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::catalog::{Grade, Item};
use crate::error::{EngineError, EngineResult};
use crate::outcome::{GradeProfile, OutcomeEntry};
use crate::recipe::Recipe;

/// The full startup configuration, straight out of TOML.
#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// Every craftable and base item.
    pub items: Vec<Item>,
    /// The recipe table.
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    /// Sparse outcome overrides; most items have none.
    #[serde(default)]
    pub outcomes: Vec<OutcomeEntry>,
    /// Default probability profile per grade; all eight are required.
    pub grades: HashMap<Grade, GradeProfile>,
}

impl EngineConfig {
    /// Parses a configuration document from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] on malformed TOML or schema
    /// mismatches. Integrity validation happens later, when the engine is
    /// built from the parsed tables.
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        toml::from_str(text).map_err(|e| EngineError::Parse(e.to_string()))
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
