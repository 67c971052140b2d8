//! # Unlock Ledger
//!
//! The persisted set of item ids the player has discovered. The only
//! mutable state in the engine: seeded with every base-tier tradable item
//! at first initialization, it grows monotonically through [`UnlockLedger::unlock`]
//! until an explicit [`UnlockLedger::reset`].
//!
//! Persistence happens through the [`UnlockStore`] collaborator,
//! synchronously after every mutation. A single logical actor mutates the
//! ledger, so last-write-wins is sufficient; no locking or ordering
//! guarantee beyond call order exists or is needed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::catalog::ItemId;
use crate::error::{EngineError, EngineResult};

/// The persistence collaborator for unlocked-item state.
pub trait UnlockStore: Send {
    /// Loads the persisted set, or `None` if no state was ever saved
    /// (first initialization).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the backing store is unreadable.
    fn load(&mut self) -> EngineResult<Option<Vec<ItemId>>>;

    /// Persists the full set, replacing any previous state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the write fails.
    fn save(&mut self, ids: &[ItemId]) -> EngineResult<()>;
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<Vec<ItemId>>,
}

impl MemoryStore {
    /// Creates an empty store (never-saved state).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with previously "persisted" ids.
    #[must_use]
    pub fn with_saved(ids: Vec<ItemId>) -> Self {
        Self { saved: Some(ids) }
    }

    /// The last saved snapshot, if any.
    #[must_use]
    pub fn saved(&self) -> Option<&[ItemId]> {
        self.saved.as_deref()
    }
}

impl UnlockStore for MemoryStore {
    fn load(&mut self) -> EngineResult<Option<Vec<ItemId>>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, ids: &[ItemId]) -> EngineResult<()> {
        self.saved = Some(ids.to_vec());
        Ok(())
    }
}

/// On-disk serialized form of the unlock set.
#[derive(Debug, Serialize, Deserialize)]
struct UnlockFile {
    unlocked: Vec<ItemId>,
}

/// TOML-file-backed store, matching the engine's configuration format.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the given path. The file is created on
    /// first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UnlockStore for FileStore {
    fn load(&mut self) -> EngineResult<Option<Vec<ItemId>>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EngineError::Storage(e.to_string())),
        };
        let file: UnlockFile =
            toml::from_str(&text).map_err(|e| EngineError::Storage(e.to_string()))?;
        Ok(Some(file.unlocked))
    }

    fn save(&mut self, ids: &[ItemId]) -> EngineResult<()> {
        let file = UnlockFile {
            unlocked: ids.to_vec(),
        };
        let text =
            toml::to_string_pretty(&file).map_err(|e| EngineError::Storage(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| EngineError::Storage(e.to_string()))
    }
}

/// The mutable set of discovered items.
pub struct UnlockLedger {
    unlocked: BTreeSet<ItemId>,
    seed: Vec<ItemId>,
    store: Box<dyn UnlockStore>,
}

impl std::fmt::Debug for UnlockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockLedger")
            .field("unlocked", &self.unlocked)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl UnlockLedger {
    /// Opens the ledger: loads persisted state, or seeds and persists the
    /// base-tier set on first initialization. Saved state is always joined
    /// with the seed so catalog additions surface as unlocked base items.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if the collaborator fails.
    pub fn open(seed: Vec<ItemId>, mut store: Box<dyn UnlockStore>) -> EngineResult<Self> {
        let loaded = store.load()?;
        let first_init = loaded.is_none();
        let mut unlocked: BTreeSet<ItemId> = loaded.unwrap_or_default().into_iter().collect();
        unlocked.extend(seed.iter().copied());

        let mut ledger = Self {
            unlocked,
            seed,
            store,
        };
        if first_init {
            tracing::debug!(seeded = ledger.unlocked.len(), "seeding unlock ledger");
            ledger.persist()?;
        }
        Ok(ledger)
    }

    /// Marks an item as discovered. Idempotent; persists only when the set
    /// actually grew. Returns whether the item was newly unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if persisting fails.
    pub fn unlock(&mut self, id: ItemId) -> EngineResult<bool> {
        if !self.unlocked.insert(id) {
            return Ok(false);
        }
        tracing::debug!(item = id, "item unlocked");
        self.persist()?;
        Ok(true)
    }

    /// Whether the player has discovered the item.
    #[must_use]
    pub fn is_unlocked(&self, id: ItemId) -> bool {
        self.unlocked.contains(&id)
    }

    /// Sorted snapshot copy of the unlocked set.
    #[must_use]
    pub fn list(&self) -> Vec<ItemId> {
        self.unlocked.iter().copied().collect()
    }

    /// Number of discovered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.unlocked.len()
    }

    /// Whether nothing is unlocked (only possible with an empty seed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty()
    }

    /// Clears all progress and re-seeds with the base-tier set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Storage`] if persisting fails.
    pub fn reset(&mut self) -> EngineResult<()> {
        self.unlocked = self.seed.iter().copied().collect();
        tracing::debug!(seeded = self.unlocked.len(), "unlock ledger reset");
        self.persist()
    }

    fn persist(&mut self) -> EngineResult<()> {
        let snapshot = self.list();
        self.store.save(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_init_seeds_and_persists() {
        let ledger = UnlockLedger::open(vec![3, 1, 2], Box::new(MemoryStore::new())).unwrap();
        assert_eq!(ledger.list(), vec![1, 2, 3]);
        assert!(ledger.is_unlocked(2));
        assert!(!ledger.is_unlocked(99));
    }

    #[test]
    fn test_reopen_joins_saved_and_seed() {
        let store = MemoryStore::with_saved(vec![1, 2, 101]);
        let ledger = UnlockLedger::open(vec![1, 2, 3], Box::new(store)).unwrap();
        assert_eq!(ledger.list(), vec![1, 2, 3, 101]);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut ledger = UnlockLedger::open(vec![1], Box::new(MemoryStore::new())).unwrap();
        assert!(ledger.unlock(101).unwrap());
        assert!(!ledger.unlock(101).unwrap());
        assert_eq!(ledger.list(), vec![1, 101]);
    }

    #[test]
    fn test_reset_returns_to_seed() {
        let mut ledger = UnlockLedger::open(vec![1, 2], Box::new(MemoryStore::new())).unwrap();
        ledger.unlock(101).unwrap();
        ledger.unlock(102).unwrap();
        ledger.reset().unwrap();
        assert_eq!(ledger.list(), vec![1, 2]);
        assert!(!ledger.is_unlocked(101));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unlocks.toml");

        let mut ledger =
            UnlockLedger::open(vec![1, 7], Box::new(FileStore::new(path.clone()))).unwrap();
        ledger.unlock(101).unwrap();
        drop(ledger);

        let reopened = UnlockLedger::open(vec![1, 7], Box::new(FileStore::new(path))).unwrap();
        assert_eq!(reopened.list(), vec![1, 7, 101]);
    }
}
