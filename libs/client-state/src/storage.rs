//! Persistence adapters for the client state
//!
//! The state store is written against the [`StateStorage`] trait rather
//! than a concrete backend, so a browser shell, a file, or a test double
//! can all be injected.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::state::PersistedState;

/// Persistence failure
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access persisted state: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persisted state is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Injected load/save seam for the client state
pub trait StateStorage {
    /// Load the previously saved state, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    /// Save the full state snapshot
    fn save(&self, state: &PersistedState) -> Result<(), StorageError>;
}

/// JSON-file-backed storage, one keyed blob per store
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory storage for tests
///
/// Serializes through JSON like the real adapters so round-trip behavior
/// matches. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let slot = self.slot.lock().expect("storage lock poisoned");
        match slot.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)?;
        *self.slot.lock().expect("storage lock poisoned") = Some(raw);
        Ok(())
    }
}
