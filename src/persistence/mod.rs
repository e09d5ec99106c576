//! Key-value persistence
//!
//! Backends:
//! - `LocalStorage` in the browser
//! - `FileStore`, a JSON file, on native
//! - `MemoryStore` for tests and as a last-resort fallback
//!
//! Every backend may fail. Callers in `records` and `settings` turn failures
//! into logged fallbacks; nothing here ever reaches gameplay code.

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use std::collections::HashMap;

/// Storage keys
pub mod keys {
    pub const BEST_SCORE: &str = "flappyBird_bestScore";
    pub const DIFFICULTY: &str = "flappyBird_difficulty";
    pub const GAMES_PLAYED: &str = "flappyBird_gamesPlayed";
}

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage contents malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed, string-valued store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store; can be switched off to simulate a blocked backend
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    available: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            available: true,
        }
    }

    /// A store whose every access fails
    pub fn unavailable() -> Self {
        Self {
            entries: HashMap::new(),
            available: false,
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.available {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store disabled".into()))
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
