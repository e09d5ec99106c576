//! Player preferences
//!
//! Persisted alongside records in the key-value store.

use crate::persistence::{KeyValueStore, keys};
use crate::tuning::DifficultyPreset;

/// Game settings/preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Preset used for the next run
    pub difficulty: DifficultyPreset,
}

impl Settings {
    /// Load settings, falling back to defaults on any failure or unknown key
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(keys::DIFFICULTY) {
            Ok(Some(name)) => match DifficultyPreset::from_str(&name) {
                Some(difficulty) => {
                    log::info!("Loaded settings (difficulty {})", difficulty.as_str());
                    return Self { difficulty };
                }
                None => log::warn!("Unknown difficulty {:?}, using default", name),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not load settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings; failures are logged and otherwise ignored
    pub fn save<S: KeyValueStore>(&self, store: &mut S) {
        match store.set(keys::DIFFICULTY, self.difficulty.as_str()) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Could not save difficulty preference: {}", e),
        }
    }
}
