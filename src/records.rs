//! Best score and games-played counter
//!
//! Both live in the key-value store as decimal strings. Any storage failure
//! is logged and the in-memory value carries on.

use crate::persistence::{KeyValueStore, keys};

/// Persistent player records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Records {
    /// Highest score ever reached (never decreases)
    pub best_score: u32,
    /// Games that reached game over
    pub games_played: u32,
}

/// Read a counter, treating absent, unparsable or unreadable values as zero
fn read_count<S: KeyValueStore>(store: &S, key: &str) -> u32 {
    match store.get(key) {
        Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed {}: {:?}", key, raw);
            0
        }),
        Ok(None) => 0,
        Err(e) => {
            log::warn!("Could not read {}: {}", key, e);
            0
        }
    }
}

fn write_count<S: KeyValueStore>(store: &mut S, key: &str, value: u32) {
    if let Err(e) = store.set(key, &value.to_string()) {
        log::warn!("Could not save {}: {}", key, e);
    }
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records, falling back to zeros
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        let records = Self {
            best_score: read_count(store, keys::BEST_SCORE),
            games_played: read_count(store, keys::GAMES_PLAYED),
        };
        log::info!(
            "Loaded records: best {} over {} games",
            records.best_score,
            records.games_played
        );
        records
    }

    /// Raise the best score if `score` beats it.
    ///
    /// Returns true when the best changed (and was written to the store).
    pub fn submit_score<S: KeyValueStore>(&mut self, score: u32, store: &mut S) -> bool {
        if score <= self.best_score {
            return false;
        }
        self.best_score = score;
        write_count(store, keys::BEST_SCORE, score);
        true
    }

    /// Bump the games-played counter.
    ///
    /// Re-reads the stored count first so another tab's games are not lost.
    pub fn record_game_played<S: KeyValueStore>(&mut self, store: &mut S) {
        let stored = match store.get(keys::GAMES_PLAYED) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or(self.games_played),
            _ => self.games_played,
        };
        self.games_played = stored.max(self.games_played).saturating_add(1);
        write_count(store, keys::GAMES_PLAYED, self.games_played);
    }
}
