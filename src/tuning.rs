//! Difficulty presets and score-driven scaling
//!
//! A profile is copied into each run, so nothing here is ever mutated
//! while a game is in progress.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Named difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
    /// Legacy tuning: tiered multipliers only, no progressive ramp
    Endless,
}

impl DifficultyPreset {
    pub const ALL: [DifficultyPreset; 4] = [
        DifficultyPreset::Easy,
        DifficultyPreset::Normal,
        DifficultyPreset::Hard,
        DifficultyPreset::Endless,
    ];

    /// Storage key form of the preset
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "easy",
            DifficultyPreset::Normal => "normal",
            DifficultyPreset::Hard => "hard",
            DifficultyPreset::Endless => "endless",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            DifficultyPreset::Easy => "Easy",
            DifficultyPreset::Normal => "Normal",
            DifficultyPreset::Hard => "Hard",
            DifficultyPreset::Endless => "Endless",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(DifficultyPreset::Easy),
            "normal" => Some(DifficultyPreset::Normal),
            "hard" => Some(DifficultyPreset::Hard),
            "endless" => Some(DifficultyPreset::Endless),
            _ => None,
        }
    }

    /// Fresh copy of the preset's tuning values
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            DifficultyPreset::Easy => DifficultyProfile {
                gravity: 0.16,
                impulse: -3.8,
                base_speed: 2.3,
                obstacle_width: 60.0,
                gap_height: 165.0,
                spawn_interval_ms: 1450.0,
                collision_tolerance: 7.0,
                progressive: true,
                speed_boost_thresholds: vec![(50, 1.15), (100, 1.35)],
            },
            DifficultyPreset::Normal => DifficultyProfile {
                gravity: 0.20,
                impulse: -4.2,
                base_speed: 2.8,
                obstacle_width: 60.0,
                gap_height: 140.0,
                spawn_interval_ms: 1300.0,
                collision_tolerance: 5.0,
                progressive: true,
                speed_boost_thresholds: vec![(50, 1.2), (100, 1.4)],
            },
            DifficultyPreset::Hard => DifficultyProfile {
                gravity: 0.24,
                impulse: -4.8,
                base_speed: 3.5,
                obstacle_width: 60.0,
                gap_height: 115.0,
                spawn_interval_ms: 1100.0,
                collision_tolerance: 3.0,
                progressive: true,
                speed_boost_thresholds: vec![(50, 1.25), (100, 1.5)],
            },
            DifficultyPreset::Endless => DifficultyProfile {
                progressive: false,
                ..DifficultyPreset::Normal.profile()
            },
        }
    }
}

/// Tuning values for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Velocity gained per nominal frame
    pub gravity: f32,
    /// Velocity set on activation (negative = upward)
    pub impulse: f32,
    /// Obstacle speed per nominal frame before scaling
    pub base_speed: f32,
    pub obstacle_width: f32,
    pub gap_height: f32,
    pub spawn_interval_ms: f64,
    /// Pixels shaved off each side of the avatar hitbox
    pub collision_tolerance: f32,
    /// Enables gap shrink and base speed growth with score
    pub progressive: bool,
    /// `(score, multiplier)` tiers, ascending by score
    pub speed_boost_thresholds: Vec<(u32, f32)>,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        DifficultyPreset::default().profile()
    }
}

impl DifficultyProfile {
    /// Multiplier of the highest tier reached by `score`, independent of `progressive`
    pub fn speed_multiplier(&self, score: u32) -> f32 {
        self.speed_boost_thresholds
            .iter()
            .rev()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, multiplier)| *multiplier)
            .unwrap_or(1.0)
    }

    /// Gap height for an obstacle spawned at `score`
    pub fn effective_gap(&self, score: u32) -> f32 {
        if !self.progressive {
            return self.gap_height;
        }
        let shrink = (score / GAP_SHRINK_EVERY) as f32 * GAP_SHRINK_STEP;
        (self.gap_height - shrink).max(MIN_GAP_HEIGHT)
    }

    /// Horizontal obstacle speed per nominal frame, multiplier included
    pub fn effective_speed(&self, score: u32) -> f32 {
        let base = if self.progressive {
            self.base_speed + (score as f32 * SPEED_RAMP_PER_POINT).min(SPEED_RAMP_CAP)
        } else {
            self.base_speed
        };
        base * self.speed_multiplier(score)
    }
}
