//! Playfield geometry and the per-run world aggregate

use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::obstacle::ObstacleStream;
use crate::consts::*;
use crate::tuning::DifficultyProfile;

/// Playfield dimensions (y grows downward, ground at the bottom)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
    pub ground_height: f32,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            ground_height: GROUND_HEIGHT,
        }
    }
}

impl Field {
    /// Size the field to fit a viewport of the given CSS width
    pub fn for_viewport(viewport_width: f32) -> Self {
        let width = (viewport_width - FIELD_GUTTER).min(MAX_FIELD_WIDTH).max(1.0);
        Self {
            width,
            height: width * FIELD_ASPECT,
            ground_height: GROUND_HEIGHT,
        }
    }

    /// Top of the ground strip
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_height
    }
}

/// Everything the simulation mutates during one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Copy of the selected preset, fixed for the run
    pub profile: DifficultyProfile,
    pub field: Field,
    pub avatar: Avatar,
    pub obstacles: ObstacleStream,
    pub score: u32,
}

impl World {
    pub fn new(profile: DifficultyProfile, field: Field) -> Self {
        Self {
            profile,
            field,
            avatar: Avatar::new(),
            obstacles: ObstacleStream::new(),
            score: 0,
        }
    }
}
