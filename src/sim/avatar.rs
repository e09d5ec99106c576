//! The player's avatar and its vertical physics

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Field;
use crate::consts::*;
use crate::tuning::DifficultyProfile;

/// What the avatar touched while integrating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    None,
    /// Bumped the top of the field (non-terminal)
    Ceiling,
    /// Landed on the ground (terminal)
    Ground,
}

/// The bird
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    /// Top-left corner; `x` stays fixed during a run
    pub pos: Vec2,
    /// Vertical velocity (positive = falling)
    pub velocity: f32,
    pub size: Vec2,
    /// Smoothed tilt in degrees, for rendering only
    pub rotation: f32,
}

impl Default for Avatar {
    fn default() -> Self {
        Self::new()
    }
}

impl Avatar {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(AVATAR_X, AVATAR_START_Y),
            velocity: 0.0,
            size: Vec2::new(AVATAR_WIDTH, AVATAR_HEIGHT),
            rotation: 0.0,
        }
    }

    /// Apply gravity and move, then clamp against ground and ceiling
    pub fn integrate(
        &mut self,
        profile: &DifficultyProfile,
        field: &Field,
        dt: f32,
        speed_multiplier: f32,
    ) -> Contact {
        self.velocity += profile.gravity * dt * speed_multiplier;
        self.pos.y += self.velocity * dt * speed_multiplier;

        let ground_y = field.ground_y();
        if self.pos.y + self.size.y >= ground_y {
            self.pos.y = ground_y - self.size.y;
            return Contact::Ground;
        }

        if self.pos.y <= 0.0 {
            self.pos.y = 0.0;
            self.velocity = 0.0;
            return Contact::Ceiling;
        }

        Contact::None
    }

    /// Flap: replace the current velocity with the profile impulse
    pub fn activate(&mut self, profile: &DifficultyProfile) {
        self.velocity = profile.impulse;
    }

    /// Ease the tilt toward the angle implied by the current velocity
    pub fn update_rotation(&mut self) {
        let target = (self.velocity * ROTATION_PER_VELOCITY).clamp(ROTATION_MIN, ROTATION_MAX);
        self.rotation += (target - self.rotation) * ROTATION_SMOOTHING;
    }

    /// Vertical centre of the avatar
    #[inline]
    pub fn center_y(&self) -> f32 {
        self.pos.y + self.size.y / 2.0
    }
}
