//! Collision detection between the avatar and obstacle columns
//!
//! Everything here is axis-aligned: the avatar is a box, and an obstacle is a
//! column that is solid everywhere except its gap.

use glam::Vec2;

use super::avatar::Avatar;
use super::obstacle::Obstacle;

/// Axis-aligned box in field coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub min: Vec2,
    pub max: Vec2,
}

impl Hitbox {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Full box of the avatar
    pub fn of_avatar(avatar: &Avatar) -> Self {
        Self::new(avatar.pos, avatar.size)
    }

    /// Shrink symmetrically by `tolerance` on every side.
    ///
    /// The shrink is capped at half the extent on each axis, so a huge
    /// tolerance collapses the box to its centre rather than inverting it.
    pub fn shrink(&self, tolerance: f32) -> Self {
        let half = (self.max - self.min) * 0.5;
        let inset = Vec2::splat(tolerance.max(0.0)).min(half);
        Self {
            min: self.min + inset,
            max: self.max - inset,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Check the forgiving avatar hitbox against one obstacle column.
///
/// A hit needs horizontal overlap with the column and some part of the
/// shrunk box outside the gap (above its top or below its bottom).
pub fn hits_obstacle(hitbox: &Hitbox, obstacle: &Obstacle, obstacle_width: f32) -> bool {
    let overlaps_column =
        hitbox.max.x > obstacle.x && hitbox.min.x < obstacle.x + obstacle_width;
    if !overlaps_column {
        return false;
    }
    hitbox.min.y < obstacle.gap_top || hitbox.max.y > obstacle.gap_bottom()
}

/// Convenience wrapper applying the profile tolerance to the avatar box
pub fn avatar_hits_obstacle(
    avatar: &Avatar,
    obstacle: &Obstacle,
    obstacle_width: f32,
    tolerance: f32,
) -> bool {
    let hitbox = Hitbox::of_avatar(avatar).shrink(tolerance);
    hits_obstacle(&hitbox, obstacle, obstacle_width)
}
