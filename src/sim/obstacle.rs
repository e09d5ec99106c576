//! Obstacle columns and their spawn/advance/cull lifecycle

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::collision::{Hitbox, hits_obstacle};
use super::state::Field;
use crate::consts::*;
use crate::tuning::DifficultyProfile;

/// One column with a gap in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Leading (left) edge
    pub x: f32,
    pub gap_top: f32,
    pub gap_height: f32,
    /// Set once the avatar has cleared this column
    pub scored: bool,
}

impl Obstacle {
    pub fn new(x: f32, gap_top: f32, gap_height: f32) -> Self {
        Self {
            x,
            gap_top,
            gap_height,
            scored: false,
        }
    }

    #[inline]
    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_height
    }

    /// Trailing (right) edge
    #[inline]
    pub fn right(&self, width: f32) -> f32 {
        self.x + width
    }
}

/// Result of testing the avatar against the stream for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Columns newly cleared this tick
    pub scored: u32,
    /// The avatar hit a column (terminal)
    pub collided: bool,
}

/// Live obstacles in spawn order, plus the spawn clock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleStream {
    pub obstacles: Vec<Obstacle>,
    /// Timestamp (ms) of the last spawn; unset until the first tick of a run
    pub last_spawn_ms: Option<f64>,
}

impl ObstacleStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    /// Push the spawn clock forward, e.g. by the length of a pause
    pub fn shift_spawn_clock(&mut self, delta_ms: f64) {
        if let Some(last) = self.last_spawn_ms.as_mut() {
            *last += delta_ms;
        }
    }

    /// Spawn a column at the right edge if the spawn interval has elapsed.
    ///
    /// The first call of a run only starts the spawn clock. Returns whether a
    /// column was added.
    pub fn maybe_spawn<R: Rng>(
        &mut self,
        profile: &DifficultyProfile,
        field: &Field,
        score: u32,
        now_ms: f64,
        rng: &mut R,
    ) -> bool {
        let Some(last) = self.last_spawn_ms else {
            self.last_spawn_ms = Some(now_ms);
            return false;
        };
        if now_ms - last <= profile.spawn_interval_ms {
            return false;
        }

        let gap_height = profile.effective_gap(score);
        let min_top = GAP_TOP_MARGIN;
        let max_top = field.height - gap_height - GAP_GROUND_MARGIN;
        let gap_top = if max_top > min_top {
            rng.random_range(min_top..max_top)
        } else {
            min_top
        };

        self.obstacles.push(Obstacle::new(field.width, gap_top, gap_height));
        self.last_spawn_ms = Some(now_ms);
        log::debug!(
            "Spawned obstacle gap_top={:.1} gap={:.1} (score {})",
            gap_top,
            gap_height,
            score
        );
        true
    }

    /// Scroll every column left and drop the ones fully off-screen.
    ///
    /// Returns how many columns were culled.
    pub fn advance(&mut self, profile: &DifficultyProfile, score: u32, dt: f32) -> usize {
        let shift = profile.effective_speed(score) * dt;
        for obstacle in &mut self.obstacles {
            obstacle.x -= shift;
        }

        let width = profile.obstacle_width;
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.right(width) >= 0.0);
        before - self.obstacles.len()
    }

    /// Collide and score in spawn order.
    ///
    /// A collision stops the scan; increments from earlier columns in the
    /// same tick are still reported.
    pub fn test_and_score(&mut self, avatar: &Avatar, profile: &DifficultyProfile) -> PassReport {
        let width = profile.obstacle_width;
        let hitbox = Hitbox::of_avatar(avatar).shrink(profile.collision_tolerance);
        let mut report = PassReport::default();

        for obstacle in &mut self.obstacles {
            if hits_obstacle(&hitbox, obstacle, width) {
                report.collided = true;
                return report;
            }
            if !obstacle.scored && obstacle.right(width) < avatar.pos.x {
                obstacle.scored = true;
                report.scored += 1;
            }
        }

        report
    }
}
