//! One simulation step
//!
//! Order within a step is fixed: spawn check, avatar integration, obstacle
//! advance, then collision and scoring against the post-move positions.

use rand::Rng;

use super::avatar::Contact;
use super::state::World;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Ground,
    Obstacle,
}

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Points gained this step (already added to `World::score`)
    pub scored: u32,
    /// Whether a column was spawned
    pub spawned: bool,
    pub terminal: Option<Terminal>,
}

impl StepReport {
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }
}

/// Advance the world by `dt` nominal frames at wall-clock time `now_ms`
pub fn step<R: Rng>(world: &mut World, rng: &mut R, now_ms: f64, dt: f32) -> StepReport {
    let mut report = StepReport {
        spawned: world.obstacles.maybe_spawn(
            &world.profile,
            &world.field,
            world.score,
            now_ms,
            rng,
        ),
        ..Default::default()
    };

    let multiplier = world.profile.speed_multiplier(world.score);
    let contact = world
        .avatar
        .integrate(&world.profile, &world.field, dt, multiplier);
    world.avatar.update_rotation();

    // Obstacles move and score even on the frame the avatar lands
    world.obstacles.advance(&world.profile, world.score, dt);
    let pass = world.obstacles.test_and_score(&world.avatar, &world.profile);
    world.score += pass.scored;
    report.scored = pass.scored;

    report.terminal = if contact == Contact::Ground {
        Some(Terminal::Ground)
    } else if pass.collided {
        Some(Terminal::Obstacle)
    } else {
        None
    };

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::Obstacle;
    use crate::sim::state::Field;
    use crate::tuning::DifficultyPreset;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> World {
        World::new(DifficultyPreset::Normal.profile(), Field::default())
    }

    #[test]
    fn test_step_integrates_avatar() {
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(5);
        let report = step(&mut world, &mut rng, 0.0, 1.0);

        assert_eq!(report, StepReport::default());
        assert!((world.avatar.velocity - 0.2).abs() < 1e-6);
        assert!((world.avatar.pos.y - 250.2).abs() < 1e-4);
    }

    #[test]
    fn test_ground_hit_still_scores_passed_obstacle() {
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(5);
        world.avatar.pos.y = 525.0;
        world.avatar.velocity = 5.0;
        world.obstacles.obstacles.push(Obstacle::new(-41.5, 200.0, 140.0));

        let report = step(&mut world, &mut rng, 0.0, 1.0);
        assert_eq!(report.terminal, Some(Terminal::Ground));
        assert_eq!(report.scored, 1);
        assert_eq!(world.score, 1);
        assert!((world.obstacles.obstacles[0].x - (-44.3)).abs() < 1e-4);
        assert!(world.obstacles.obstacles[0].scored);
    }

    #[test]
    fn test_ground_wins_over_obstacle_contact() {
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(5);
        world.avatar.pos.y = 525.0;
        world.avatar.velocity = 5.0;
        // Column spans the avatar with the gap far above
        world.obstacles.obstacles.push(Obstacle::new(70.0, 50.0, 140.0));

        let report = step(&mut world, &mut rng, 0.0, 1.0);
        assert_eq!(report.terminal, Some(Terminal::Ground));
    }

    #[test]
    fn test_collision_uses_post_move_positions() {
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(5);
        world.avatar.pos.y = 100.0;
        // The shrunk hitbox ends at x=109, just short of the column; one step
        // at speed 2.8 closes the distance.
        world.obstacles.obstacles.push(Obstacle::new(110.0, 300.0, 140.0));

        let report = step(&mut world, &mut rng, 0.0, 1.0);
        assert_eq!(report.terminal, Some(Terminal::Obstacle));
    }

    #[test]
    fn test_scoring_updates_world() {
        let mut world = world();
        let mut rng = Pcg32::seed_from_u64(5);
        world.avatar.pos.y = 250.0;
        world.obstacles.obstacles.push(Obstacle::new(-38.0, 200.0, 140.0));

        let report = step(&mut world, &mut rng, 0.0, 1.0);
        assert_eq!(report.scored, 1);
        assert_eq!(world.score, 1);

        let report = step(&mut world, &mut rng, 16.0, 1.0);
        assert_eq!(report.scored, 0);
        assert_eq!(world.score, 1);
    }
}
