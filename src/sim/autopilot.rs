//! Demo autopilot
//!
//! Aims for the centre of the next gap and flaps when a fall would carry the
//! avatar below it. Good enough for attract mode and headless runs, not for
//! perfect play.

use super::state::World;

/// How many nominal frames ahead the fall is projected
const LOOKAHEAD_FRAMES: f32 = 4.0;
/// Slack below the gap centre before flapping
const AIM_SLACK: f32 = 12.0;

/// Vertical target: centre of the first gap not yet behind the avatar
pub fn target_y(world: &World) -> f32 {
    let width = world.profile.obstacle_width;
    world
        .obstacles
        .iter()
        .find(|o| o.right(width) >= world.avatar.pos.x)
        .map(|o| o.gap_top + o.gap_height / 2.0)
        .unwrap_or(world.field.ground_y() / 2.0)
}

/// Whether the autopilot would flap this tick
pub fn wants_activation(world: &World) -> bool {
    let avatar = &world.avatar;
    if avatar.velocity < 0.0 {
        return false;
    }
    let projected = avatar.center_y() + avatar.velocity * LOOKAHEAD_FRAMES;
    projected > target_y(world) + AIM_SLACK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::Obstacle;
    use crate::sim::state::Field;
    use crate::tuning::DifficultyPreset;

    fn world() -> World {
        World::new(DifficultyPreset::Normal.profile(), Field::default())
    }

    #[test]
    fn test_targets_next_uncleared_gap() {
        let mut world = world();
        assert_eq!(target_y(&world), 275.0);

        // Already behind the avatar
        world.obstacles.obstacles.push(Obstacle::new(-30.0, 60.0, 140.0));
        world.obstacles.obstacles.push(Obstacle::new(200.0, 300.0, 140.0));
        assert_eq!(target_y(&world), 370.0);
    }

    #[test]
    fn test_flaps_when_falling_below_target() {
        let mut world = world();
        world.obstacles.obstacles.push(Obstacle::new(200.0, 100.0, 140.0));
        world.avatar.pos.y = 250.0;
        world.avatar.velocity = 1.0;
        assert!(wants_activation(&world));
    }

    #[test]
    fn test_holds_when_above_target_or_rising() {
        let mut world = world();
        world.obstacles.obstacles.push(Obstacle::new(200.0, 300.0, 140.0));
        world.avatar.pos.y = 200.0;
        world.avatar.velocity = 1.0;
        assert!(!wants_activation(&world));

        world.avatar.pos.y = 500.0;
        world.avatar.velocity = -2.0;
        assert!(!wants_activation(&world));
    }
}
