//! Simulation module
//!
//! All gameplay logic lives here. No rendering, storage or platform
//! dependencies:
//! - Time arrives as plain millisecond timestamps
//! - Randomness comes from a caller-supplied RNG
//! - Obstacles are kept in spawn order

pub mod autopilot;
pub mod avatar;
pub mod collision;
pub mod obstacle;
pub mod state;
pub mod tick;

pub use avatar::{Avatar, Contact};
pub use collision::{Hitbox, avatar_hits_obstacle, hits_obstacle};
pub use obstacle::{Obstacle, ObstacleStream, PassReport};
pub use state::{Field, World};
pub use tick::{StepReport, Terminal, step};
