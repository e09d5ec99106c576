//! Flappy Bird - A side-scrolling gap-threading arcade game
//!
//! Core modules:
//! - `sim`: Simulation (avatar physics, obstacle stream, collisions, scoring)
//! - `session`: Session state machine driving the simulation from a frame clock
//! - `tuning`: Difficulty presets and score-driven scaling
//! - `persistence`: Key-value storage (LocalStorage on web, JSON file on native)
//! - `platform`: Physical input routing
//! - `renderer`: WebGPU rendering pipeline

pub mod observer;
pub mod persistence;
pub mod platform;
pub mod records;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use observer::{GameEvent, SessionObserver};
pub use records::Records;
pub use session::{GamePhase, Session, TickOutcome};
pub use settings::Settings;
pub use tuning::{DifficultyPreset, DifficultyProfile};

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration (ms) that per-tick tuning values are expressed in
    pub const NOMINAL_FRAME_MS: f64 = 16.0;

    /// Default playfield dimensions
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
    pub const GROUND_HEIGHT: f32 = 50.0;
    /// Widest the playfield gets, and the page gutter around it
    pub const MAX_FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_GUTTER: f32 = 40.0;
    pub const FIELD_ASPECT: f32 = 1.5;

    /// Avatar defaults
    pub const AVATAR_X: f32 = 80.0;
    pub const AVATAR_START_Y: f32 = 250.0;
    pub const AVATAR_WIDTH: f32 = 34.0;
    pub const AVATAR_HEIGHT: f32 = 24.0;

    /// Rotation is presentation-only (degrees)
    pub const ROTATION_PER_VELOCITY: f32 = 10.0;
    pub const ROTATION_MIN: f32 = -25.0;
    pub const ROTATION_MAX: f32 = 80.0;
    pub const ROTATION_SMOOTHING: f32 = 0.12;

    /// Gap placement margins
    pub const GAP_TOP_MARGIN: f32 = 50.0;
    pub const GAP_GROUND_MARGIN: f32 = 100.0;

    /// Progressive gap shrink: `GAP_SHRINK_STEP` px every `GAP_SHRINK_EVERY` points
    pub const MIN_GAP_HEIGHT: f32 = 110.0;
    pub const GAP_SHRINK_EVERY: u32 = 5;
    pub const GAP_SHRINK_STEP: f32 = 5.0;

    /// Progressive base speed growth per point, and its cap
    pub const SPEED_RAMP_PER_POINT: f32 = 0.08;
    pub const SPEED_RAMP_CAP: f32 = 3.0;
}
