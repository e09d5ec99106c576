//! Platform abstraction layer
//!
//! Funnels physical inputs (keys, pointer, touch) into the three logical
//! session commands. What a press means depends on the phase: the same tap
//! starts a run, resumes a paused one, or flaps.

use crate::session::{Command, GamePhase};

/// A physical input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// Keyboard key, by `KeyboardEvent.code` or `.key`
    Key(String),
    /// Mouse button, pen or touch press on the canvas
    PointerDown,
}

/// Whether a key is the primary action key
pub fn is_action_key(key: &str) -> bool {
    matches!(key, "Space" | " " | "Enter")
}

pub fn is_pause_key(key: &str) -> bool {
    matches!(key, "Escape" | "KeyP" | "p" | "P")
}

/// The primary "tap": start, resume or flap depending on phase
fn primary(phase: GamePhase) -> Command {
    match phase {
        GamePhase::Idle | GamePhase::Ended => Command::Start,
        GamePhase::Paused => Command::PauseToggle,
        GamePhase::Running => Command::Activate,
    }
}

/// Map a physical input to a logical command for the current phase
pub fn route(phase: GamePhase, input: &RawInput) -> Option<Command> {
    match input {
        RawInput::PointerDown => Some(primary(phase)),
        RawInput::Key(key) if is_action_key(key) => Some(primary(phase)),
        RawInput::Key(key) if is_pause_key(key) => match phase {
            GamePhase::Running | GamePhase::Paused => Some(Command::PauseToggle),
            GamePhase::Idle | GamePhase::Ended => None,
        },
        RawInput::Key(_) => None,
    }
}
