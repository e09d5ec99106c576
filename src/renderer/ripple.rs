//! Expanding ring drawn where a touch landed

use glam::Vec2;

/// Lifetime of one ring (ms)
pub const RIPPLE_MS: f64 = 300.0;

/// A touch marker, in field coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapRipple {
    pub pos: Vec2,
    pub started_ms: f64,
}

impl TapRipple {
    pub fn new(pos: Vec2, started_ms: f64) -> Self {
        Self { pos, started_ms }
    }

    /// Fraction of the lifetime used at `now_ms`, or `None` once it has faded
    pub fn progress(&self, now_ms: f64) -> Option<f32> {
        let elapsed = (now_ms - self.started_ms).max(0.0);
        if elapsed > RIPPLE_MS {
            return None;
        }
        Some((elapsed / RIPPLE_MS) as f32)
    }
}
