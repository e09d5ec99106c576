//! Score and lifecycle sinks
//!
//! The session calls these synchronously as things change. Every method
//! defaults to a no-op so a sink only implements what it displays.

/// Receives score changes and state-machine transitions
pub trait SessionObserver {
    fn on_score_changed(&mut self, _score: u32) {}
    fn on_best_score_changed(&mut self, _best: u32) {}
    fn on_game_over(&mut self, _final_score: u32, _best_score: u32) {}
    fn on_game_start(&mut self) {}
    fn on_pause(&mut self) {}
    fn on_resume(&mut self) {}
}

/// Sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}

/// A recorded observer callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged(u32),
    BestScoreChanged(u32),
    GameOver { final_score: u32, best_score: u32 },
    GameStarted,
    Paused,
    Resumed,
}

/// An event log: records every callback in order
impl SessionObserver for Vec<GameEvent> {
    fn on_score_changed(&mut self, score: u32) {
        self.push(GameEvent::ScoreChanged(score));
    }

    fn on_best_score_changed(&mut self, best: u32) {
        self.push(GameEvent::BestScoreChanged(best));
    }

    fn on_game_over(&mut self, final_score: u32, best_score: u32) {
        self.push(GameEvent::GameOver {
            final_score,
            best_score,
        });
    }

    fn on_game_start(&mut self) {
        self.push(GameEvent::GameStarted);
    }

    fn on_pause(&mut self) {
        self.push(GameEvent::Paused);
    }

    fn on_resume(&mut self) {
        self.push(GameEvent::Resumed);
    }
}
