//! Session controller
//!
//! Owns the world, the RNG, records and preferences for one player, and
//! gates every operation on the current phase:
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//!                    |                                     |
//!                    +------ collision ----> Ended <-------+
//!                                              |
//!                                  start ------+--> Running
//! ```
//!
//! Illegal transitions are no-ops and report `false`. The session never
//! schedules anything itself: the frame adapter calls [`Session::tick`] and
//! stops once it returns anything but [`TickOutcome::Continue`].

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::observer::SessionObserver;
use crate::persistence::KeyValueStore;
use crate::records::Records;
use crate::settings::Settings;
use crate::sim::{Field, Terminal, World, step};
use crate::tuning::DifficultyPreset;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Nothing started yet
    Idle,
    /// Active gameplay
    Running,
    /// Run suspended; time spent here does not count
    Paused,
    /// Run finished by a collision
    Ended,
}

/// Logical input commands; every physical input maps onto one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Activate,
    PauseToggle,
}

/// Result of one tick, telling the frame adapter whether to keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still running; schedule another frame
    Continue,
    /// This tick ended the run
    Ended,
    /// Not running; nothing was simulated
    Halted,
}

pub struct Session<S: KeyValueStore, O: SessionObserver> {
    phase: GamePhase,
    world: World,
    field: Field,
    rng: Pcg32,
    settings: Settings,
    records: Records,
    store: S,
    observer: O,
    /// Timestamp of the previous tick; unset until the first tick of a run
    last_tick_ms: Option<f64>,
    paused_at_ms: Option<f64>,
}

impl<S: KeyValueStore, O: SessionObserver> Session<S, O> {
    /// Create an idle session, loading records and preferences from `store`
    pub fn new(store: S, observer: O, seed: u64) -> Self {
        let records = Records::load(&store);
        let settings = Settings::load(&store);
        let field = Field::default();
        Self {
            phase: GamePhase::Idle,
            world: World::new(settings.difficulty.profile(), field),
            field,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            records,
            store,
            observer,
            last_tick_ms: None,
            paused_at_ms: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// World of the current (or most recent) run
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn score(&self) -> u32 {
        self.world.score
    }

    pub fn best_score(&self) -> u32 {
        self.records.best_score
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn difficulty(&self) -> DifficultyPreset {
        self.settings.difficulty
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True while a run is in progress (running or paused)
    pub fn in_run(&self) -> bool {
        matches!(self.phase, GamePhase::Running | GamePhase::Paused)
    }

    /// Reseed obstacle placement for subsequent spawns
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Choose the preset for the next run and persist it.
    ///
    /// Refused while a run is in progress.
    pub fn select_difficulty(&mut self, preset: DifficultyPreset) -> bool {
        if self.in_run() {
            return false;
        }
        self.settings.difficulty = preset;
        self.settings.save(&mut self.store);
        if self.phase == GamePhase::Idle {
            self.world = World::new(preset.profile(), self.field);
        }
        log::info!("Difficulty set to {}", preset.label());
        true
    }

    /// Resize the playfield for the next run. Refused while a run is in progress.
    pub fn set_field(&mut self, field: Field) -> bool {
        if self.in_run() {
            return false;
        }
        self.field = field;
        if self.phase == GamePhase::Idle {
            self.world = World::new(self.settings.difficulty.profile(), field);
        }
        true
    }

    /// Begin a fresh run. Legal from `Idle` or `Ended`.
    pub fn start(&mut self) -> bool {
        if self.in_run() {
            return false;
        }
        self.world = World::new(self.settings.difficulty.profile(), self.field);
        self.last_tick_ms = None;
        self.paused_at_ms = None;
        self.phase = GamePhase::Running;

        log::info!("Game started ({})", self.settings.difficulty.label());
        self.observer.on_game_start();
        self.observer.on_score_changed(0);
        true
    }

    /// Flap. Only does anything while running.
    pub fn activate_input(&mut self) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.world.avatar.activate(&self.world.profile);
        true
    }

    pub fn pause(&mut self, now_ms: f64) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.phase = GamePhase::Paused;
        self.paused_at_ms = Some(now_ms);
        log::info!("Paused at score {}", self.world.score);
        self.observer.on_pause();
        true
    }

    /// Resume, shifting every time base by the pause length so the run
    /// behaves as if no time passed.
    pub fn resume(&mut self, now_ms: f64) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        let paused_for = self
            .paused_at_ms
            .take()
            .map(|at| (now_ms - at).max(0.0))
            .unwrap_or(0.0);
        if let Some(last) = self.last_tick_ms.as_mut() {
            *last += paused_for;
        }
        self.world.obstacles.shift_spawn_clock(paused_for);
        self.phase = GamePhase::Running;

        log::info!("Resumed after {:.0} ms", paused_for);
        self.observer.on_resume();
        true
    }

    pub fn toggle_pause(&mut self, now_ms: f64) -> bool {
        match self.phase {
            GamePhase::Running => self.pause(now_ms),
            GamePhase::Paused => self.resume(now_ms),
            _ => false,
        }
    }

    /// Auto-pause when the window loses focus
    pub fn on_focus_lost(&mut self, now_ms: f64) -> bool {
        if self.phase == GamePhase::Running {
            log::info!("Auto-paused (focus lost)");
            return self.pause(now_ms);
        }
        false
    }

    /// Dispatch a logical command
    pub fn apply(&mut self, command: Command, now_ms: f64) -> bool {
        match command {
            Command::Start => self.start(),
            Command::Activate => self.activate_input(),
            Command::PauseToggle => self.toggle_pause(now_ms),
        }
    }

    /// Run one simulation tick at wall-clock time `now_ms`
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        if self.phase != GamePhase::Running {
            return TickOutcome::Halted;
        }

        let dt = match self.last_tick_ms {
            Some(last) => ((now_ms - last).max(0.0) / NOMINAL_FRAME_MS) as f32,
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);

        let report = step(&mut self.world, &mut self.rng, now_ms, dt);

        if report.scored > 0 {
            let score = self.world.score;
            self.observer.on_score_changed(score);
            if self.records.submit_score(score, &mut self.store) {
                self.observer.on_best_score_changed(score);
            }
        }

        match report.terminal {
            Some(cause) => {
                self.end_run(cause);
                TickOutcome::Ended
            }
            None => TickOutcome::Continue,
        }
    }

    fn end_run(&mut self, cause: Terminal) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.phase = GamePhase::Ended;

        let score = self.world.score;
        if self.records.submit_score(score, &mut self.store) {
            self.observer.on_best_score_changed(score);
        }
        self.records.record_game_played(&mut self.store);

        log::info!(
            "Game over ({:?}): score {}, best {}",
            cause,
            score,
            self.records.best_score
        );
        self.observer.on_game_over(score, self.records.best_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::GameEvent;
    use crate::persistence::{MemoryStore, keys};
    use crate::sim::Obstacle;
    use proptest::prelude::*;

    type TestSession = Session<MemoryStore, Vec<GameEvent>>;

    fn session() -> TestSession {
        Session::new(MemoryStore::new(), Vec::new(), 42)
    }

    fn game_overs(session: &TestSession) -> usize {
        session
            .observer()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }

    /// Tick at 60 Hz-ish frames until the run ends, returning the last timestamp
    fn run_until_ended(session: &mut TestSession, mut now: f64) -> f64 {
        for _ in 0..10_000 {
            now += 16.0;
            if session.tick(now) == TickOutcome::Ended {
                return now;
            }
        }
        panic!("run never ended");
    }

    #[test]
    fn test_starts_idle_with_defaults() {
        let session = session();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.best_score(), 0);
        assert_eq!(session.difficulty(), DifficultyPreset::Normal);
        assert!(session.observer().is_empty());
    }

    #[test]
    fn test_loads_persisted_state() {
        let mut store = MemoryStore::new();
        store.set(keys::BEST_SCORE, "31").unwrap();
        store.set(keys::DIFFICULTY, "hard").unwrap();
        let session = Session::new(store, Vec::<GameEvent>::new(), 1);
        assert_eq!(session.best_score(), 31);
        assert_eq!(session.difficulty(), DifficultyPreset::Hard);
    }

    #[test]
    fn test_unavailable_store_uses_defaults() {
        let mut session = Session::new(MemoryStore::unavailable(), Vec::<GameEvent>::new(), 1);
        assert_eq!(session.best_score(), 0);
        assert_eq!(session.difficulty(), DifficultyPreset::Normal);
        assert!(session.start());
        let _ = run_until_ended(&mut session, 0.0);
        assert_eq!(session.phase(), GamePhase::Ended);
    }

    #[test]
    fn test_start_resets_and_notifies() {
        let mut session = session();
        assert!(session.start());
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(
            session.observer().as_slice(),
            &[GameEvent::GameStarted, GameEvent::ScoreChanged(0)]
        );
        assert!(session.world().obstacles.is_empty());
        assert_eq!(session.world().avatar.pos.y, AVATAR_START_Y);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        session.tick(16.0);
        let y = session.world().avatar.pos.y;

        assert!(!session.start());
        assert_eq!(session.world().avatar.pos.y, y);
        assert_eq!(session.observer().len(), 2);

        session.pause(20.0);
        assert!(!session.start());
        assert_eq!(session.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_illegal_transitions_are_noops() {
        let mut session = session();
        assert!(!session.pause(0.0));
        assert!(!session.resume(0.0));
        assert!(!session.activate_input());
        assert_eq!(session.tick(0.0), TickOutcome::Halted);
        assert_eq!(session.phase(), GamePhase::Idle);
        assert!(session.observer().is_empty());
    }

    #[test]
    fn test_first_tick_has_zero_dt() {
        let mut session = session();
        session.start();
        assert_eq!(session.tick(123_456.0), TickOutcome::Continue);
        assert_eq!(session.world().avatar.pos.y, AVATAR_START_Y);
        assert_eq!(session.world().obstacles.last_spawn_ms, Some(123_456.0));
    }

    #[test]
    fn test_one_nominal_frame() {
        let mut session = session();
        session.start();
        session.tick(1000.0);
        session.tick(1016.0);
        let avatar = &session.world().avatar;
        assert!((avatar.velocity - 0.2).abs() < 1e-6);
        assert!((avatar.pos.y - 250.2).abs() < 1e-4);
    }

    #[test]
    fn test_long_frame_scales_physics() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        session.tick(300.0);
        // 300 ms is 18.75 nominal frames of gravity
        assert!((session.world().avatar.velocity - 3.75).abs() < 1e-5);
    }

    /// Gap between the first two obstacles when driven at `frame_ms` frames,
    /// with the avatar held in place
    fn obstacle_spacing(frame_ms: f64) -> f32 {
        let mut session = session();
        session.select_difficulty(DifficultyPreset::Endless);
        session.start();
        let mut now = 0.0;
        while session.world().obstacles.len() < 2 {
            session.world.avatar.pos.y = AVATAR_START_Y;
            session.world.avatar.velocity = 0.0;
            assert_eq!(session.tick(now), TickOutcome::Continue);
            now += frame_ms;
        }
        let xs: Vec<f32> = session.world().obstacles.iter().map(|o| o.x).collect();
        xs[0] - xs[1]
    }

    #[test]
    fn test_obstacle_spacing_ignores_frame_rate() {
        let smooth = obstacle_spacing(16.0);
        let choppy = obstacle_spacing(200.0);
        // Spawns land on frame boundaries, so allow one long frame of travel
        let one_frame = DifficultyPreset::Endless.profile().base_speed * (200.0 / 16.0);
        assert!(
            (smooth - choppy).abs() <= one_frame,
            "spacing {} at 16 ms vs {} at 200 ms",
            smooth,
            choppy
        );
    }

    #[test]
    fn test_activate_only_while_running() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        assert!(session.activate_input());
        assert_eq!(session.world().avatar.velocity, -4.2);

        session.pause(5.0);
        assert!(!session.activate_input());
    }

    #[test]
    fn test_ground_collision_ends_once() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        let end = run_until_ended(&mut session, 0.0);

        assert_eq!(session.phase(), GamePhase::Ended);
        assert_eq!(game_overs(&session), 1);
        let avatar = &session.world().avatar;
        assert_eq!(avatar.pos.y, session.field().ground_y() - avatar.size.y);

        // Ticking again before a restart does nothing
        assert_eq!(session.tick(end + 16.0), TickOutcome::Halted);
        assert_eq!(session.tick(end + 32.0), TickOutcome::Halted);
        assert_eq!(game_overs(&session), 1);
        assert_eq!(session.records().games_played, 1);
        assert_eq!(
            session.store().get(keys::GAMES_PLAYED).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_obstacle_collision_ends_run() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        session.world.avatar.pos.y = 100.0;
        session
            .world
            .obstacles
            .obstacles
            .push(Obstacle::new(100.0, 300.0, 140.0));

        assert_eq!(session.tick(16.0), TickOutcome::Ended);
        assert_eq!(session.phase(), GamePhase::Ended);
        assert_eq!(
            session.observer().last(),
            Some(&GameEvent::GameOver {
                final_score: 0,
                best_score: 0
            })
        );
    }

    #[test]
    fn test_scoring_updates_best_and_sinks() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        session.world.avatar.pos.y = 250.0;
        session
            .world
            .obstacles
            .obstacles
            .push(Obstacle::new(-38.0, 200.0, 140.0));

        assert_eq!(session.tick(16.0), TickOutcome::Continue);
        assert_eq!(session.score(), 1);
        assert_eq!(session.best_score(), 1);
        let tail = &session.observer()[2..];
        assert_eq!(
            tail,
            &[GameEvent::ScoreChanged(1), GameEvent::BestScoreChanged(1)]
        );
        assert_eq!(
            session.store().get(keys::BEST_SCORE).unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_best_score_survives_worse_run() {
        let mut store = MemoryStore::new();
        store.set(keys::BEST_SCORE, "9").unwrap();
        let mut session = Session::new(store, Vec::<GameEvent>::new(), 7);
        session.start();
        session.tick(0.0);
        let _ = run_until_ended(&mut session, 0.0);

        assert_eq!(session.best_score(), 9);
        assert_eq!(
            session.observer().last(),
            Some(&GameEvent::GameOver {
                final_score: 0,
                best_score: 9
            })
        );
        assert!(
            !session
                .observer()
                .iter()
                .any(|e| matches!(e, GameEvent::BestScoreChanged(_)))
        );
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut session = session();
        session.start();
        session.tick(0.0);
        let end = run_until_ended(&mut session, 0.0);

        assert!(session.start());
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.score(), 0);
        assert_eq!(session.world().avatar.pos.y, AVATAR_START_Y);
        assert_eq!(session.world().obstacles.last_spawn_ms, None);
        assert_eq!(session.tick(end + 5000.0), TickOutcome::Continue);
    }

    #[test]
    fn test_difficulty_selection_gated_and_persisted() {
        let mut session = session();
        assert!(session.select_difficulty(DifficultyPreset::Easy));
        assert_eq!(
            session.store().get(keys::DIFFICULTY).unwrap().as_deref(),
            Some("easy")
        );

        session.start();
        assert_eq!(session.world().profile, DifficultyPreset::Easy.profile());
        assert!(!session.select_difficulty(DifficultyPreset::Hard));
        session.pause(0.0);
        assert!(!session.select_difficulty(DifficultyPreset::Hard));
        assert_eq!(session.difficulty(), DifficultyPreset::Easy);

        session.resume(10.0);
        let _ = run_until_ended(&mut session, 10.0);
        assert!(session.select_difficulty(DifficultyPreset::Hard));
        // The finished run keeps its own copy
        assert_eq!(session.world().profile, DifficultyPreset::Easy.profile());
        session.start();
        assert_eq!(session.world().profile, DifficultyPreset::Hard.profile());
    }

    #[test]
    fn test_focus_loss_pauses_only_running() {
        let mut session = session();
        assert!(!session.on_focus_lost(0.0));

        session.start();
        assert!(session.on_focus_lost(10.0));
        assert_eq!(session.phase(), GamePhase::Paused);
        assert!(!session.on_focus_lost(20.0));
        assert_eq!(
            session.observer().last(),
            Some(&GameEvent::Paused)
        );
    }

    #[test]
    fn test_commands_dispatch() {
        let mut session = session();
        assert!(session.apply(Command::Start, 0.0));
        session.tick(0.0);
        assert!(session.apply(Command::Activate, 5.0));
        assert!(session.apply(Command::PauseToggle, 10.0));
        assert_eq!(session.phase(), GamePhase::Paused);
        assert!(session.apply(Command::PauseToggle, 900.0));
        assert_eq!(session.phase(), GamePhase::Running);
        assert_eq!(session.observer().last(), Some(&GameEvent::Resumed));
    }

    #[test]
    fn test_field_locked_during_run() {
        let mut session = session();
        let small = Field::for_viewport(360.0);
        assert!(session.set_field(small));
        session.start();
        assert_eq!(session.world().field, small);
        assert!(!session.set_field(Field::default()));
    }

    /// Drive two sessions over the same frames, one with a pause inserted
    fn paired_runs(pause_after: usize, pause_len: f64, frames: usize) -> (TestSession, TestSession) {
        let mut plain = Session::new(MemoryStore::new(), Vec::new(), 99);
        let mut paused = Session::new(MemoryStore::new(), Vec::new(), 99);
        plain.select_difficulty(DifficultyPreset::Endless);
        paused.select_difficulty(DifficultyPreset::Endless);
        plain.start();
        paused.start();

        let mut offset = 0.0;
        for frame in 0..frames {
            let now = frame as f64 * 16.0;
            // Keep both avatars airborne the same way
            if frame % 20 == 0 {
                plain.activate_input();
                paused.activate_input();
            }
            plain.tick(now);
            paused.tick(now + offset);

            if frame == pause_after {
                paused.pause(now + offset + 4.0);
                offset += pause_len;
                paused.resume(now + offset + 4.0);
            }
        }
        (plain, paused)
    }

    #[test]
    fn test_pause_is_time_neutral() {
        let (plain, paused) = paired_runs(30, 60_000.0, 200);
        assert_eq!(plain.phase(), paused.phase());
        assert_eq!(plain.world().avatar.pos, paused.world().avatar.pos);
        assert_eq!(plain.world().obstacles.len(), paused.world().obstacles.len());
        for (a, b) in plain
            .world()
            .obstacles
            .iter()
            .zip(paused.world().obstacles.iter())
        {
            assert_eq!(a, b);
        }
    }

    proptest! {
        /// Any pause length, taken at any frame, leaves the run unchanged
        #[test]
        fn prop_pause_invariance(
            pause_after in 0usize..150,
            pause_len in 0u32..10_000_000,
        ) {
            let (plain, paused) = paired_runs(pause_after, pause_len as f64, 160);
            prop_assert_eq!(plain.phase(), paused.phase());
            prop_assert_eq!(plain.score(), paused.score());
            prop_assert_eq!(plain.world().avatar.pos, paused.world().avatar.pos);
            prop_assert_eq!(plain.world().avatar.velocity, paused.world().avatar.velocity);
            prop_assert_eq!(plain.world().obstacles.len(), paused.world().obstacles.len());
            for (a, b) in plain.world().obstacles.iter().zip(paused.world().obstacles.iter()) {
                prop_assert_eq!(a.x, b.x);
                prop_assert_eq!(a.gap_top, b.gap_top);
            }
        }

        /// Score never decreases within a run, and the best score tracks it
        #[test]
        fn prop_score_monotonic(seed in 0u64..1000, flap_every in 8usize..30) {
            let mut session = Session::new(MemoryStore::new(), Vec::<GameEvent>::new(), seed);
            session.start();
            let mut last_score = 0;
            for frame in 0..3000usize {
                if frame % flap_every == 0 {
                    session.activate_input();
                }
                let outcome = session.tick(frame as f64 * 16.0);
                prop_assert!(session.score() >= last_score);
                prop_assert!(session.best_score() >= session.score());
                last_score = session.score();
                let avatar = &session.world().avatar;
                prop_assert!(avatar.pos.y >= 0.0);
                prop_assert!(avatar.pos.y <= session.field().ground_y() - avatar.size.y);
                if outcome != TickOutcome::Continue {
                    break;
                }
            }
        }
    }
}
