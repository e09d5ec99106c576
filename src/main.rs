//! Flappy Bird entry point
//!
//! Browser build: wires DOM events and `requestAnimationFrame` to a session.
//! Native build: runs one autopilot session headless and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlCanvasElement, KeyboardEvent, PointerEvent, TouchEvent};

    use flappy_bird::observer::SessionObserver;
    use flappy_bird::persistence::LocalStorage;
    use flappy_bird::platform::{RawInput, route};
    use flappy_bird::renderer::SceneRenderer;
    use flappy_bird::sim::{Field, autopilot};
    use flappy_bird::{DifficultyPreset, GamePhase, Session, TickOutcome};
    use glam::Vec2;

    /// Quiet period after the last resize event before refitting (ms)
    const RESIZE_SETTLE_MS: i32 = 250;

    /// DOM HUD: score line, game-over panel and pause overlay
    struct HudSink {
        document: Document,
    }

    impl HudSink {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_shown(&self, id: &str, shown: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("show", shown);
            }
        }
    }

    impl SessionObserver for HudSink {
        fn on_score_changed(&mut self, score: u32) {
            self.set_text("score", &score.to_string());
        }

        fn on_best_score_changed(&mut self, best: u32) {
            self.set_text("best", &best.to_string());
        }

        fn on_game_over(&mut self, final_score: u32, best_score: u32) {
            self.set_text("finalScore", &final_score.to_string());
            self.set_text("bestScore", &best_score.to_string());
            self.set_shown("gameOver", true);
        }

        fn on_game_start(&mut self) {
            self.set_shown("gameOver", false);
            self.set_shown("pauseOverlay", false);
        }

        fn on_pause(&mut self) {
            self.set_shown("pauseOverlay", true);
        }

        fn on_resume(&mut self) {
            self.set_shown("pauseOverlay", false);
        }
    }

    /// Everything the browser callbacks share
    struct Game {
        session: Session<LocalStorage, HudSink>,
        renderer: Option<SceneRenderer>,
        canvas: HtmlCanvasElement,
        /// An animation frame is already scheduled
        frame_pending: bool,
        /// Autopilot plays instead of the player
        demo: bool,
        /// Pending debounced refit after a window resize
        resize_timer: Option<i32>,
    }

    impl Game {
        fn render(&mut self, time: f64) {
            let phase = self.session.phase();
            if let Some(ref mut renderer) = self.renderer {
                match renderer.render(self.session.world(), phase, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        renderer.resize(renderer.size.0, renderer.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Size the canvas for the current viewport. Ignored mid-run.
        fn fit_to_viewport(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let viewport = window
                .inner_width()
                .ok()
                .and_then(|w| w.as_f64())
                .unwrap_or(flappy_bird::consts::MAX_FIELD_WIDTH as f64);
            let field = Field::for_viewport(viewport as f32);
            if !self.session.set_field(field) {
                return;
            }

            let dpr = window.device_pixel_ratio();
            let width = (field.width as f64 * dpr) as u32;
            let height = (field.height as f64 * dpr) as u32;
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            let _ = self.canvas.set_attribute(
                "style",
                &format!("width:{}px;height:{}px", field.width, field.height),
            );
            if let Some(ref mut renderer) = self.renderer {
                renderer.resize(width, height);
            }
        }
    }

    fn now_ms() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Flappy Bird starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let seed = js_sys::Date::now() as u64;
        let hud = HudSink {
            document: document.clone(),
        };
        let session = Session::new(LocalStorage, hud, seed);
        hud_show_best(&document, session.best_score());
        mark_active_difficulty(&document, session.difficulty());

        let game = Rc::new(RefCell::new(Game {
            session,
            renderer: None,
            canvas: canvas.clone(),
            frame_pending: false,
            demo: false,
            resize_timer: None,
        }));
        game.borrow_mut().fit_to_viewport();

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match SceneRenderer::new(surface, &adapter, canvas.width(), canvas.height()).await {
            Ok(mut renderer) => {
                renderer.set_epoch(now_ms());
                game.borrow_mut().renderer = Some(renderer);
            }
            Err(e) => log::error!("Could not create GPU device: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_difficulty_buttons(&document, game.clone());
        setup_auto_pause(game.clone());
        setup_resize(game.clone());

        // Idle scene; the loop only runs once a game starts
        game.borrow_mut().render(now_ms());

        log::info!("Flappy Bird running!");
    }

    fn hud_show_best(document: &Document, best: u32) {
        if let Some(el) = document.get_element_by_id("best") {
            el.set_text_content(Some(&best.to_string()));
        }
    }

    fn mark_active_difficulty(document: &Document, preset: DifficultyPreset) {
        let Ok(buttons) = document.query_selector_all(".difficulty-btn") else {
            return;
        };
        for i in 0..buttons.length() {
            let Some(btn) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let active = btn.get_attribute("data-difficulty").as_deref() == Some(preset.as_str());
            let _ = btn.class_list().toggle_with_force("active", active);
        }
    }

    /// Route a physical input through the session and keep the loop alive
    fn handle_input(game: &Rc<RefCell<Game>>, input: RawInput) {
        let now = now_ms();
        let applied = {
            let mut g = game.borrow_mut();
            let phase = g.session.phase();
            match route(phase, &input) {
                Some(command) => g.session.apply(command, now),
                None => false,
            }
        };
        if applied {
            after_transition(game, now);
        }
    }

    /// Redraw a static frame and (re)start the loop if a run is active
    fn after_transition(game: &Rc<RefCell<Game>>, now: f64) {
        let needs_frame = {
            let mut g = game.borrow_mut();
            g.render(now);
            g.session.phase() == GamePhase::Running && !g.frame_pending
        };
        if needs_frame {
            request_animation_frame(game.clone());
        }
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Pointer press (mouse, pen, touch)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                // Canvas CSS pixels are field units
                if event.pointer_type() == "touch" {
                    let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                    if let Some(renderer) = game.borrow_mut().renderer.as_mut() {
                        renderer.show_tap(pos, now_ms());
                    }
                }
                handle_input(&game, RawInput::PointerDown);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start: only suppress scrolling and zoom, pointerdown does the work
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if code == "KeyD" {
                    toggle_demo(&game);
                    return;
                }
                if flappy_bird::platform::is_action_key(&code) {
                    event.prevent_default();
                }
                handle_input(&game, RawInput::Key(code));
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn toggle_demo(game: &Rc<RefCell<Game>>) {
        let now = now_ms();
        let started = {
            let mut g = game.borrow_mut();
            g.demo = !g.demo;
            log::info!("Demo mode: {}", g.demo);
            g.demo && g.session.start()
        };
        if started {
            after_transition(game, now);
        }
    }

    fn setup_difficulty_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        let Ok(buttons) = document.query_selector_all(".difficulty-btn") else {
            return;
        };
        for i in 0..buttons.length() {
            let Some(btn) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let Some(preset) = btn
                .get_attribute("data-difficulty")
                .and_then(|name| DifficultyPreset::from_str(&name))
            else {
                log::warn!("Difficulty button without a known data-difficulty");
                continue;
            };

            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if g.session.select_difficulty(preset) {
                    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                        mark_active_difficulty(&document, preset);
                    }
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        game.borrow_mut().frame_pending = true;
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = {
            let mut g = game.borrow_mut();
            g.frame_pending = false;

            if g.demo
                && g.session.phase() == GamePhase::Running
                && autopilot::wants_activation(g.session.world())
            {
                g.session.activate_input();
            }

            let outcome = g.session.tick(time);
            g.render(time);
            outcome == TickOutcome::Continue
        };

        if keep_going {
            request_animation_frame(game);
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let now = now_ms();
                    let paused = game.borrow_mut().session.on_focus_lost(now);
                    if paused {
                        after_transition(&game, now);
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let now = now_ms();
                let paused = game.borrow_mut().session.on_focus_lost(now);
                if paused {
                    after_transition(&game, now);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Refit once the window has stopped resizing for a moment
    fn setup_resize(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Some(handle) = game.borrow_mut().resize_timer.take() {
                window.clear_timeout_with_handle(handle);
            }

            let settled = game.clone();
            let refit = Closure::once_into_js(move || {
                let mut g = settled.borrow_mut();
                g.resize_timer = None;
                g.fit_to_viewport();
                g.render(now_ms());
            });
            match window.set_timeout_with_callback_and_timeout_and_arguments_0(
                refit.unchecked_ref(),
                RESIZE_SETTLE_MS,
            ) {
                Ok(handle) => game.borrow_mut().resize_timer = Some(handle),
                Err(e) => log::warn!("Could not schedule resize: {:?}", e),
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{SystemTime, UNIX_EPOCH};

    use flappy_bird::observer::GameEvent;
    use flappy_bird::persistence::{FileStore, KeyValueStore, MemoryStore};
    use flappy_bird::sim::autopilot;
    use flappy_bird::{DifficultyPreset, GamePhase, Session, TickOutcome};

    /// Simulated display refresh
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Game-time cap for one headless run
    const MAX_RUN_MS: f64 = 5.0 * 60.0 * 1000.0;
    const DEFAULT_STORE: &str = "flappy_bird_store.json";

    pub struct Options {
        pub difficulty: Option<DifficultyPreset>,
        pub seed: u64,
    }

    impl Options {
        /// Positional args: `[difficulty] [seed]`
        pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
            let difficulty = args.next().and_then(|name| {
                let preset = DifficultyPreset::from_str(&name);
                if preset.is_none() {
                    log::warn!("Unknown difficulty {:?}, keeping saved preference", name);
                }
                preset
            });
            let seed = args
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| {
                    SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_millis() as u64)
                        .unwrap_or(0)
                });
            Self { difficulty, seed }
        }
    }

    pub struct RunSummary {
        pub score: u32,
        pub best_score: u32,
        pub games_played: u32,
        pub game_time_ms: f64,
        pub ended: bool,
    }

    /// Play one autopilot run on a simulated clock
    pub fn play<S: KeyValueStore>(
        session: &mut Session<S, Vec<GameEvent>>,
        difficulty: Option<DifficultyPreset>,
    ) -> RunSummary {
        if let Some(preset) = difficulty {
            session.select_difficulty(preset);
        }

        let mut now = 0.0;
        session.start();
        let mut outcome = session.tick(now);
        while outcome == TickOutcome::Continue && now < MAX_RUN_MS {
            now += FRAME_MS;
            if autopilot::wants_activation(session.world()) {
                session.activate_input();
            }
            outcome = session.tick(now);
        }

        RunSummary {
            score: session.score(),
            best_score: session.best_score(),
            games_played: session.records().games_played,
            game_time_ms: now,
            ended: session.phase() == GamePhase::Ended,
        }
    }

    pub fn run(options: Options) {
        let path = std::env::var("FLAPPY_STORE").unwrap_or_else(|_| DEFAULT_STORE.to_string());
        let summary = match FileStore::open(&path) {
            Ok(store) => {
                let mut session = Session::new(store, Vec::new(), options.seed);
                play(&mut session, options.difficulty)
            }
            Err(e) => {
                log::warn!("Could not open store {}: {}, records will not persist", path, e);
                let mut session = Session::new(MemoryStore::new(), Vec::new(), options.seed);
                play(&mut session, options.difficulty)
            }
        };

        log::info!(
            "Run finished after {:.1}s of game time{}",
            summary.game_time_ms / 1000.0,
            if summary.ended { "" } else { " (time cap)" }
        );
        println!(
            "score {}  best {}  games played {}",
            summary.score, summary.best_score, summary.games_played
        );
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flappy Bird (native) starting...");
    log::info!("Native mode runs the autopilot headless - use `trunk serve` to play in a browser");

    headless::run(headless::Options::from_args(std::env::args().skip(1)));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser builds start from `wasm_main`
}
