//! Super Monkey Call entry point
//!
//! Natively the game runs headless: a scripted player throws monkeys until the
//! tree falls and the draw calls go to a recording display. In the browser it
//! draws to a 2D canvas.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use monkey_call::audio::{AudioSink, WebAudio, dispatch_events};
    use monkey_call::renderer::{CanvasDisplay, Display, draw_frame};
    use monkey_call::sim::{FrameInput, GameSession, advance_frame};
    use monkey_call::{Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        session: GameSession,
        display: CanvasDisplay,
        audio: WebAudio,
        input: FrameInput,
        settings: Settings,
        last_time: f64,
        music_started: bool,
    }

    impl Game {
        /// Audio may only start after a user gesture
        fn on_gesture(&mut self) {
            self.audio.resume();
            if !self.music_started {
                self.audio.start_music();
                self.music_started = true;
            }
        }

        fn frame(&mut self, time: f64) {
            let elapsed = if self.last_time > 0.0 {
                (time - self.last_time).max(0.0) as u64
            } else {
                0
            };
            self.last_time = time;

            self.display.begin_frame();
            self.input.screen_size = self.display.size();
            advance_frame(&mut self.session, &self.input, elapsed);
            draw_frame(&self.session, &mut self.display);

            let events = self.session.drain_events();
            dispatch_events(&events, &mut self.audio);
            self.audio.update();

            // Edges last one frame
            self.input.confirm_down = false;
            self.input.confirm_up = false;
            self.input.cancel_down = false;
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Super Monkey Call starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        let settings = Settings::load();
        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        let mut audio = WebAudio::new();
        audio.set_volumes(
            settings.master_volume,
            settings.sfx_volume,
            settings.music_volume,
            settings.muted,
        );
        document.set_title(&settings.title);

        let game = Rc::new(RefCell::new(Game {
            session: GameSession::new(Tuning::default(), seed),
            display: CanvasDisplay::new(canvas.clone(), ctx),
            audio,
            input: FrameInput::default(),
            settings,
            last_time: 0.0,
            music_started: false,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&window, &canvas, game.clone());
        request_animation_frame(game);
        Ok(())
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) {
        // Pointer move
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                g.input.pointer = glam::Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                g.on_gesture();
                g.input.pointer = glam::Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                if event.button() == 0 {
                    g.input.confirm_down = true;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                if event.button() == 0 {
                    game.borrow_mut().input.confirm_up = true;
                }
            });
            let _ = window
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.on_gesture();
                match event.key().as_str() {
                    "Escape" => g.input.cancel_down = true,
                    "Shift" => g.input.debug_held = g.settings.debug_overlay,
                    " " | "Enter" if !event.repeat() => {
                        event.prevent_default();
                        g.input.confirm_down = true;
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "Shift" => g.input.debug_held = false,
                    " " | "Enter" => g.input.confirm_up = true,
                    _ => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let quit = {
            let mut g = game.borrow_mut();
            g.frame(time);
            g.session.quit
        };

        if quit {
            let g = game.borrow();
            g.settings.save();
            log::info!("Bye! {} monkeys on the tree", g.session.score.count());
            return;
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().inspect_err(|e| log::error!("Startup failed: {:?}", e))
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use monkey_call::audio::{AudioSink, LogAudio, dispatch_events};
    use monkey_call::renderer::{Display, RecordingDisplay, draw_frame};
    use monkey_call::sim::{FrameInput, GameSession, Phase, Side, advance_frame, camera_for};

    /// Simulated frame length
    const FRAME_MS: u64 = 16;
    /// Give up after ten minutes of game time
    const FRAME_LIMIT: u32 = 10 * 60 * 1000 / FRAME_MS as u32;

    /// Scripted player: leaves the title, then alternates sides, holding the
    /// throw for a random time and aiming at a random height.
    struct Autopilot {
        rng: Pcg32,
        side: Side,
        height: f32,
        /// Game time at which the next press or release happens
        next_at: u64,
        holding: bool,
    }

    impl Autopilot {
        fn new(seed: u64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed ^ 0x5eed),
                side: Side::Left,
                height: 0.0,
                next_at: 0,
                holding: false,
            }
        }

        fn input(&mut self, session: &GameSession, screen_size: Vec2) -> FrameInput {
            let mut input = FrameInput {
                screen_size,
                ..FrameInput::default()
            };
            match session.phase {
                Phase::Title { exiting: None, .. } => {
                    input.confirm_up = session.title_progress() > session.tuning.confirm_progress;
                }
                Phase::Title { .. } | Phase::GameOver { .. } => {}
                Phase::Playing => {
                    if session.now >= self.next_at {
                        if self.holding {
                            input.confirm_up = true;
                            self.side = match self.side {
                                Side::Left => Side::Right,
                                Side::Right => Side::Left,
                            };
                            self.next_at = session.now + self.rng.random_range(200..600);
                        } else {
                            input.confirm_down = true;
                            let tuning = &session.tuning;
                            self.height = self.rng.random_range(tuning.aim_min_y..tuning.aim_max_y);
                            self.next_at = session.now + self.rng.random_range(300..1200);
                        }
                        self.holding = !self.holding;
                    }
                }
            }

            let target = Vec2::new(self.side.sign() * session.tuning.aim_x, self.height);
            let camera = camera_for(session, input.aspect());
            input.pointer = camera.world_to_screen(target, screen_size);
            input
        }
    }

    /// Play one round; returns the final monkey count
    pub fn run(session: &mut GameSession, audio: &mut LogAudio) -> u32 {
        let mut display = RecordingDisplay::new(FrameInput::default().screen_size);
        let mut pilot = Autopilot::new(session.seed);
        audio.start_music();

        for frame in 0..FRAME_LIMIT {
            let input = pilot.input(session, display.size());
            advance_frame(session, &input, FRAME_MS);

            display.clear();
            draw_frame(session, &mut display);
            dispatch_events(&session.drain_events(), audio);

            if let Phase::GameOver { .. } = session.phase {
                log::info!(
                    "Tree fell after {} frames ({} physics steps)",
                    frame + 1,
                    session.world.steps()
                );
                return session.score.count();
            }
            if session.quit {
                break;
            }
        }
        log::warn!("Tree still standing after {} frames", FRAME_LIMIT);
        session.score.count()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use monkey_call::audio::{AudioSink, LogAudio};
    use monkey_call::sim::GameSession;
    use monkey_call::{Settings, Tuning};

    env_logger::init();
    log::info!("Super Monkey Call (native, headless) starting...");

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Bad settings: {}", e);
            std::process::exit(1);
        }
    };
    let tuning = match std::env::var("MONKEY_CALL_TUNING") {
        Ok(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Bad tuning: {}", e);
                std::process::exit(1);
            }
        },
        Err(_) => Tuning::default(),
    };

    let seed = settings.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    log::info!("Seed: {}", seed);

    let mut audio = LogAudio::default();
    audio.set_volumes(
        settings.master_volume,
        settings.sfx_volume,
        settings.music_volume,
        settings.muted,
    );

    let mut session = GameSession::new(tuning, seed);
    let count = headless::run(&mut session, &mut audio);
    log::info!("{}", session.score.text());
    log::info!("{} monkeys, {} sounds played", count, audio.played.len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
