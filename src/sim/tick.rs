//! Per-frame driver
//!
//! Converts wall-clock frame deltas into fixed physics steps, resolves
//! contacts after each step, and runs the phase machine on the frame's input.

use glam::Vec2;

use super::camera::Camera;
use super::collision::{ContactOutcome, WeldRules, on_contact};
use super::lifecycle::{despawn_fallen, evaluate_topple, reset, spawn_monkey};
use super::physics::Side;
use super::state::{Aim, GameEvent, GameSession, Phase};
use crate::consts::MAX_FRAME_MS;

/// Input sampled once per frame
#[derive(Debug, Clone)]
pub struct FrameInput {
    /// Pointer position in pixels, origin top-left
    pub pointer: Vec2,
    pub screen_size: Vec2,
    /// Confirm (mouse button / space) went down this frame
    pub confirm_down: bool,
    /// Confirm was released this frame
    pub confirm_up: bool,
    /// Cancel (escape) went down this frame
    pub cancel_down: bool,
    /// Debug overlay key is held
    pub debug_held: bool,
}

impl Default for FrameInput {
    fn default() -> Self {
        Self {
            pointer: Vec2::ZERO,
            screen_size: Vec2::new(
                crate::consts::WINDOW_WIDTH as f32,
                crate::consts::WINDOW_HEIGHT as f32,
            ),
            confirm_down: false,
            confirm_up: false,
            cancel_down: false,
            debug_held: false,
        }
    }
}

impl FrameInput {
    pub fn aspect(&self) -> f32 {
        let size = self.screen_size.max(Vec2::ONE);
        size.x / size.y
    }
}

/// Whole steps owed after adding `elapsed_ms`; the remainder stays in the
/// accumulator. A step is taken only while strictly more than one threshold
/// is pending.
pub fn consume_ticks(accumulator: &mut u64, elapsed_ms: u64, threshold_ms: u64) -> u32 {
    *accumulator += elapsed_ms;
    let mut steps = 0;
    while *accumulator > threshold_ms {
        *accumulator -= threshold_ms;
        steps += 1;
    }
    steps
}

/// One fixed physics step followed by contact resolution
pub fn step_physics(session: &mut GameSession) {
    let rules = WeldRules::from_tuning(&session.tuning);
    let contacts = session.world.step();
    for contact in &contacts {
        if let ContactOutcome::Welded { .. } = on_contact(&mut session.world, contact, &rules) {
            let count = session.score.increment();
            session.events.push(GameEvent::Grabbed { count });
        }
    }
    session.world.flush_post_step();
}

/// Camera for the current title progress and screen shape
pub fn camera_for(session: &GameSession, aspect: f32) -> Camera {
    Camera::for_title(session.title_progress(), aspect)
}

/// Advance the session by one rendered frame. Returns the number of physics
/// steps taken.
pub fn advance_frame(session: &mut GameSession, input: &FrameInput, elapsed_ms: u64) -> u32 {
    let elapsed_ms = elapsed_ms.min(MAX_FRAME_MS);
    session.now += elapsed_ms;
    session.debug_draw = input.debug_held;

    let threshold = session.tuning.tick_threshold_ms;
    let steps = consume_ticks(&mut session.accumulator, elapsed_ms, threshold);
    for _ in 0..steps {
        step_physics(session);
    }
    despawn_fallen(session);

    match session.phase {
        Phase::Title { entered, exiting } => update_title(session, input, entered, exiting),
        Phase::Playing => {
            if !evaluate_topple(session) {
                update_playing(session, input);
            }
        }
        Phase::GameOver { .. } => update_game_over(session, input),
    }
    steps
}

fn update_title(session: &mut GameSession, input: &FrameInput, entered: u64, exiting: Option<u64>) {
    let progress = session.title_progress();
    match exiting {
        None => {
            if input.cancel_down {
                request_quit(session);
            } else if input.confirm_up && progress > session.tuning.confirm_progress {
                session.phase = Phase::Title {
                    entered,
                    exiting: Some(session.now),
                };
                log::debug!("Leaving title");
            }
        }
        Some(_) => {
            if progress <= 0.0 {
                session.phase = Phase::Playing;
                log::info!("Round started");
            }
        }
    }
}

fn update_game_over(session: &mut GameSession, input: &FrameInput) {
    let progress = session.game_over_progress();
    let confirmed = input.confirm_up && progress > session.tuning.confirm_progress;
    if confirmed || input.cancel_down {
        reset(session);
        session.phase = Phase::Title {
            entered: session.now,
            exiting: None,
        };
    }
}

fn request_quit(session: &mut GameSession) {
    if !session.quit {
        session.quit = true;
        session.events.push(GameEvent::Quit);
        log::info!("Quit requested");
    }
}

fn update_playing(session: &mut GameSession, input: &FrameInput) {
    let camera = camera_for(session, input.aspect());
    let target = camera.screen_to_world(input.pointer, input.screen_size);
    let side = Side::from_sign(crate::side_sign(target.x));
    let height = target.y.clamp(session.tuning.aim_min_y, session.tuning.aim_max_y);

    // Quit needs a second cancel inside the window; confirm while the prompt
    // shows shoves the tree instead of throwing
    let mut confirm_down = input.confirm_down;
    if session.quit_prompt_active() {
        if input.cancel_down {
            request_quit(session);
            return;
        }
        if confirm_down {
            let (impulse, point) = (session.tuning.nudge_impulse, session.tuning.nudge_point);
            session.world.apply_impulse_at(session.tree, impulse, point);
            session.charge_started = None;
            confirm_down = false;
            log::debug!("Tree nudged");
        }
    } else if input.cancel_down {
        session.quit_armed = Some(session.now);
    } else {
        session.quit_armed = None;
    }

    if confirm_down {
        session.charge_started = Some(session.now);
    }

    let mut charge = 0.0;
    if let Some(started) = session.charge_started {
        let held = session.since(started);
        if held > session.tuning.charge_delay_ms {
            let phase = held as f32 / session.tuning.charge_period_ms as f32;
            charge = (1.0 - phase.cos()) * 0.5;
            if input.confirm_up {
                spawn_monkey(session, side, height, charge);
                session.charge_started = None;
            }
        } else if input.confirm_up {
            // A tap shorter than the charge delay throws nothing
            session.charge_started = None;
        }
    }

    session.aim = Aim {
        side,
        point: Vec2::new(side.sign() * session.tuning.aim_x, height),
        charge,
    };
}
