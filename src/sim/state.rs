//! Game session state
//!
//! Everything that changes while playing lives in [`GameSession`]: the physics
//! world, score, phase, input timers and the seeded RNG. Frontends only read
//! it for drawing and feed it [`super::FrameInput`]s.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::lifecycle::build_world;
use super::physics::{BodyId, PhysicsWorld, Side};
use super::score::Score;
use crate::Tuning;

/// Millisecond clock driven by frame deltas
pub type Ticks = u64;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Title screen; `exiting` is set once the player asked to start
    Title {
        entered: Ticks,
        exiting: Option<Ticks>,
    },
    Playing,
    /// The tree fell over
    GameOver { entered: Ticks },
}

/// Things that happened during a frame, for sound and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Thrown { side: Side },
    Grabbed { count: u32 },
    GameOver { count: u32 },
    Quit,
}

/// Four background gradient corners: top-left, top-right, bottom-left,
/// bottom-right
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPalette {
    pub corners: [[f32; 3]; 4],
}

impl SkyPalette {
    /// Dark blue-ish corners: red and green below 0.4, blue in [0.4, 0.8)
    pub fn random(rng: &mut Pcg32) -> Self {
        let mut corners = [[0.0; 3]; 4];
        for corner in &mut corners {
            *corner = [
                rng.random_range(0.0..0.4),
                rng.random_range(0.0..0.4),
                rng.random_range(0.4..0.8),
            ];
        }
        Self { corners }
    }
}

/// Where the next monkey will be thrown from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub side: Side,
    /// Spawn-side point the arrow starts from
    pub point: Vec2,
    /// Charge fraction in [0, 1]
    pub charge: f32,
}

impl Default for Aim {
    fn default() -> Self {
        Self {
            side: Side::Right,
            point: Vec2::new(200.0, 150.0),
            charge: 0.0,
        }
    }
}

/// A running game
pub struct GameSession {
    pub tuning: Tuning,
    pub world: PhysicsWorld,
    pub ground: BodyId,
    pub tree: BodyId,
    pub score: Score,
    pub sky: SkyPalette,
    pub phase: Phase,
    /// Milliseconds since the session started
    pub now: Ticks,
    /// Milliseconds not yet consumed by physics steps
    pub accumulator: u64,
    /// When the current charge started, if the button is held
    pub charge_started: Option<Ticks>,
    /// When cancel was first pressed during play
    pub quit_armed: Option<Ticks>,
    pub aim: Aim,
    /// Draw collision shapes and joints
    pub debug_draw: bool,
    /// Set once the player asked to leave the game
    pub quit: bool,
    /// Events since the frontend last drained them
    pub events: Vec<GameEvent>,
    pub seed: u64,
    pub(crate) rng: Pcg32,
}

impl GameSession {
    /// Fresh session on the title screen
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let sky = SkyPalette::random(&mut rng);
        let (world, ground, tree) = build_world(&tuning);
        log::info!("New session (seed {})", seed);
        Self {
            tuning,
            world,
            ground,
            tree,
            score: Score::new(),
            sky,
            phase: Phase::Title {
                entered: 0,
                exiting: None,
            },
            now: 0,
            accumulator: 0,
            charge_started: None,
            quit_armed: None,
            aim: Aim::default(),
            debug_draw: false,
            quit: false,
            events: Vec::new(),
            seed,
            rng,
        }
    }

    /// Milliseconds elapsed since `t`
    pub fn since(&self, t: Ticks) -> u64 {
        self.now.saturating_sub(t)
    }

    fn ease_fraction(&self, t: Ticks) -> f32 {
        crate::clamp01(self.since(t) as f32 / self.tuning.ease_ms as f32)
    }

    /// Title overlay visibility: rises to 1 after entering, falls back to 0
    /// while exiting, 0 outside the title
    pub fn title_progress(&self) -> f32 {
        match self.phase {
            Phase::Title {
                entered,
                exiting: None,
            } => self.ease_fraction(entered),
            Phase::Title {
                exiting: Some(exiting),
                ..
            } => 1.0 - self.ease_fraction(exiting),
            _ => 0.0,
        }
    }

    /// Game-over overlay progress, 0 outside game over
    pub fn game_over_progress(&self) -> f32 {
        match self.phase {
            Phase::GameOver { entered } => self.ease_fraction(entered),
            _ => 0.0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// True while a second cancel would quit
    pub fn quit_prompt_active(&self) -> bool {
        self.quit_armed
            .is_some_and(|t| self.since(t) < self.tuning.quit_confirm_ms)
    }

    /// Hand queued events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn random_scale(&mut self) -> f32 {
        self.rng.random_range(self.tuning.monkey_scale.clone())
    }

    pub(crate) fn reroll_sky(&mut self) {
        self.sky = SkyPalette::random(&mut self.rng);
    }
}
