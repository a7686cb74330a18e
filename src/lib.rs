//! Super Monkey Call - fling monkeys at a tree until it topples
//!
//! Core modules:
//! - `sim`: Fixed-step gameplay (physics adapter, weld policy, session, phases)
//! - `renderer`: Draw-call interface and the per-frame scene
//! - `audio`: Sound effect interface and backends
//! - `tuning`: Data-driven gameplay constants
//! - `settings`: Player preferences

pub mod audio;
pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Wall-clock milliseconds consumed per physics step
    pub const TICK_MS: u64 = 16;
    /// Physics step length relative to `TICK_MS` (the world runs at double speed)
    pub const STEP_SCALE: f32 = 2.0;
    /// Longest frame delta fed to the simulation; slower frames run slow-motion
    pub const MAX_FRAME_MS: u64 = 250;

    /// Window defaults
    pub const WINDOW_TITLE: &str = "Super Monkey Call";
    pub const WINDOW_WIDTH: u32 = 1280;
    pub const WINDOW_HEIGHT: u32 = 720;

    /// Sprite scales (art is authored at a fixed pixel size)
    pub const HILL_SPRITE_SCALE: f32 = 0.5;
    pub const TREE_SPRITE_SCALE: f32 = 0.55;
    pub const MONKEY_SPRITE_SCALE: f32 = 0.4;
    /// Monkey art radius in pixels at scale 1
    pub const MONKEY_SPRITE_RADIUS: f32 = 12.0;
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Sign that treats zero as positive (the right-hand side of the screen)
#[inline]
pub fn side_sign(x: f32) -> f32 {
    if x < 0.0 { -1.0 } else { 1.0 }
}

/// Rotate a vector by an angle in radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}
