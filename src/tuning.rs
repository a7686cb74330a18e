//! Data-driven game balance
//!
//! Every gameplay constant lives here so a JSON file can override any subset.

use std::ops::Range;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Damping ratio of weld pins: (1 - 0.001)^60
pub const DEFAULT_PIN_SOFTNESS: f32 = 0.941_736_3;
/// Natural frequency of weld pins in Hz
pub const DEFAULT_PIN_FREQUENCY: f32 = 10.0;

/// Axis-aligned box in a body's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl LocalBox {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }
}

/// Gameplay tuning values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub gravity: Vec2,
    /// Accumulated milliseconds that trigger one physics step
    pub tick_threshold_ms: u64,
    /// Physics step length as a multiple of the threshold
    pub step_scale: f32,

    // === Ground / hill ===
    pub ground_center: Vec2,
    pub ground_size: Vec2,
    pub ground_friction: f32,

    // === Tree ===
    pub tree_position: Vec2,
    pub tree_mass: f32,
    /// Radius of the disc used for the tree's moment of inertia
    pub tree_moment_radius: f32,
    pub trunk: LocalBox,
    pub crown: LocalBox,
    /// World point where the tree is pinned to the ground
    pub pivot_point: Vec2,
    /// Largest force the pivot exerts to keep the trunk foot in place; the
    /// hill carries the rest
    pub pivot_max_force: f32,
    pub pivot_stiffness: f32,
    pub pivot_damping: f32,
    /// Tree rotation magnitude (radians) past which the tree has toppled
    pub topple_angle: f32,

    // === Monkeys ===
    pub monkey_mass: f32,
    pub monkey_moment_radius: f32,
    pub monkey_radius: f32,
    pub monkey_scale: Range<f32>,
    pub spawn_x: f32,
    /// Monkeys below this height are discarded
    pub fall_threshold: f32,
    pub throw_base_speed: f32,
    pub throw_charge_speed: f32,
    /// Vertical offset of each weld pin from the contact point
    pub pin_offset: f32,
    /// Margin kept between a welded monkey and the surface it hit
    pub weld_margin: f32,
    /// Damping ratio of weld pins; below 1 they give a little on impact
    pub pin_softness: f32,
    /// How fast weld pins spring back, in Hz
    pub pin_frequency: f32,

    // === Aiming ===
    pub aim_x: f32,
    pub aim_min_y: f32,
    pub aim_max_y: f32,
    pub charge_delay_ms: u64,
    pub charge_period_ms: u64,

    // === Timers ===
    pub ease_ms: u64,
    pub quit_confirm_ms: u64,
    /// Progress past which a confirm click is accepted on title/game over
    pub confirm_progress: f32,

    // === Easter egg ===
    pub nudge_impulse: Vec2,
    pub nudge_point: Vec2,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -98.7),
            tick_threshold_ms: crate::consts::TICK_MS,
            step_scale: crate::consts::STEP_SCALE,

            ground_center: Vec2::new(0.0, -100.0),
            ground_size: Vec2::new(50.0, 200.0),
            ground_friction: 1.0,

            tree_position: Vec2::new(0.0, 100.0),
            tree_mass: 50.0,
            tree_moment_radius: 50.0,
            trunk: LocalBox::new(-10.0, -100.0, 10.0, 100.0),
            crown: LocalBox::new(-70.0, 100.0, 70.0, 130.0),
            pivot_point: Vec2::new(0.0, 1.0),
            pivot_max_force: 1000.0,
            pivot_stiffness: 100_000.0,
            pivot_damping: 5000.0,
            topple_angle: 1.0,

            monkey_mass: 3.0,
            monkey_moment_radius: 5.0,
            monkey_radius: 12.0,
            monkey_scale: 0.8..1.25,
            spawn_x: 300.0,
            fall_threshold: -200.0,
            throw_base_speed: 100.0,
            throw_charge_speed: 200.0,
            pin_offset: 3.0,
            weld_margin: 1.0,
            pin_softness: DEFAULT_PIN_SOFTNESS,
            pin_frequency: DEFAULT_PIN_FREQUENCY,

            aim_x: 200.0,
            aim_min_y: 50.0,
            aim_max_y: 250.0,
            charge_delay_ms: 100,
            charge_period_ms: 500,

            ease_ms: 1000,
            quit_confirm_ms: 1000,
            confirm_progress: 0.8,

            nudge_impulse: Vec2::new(10_000.0, 0.0),
            nudge_point: Vec2::new(0.0, 200.0),
        }
    }
}

impl Tuning {
    /// Physics step length in seconds
    pub fn step_dt(&self) -> f32 {
        self.step_scale * self.tick_threshold_ms as f32 / 1000.0
    }

    /// Throw speed for a charge fraction in [0, 1]
    pub fn throw_speed(&self, charge: f32) -> f32 {
        self.throw_base_speed + crate::clamp01(charge) * self.throw_charge_speed
    }

    /// Parse from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load from a JSON file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path);
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.gravity.x,
            self.gravity.y,
            self.step_scale,
            self.tree_mass,
            self.monkey_mass,
            self.monkey_radius,
            self.topple_angle,
            self.fall_threshold,
            self.pivot_max_force,
            self.pin_softness,
            self.pin_frequency,
            self.throw_base_speed,
            self.throw_charge_speed,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("non-finite value".into()));
        }
        if self.tick_threshold_ms == 0 || self.step_scale <= 0.0 {
            return Err(ConfigError::Invalid("step length must be positive".into()));
        }
        if self.tree_mass <= 0.0 || self.monkey_mass <= 0.0 || self.monkey_radius <= 0.0 {
            return Err(ConfigError::Invalid("masses and radii must be positive".into()));
        }
        if self.monkey_scale.is_empty() || self.monkey_scale.start <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "monkey scale range {:?} is empty",
                self.monkey_scale
            )));
        }
        if self.aim_min_y > self.aim_max_y {
            return Err(ConfigError::Invalid("aim range is inverted".into()));
        }
        if self.topple_angle <= 0.0 || self.charge_period_ms == 0 || self.ease_ms == 0 {
            return Err(ConfigError::Invalid("thresholds must be positive".into()));
        }
        if self.pin_softness <= 0.0 || self.pin_frequency <= 0.0 {
            return Err(ConfigError::Invalid("weld pins need positive softness and frequency".into()));
        }
        for b in [self.trunk, self.crown] {
            if b.min.x >= b.max.x || b.min.y >= b.max.y {
                return Err(ConfigError::Invalid(format!("degenerate box {:?}", b)));
            }
        }
        Ok(())
    }
}
