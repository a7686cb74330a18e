//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed physics step driven by a millisecond accumulator
//! - Seeded RNG only
//! - Stable iteration order (bodies and joints keyed by id)
//! - No rendering or platform dependencies

pub mod camera;
pub mod collision;
pub mod easing;
pub mod lifecycle;
pub mod physics;
pub mod score;
pub mod state;
pub mod tick;

pub use camera::Camera;
pub use collision::{ContactOutcome, WeldRules, on_contact};
pub use lifecycle::{build_world, despawn_fallen, evaluate_topple, reset, spawn_monkey};
pub use physics::{
    BodyDesc, BodyId, BodyKind, ContactEvent, JointId, JointKind, PhysicsWorld, PinSpring,
    PivotMotor, Pose, PostStepCommand, ShapeDesc, Side,
};
pub use score::Score;
pub use state::{Aim, GameEvent, GameSession, Phase, SkyPalette, Ticks};
pub use tick::{FrameInput, advance_frame, camera_for, consume_ticks, step_physics};
