//! Drawing interface
//!
//! The scene is described as draw calls against [`Display`]; backends (the
//! browser canvas, the recording display used headless and in tests) turn
//! them into pixels or data.
//!
//! Coordinates: inside `push_ortho`/`pop_ortho` everything is in world units.
//! Outside, it is screen pixels with the origin at the bottom-left, y up.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod recorder;
pub mod scene;

use glam::Vec2;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasDisplay;
pub use recorder::{DrawCommand, RecordingDisplay};
pub use scene::draw_frame;

/// Linear RGBA
pub type Color = [f32; 4];

/// Colors for game elements
pub mod colors {
    use super::Color;

    pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];
    pub const BLACK: Color = [0.0, 0.0, 0.0, 1.0];
    pub const RED: Color = [1.0, 0.0, 0.0, 1.0];
    pub const YELLOW: Color = [1.0, 1.0, 0.0, 1.0];
    pub const DEBUG_SHAPE: Color = [0.0, 1.0, 0.0, 0.8];
    pub const DEBUG_JOINT: Color = [1.0, 0.5, 0.0, 1.0];

    /// Gray level with alpha
    pub const fn luma(l: f32, a: f32) -> Color {
        [l, l, l, a]
    }

    pub const fn rgb(c: [f32; 3]) -> Color {
        [c[0], c[1], c[2], 1.0]
    }
}

/// Art assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Hill,
    Tree,
    Monkey,
    Logo,
}

impl Sprite {
    /// Asset path relative to the game root
    pub fn path(self) -> &'static str {
        match self {
            Sprite::Hill => "Data/hill.png",
            Sprite::Tree => "Data/tree.png",
            Sprite::Monkey => "Data/monkey.png",
            Sprite::Logo => "Data/logo.png",
        }
    }

    pub const ALL: [Sprite; 4] = [Sprite::Hill, Sprite::Tree, Sprite::Monkey, Sprite::Logo];
}

/// Minimal 2D drawing surface
pub trait Display {
    /// Screen size in pixels
    fn size(&self) -> Vec2;

    /// Rectangle with per-corner colors: top-left, top-right, bottom-left,
    /// bottom-right
    fn fill_gradient(&mut self, min: Vec2, max: Vec2, corners: [Color; 4]);

    fn fill_rect(&mut self, min: Vec2, max: Vec2, color: Color);

    /// Map the world rectangle `min..max` onto the whole screen
    fn push_ortho(&mut self, min: Vec2, max: Vec2);

    fn pop_ortho(&mut self);

    /// Sprite centered at `pos`; a negative scale mirrors that axis
    fn draw_sprite(&mut self, sprite: Sprite, pos: Vec2, rotation: f32, scale: Vec2, tint: Color);

    /// Text centered at `pos`
    fn draw_text(&mut self, text: &str, pos: Vec2, scale: f32, color: Color);

    /// Thick line as a filled quad with an outline
    fn draw_wide_line(&mut self, from: Vec2, to: Vec2, width: f32, outline: Color, fill: Color);

    fn draw_triangle(&mut self, points: [Vec2; 3], outline: Color, fill: Color);

    fn draw_circle(&mut self, center: Vec2, radius: f32, outline: Color, fill: Option<Color>);

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color);
}
