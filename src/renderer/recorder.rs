//! Display that records draw calls instead of rasterizing them

use glam::Vec2;

use super::{Color, Display, Sprite};

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Gradient { min: Vec2, max: Vec2, corners: [Color; 4] },
    Rect { min: Vec2, max: Vec2, color: Color },
    PushOrtho { min: Vec2, max: Vec2 },
    PopOrtho,
    Sprite { sprite: Sprite, pos: Vec2, rotation: f32, scale: Vec2, tint: Color },
    Text { text: String, pos: Vec2, scale: f32, color: Color },
    WideLine { from: Vec2, to: Vec2, width: f32 },
    Triangle { points: [Vec2; 3] },
    Circle { center: Vec2, radius: f32, filled: bool },
    Line { from: Vec2, to: Vec2, color: Color },
}

#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    size: Vec2,
    commands: Vec<DrawCommand>,
    depth: usize,
    max_depth: usize,
}

impl RecordingDisplay {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
            depth: 0,
            max_depth: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Forget recorded calls, e.g. between frames
    pub fn clear(&mut self) {
        self.commands.clear();
        self.depth = 0;
        self.max_depth = 0;
    }

    /// Current ortho nesting; 0 when every push was popped
    pub fn ortho_depth(&self) -> usize {
        self.depth
    }

    pub fn max_ortho_depth(&self) -> usize {
        self.max_depth
    }

    /// All text drawn in the given color
    pub fn texts_in(&self, color: Color) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, color: c, .. } if *c == color => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == needle))
    }

    pub fn sprites(&self, sprite: Sprite) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { sprite: s, .. } if *s == sprite))
            .count()
    }
}

impl Display for RecordingDisplay {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fill_gradient(&mut self, min: Vec2, max: Vec2, corners: [Color; 4]) {
        self.commands.push(DrawCommand::Gradient { min, max, corners });
    }

    fn fill_rect(&mut self, min: Vec2, max: Vec2, color: Color) {
        self.commands.push(DrawCommand::Rect { min, max, color });
    }

    fn push_ortho(&mut self, min: Vec2, max: Vec2) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.commands.push(DrawCommand::PushOrtho { min, max });
    }

    fn pop_ortho(&mut self) {
        if self.depth == 0 {
            log::warn!("pop_ortho without matching push");
        }
        self.depth = self.depth.saturating_sub(1);
        self.commands.push(DrawCommand::PopOrtho);
    }

    fn draw_sprite(&mut self, sprite: Sprite, pos: Vec2, rotation: f32, scale: Vec2, tint: Color) {
        self.commands.push(DrawCommand::Sprite {
            sprite,
            pos,
            rotation,
            scale,
            tint,
        });
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, scale: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            scale,
            color,
        });
    }

    fn draw_wide_line(&mut self, from: Vec2, to: Vec2, width: f32, _outline: Color, _fill: Color) {
        self.commands.push(DrawCommand::WideLine { from, to, width });
    }

    fn draw_triangle(&mut self, points: [Vec2; 3], _outline: Color, _fill: Color) {
        self.commands.push(DrawCommand::Triangle { points });
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, _outline: Color, fill: Option<Color>) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            filled: fill.is_some(),
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }
}
