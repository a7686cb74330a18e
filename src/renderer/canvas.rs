//! Canvas 2D backend for the browser

use glam::Vec2;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::{Color, Display, Sprite};

/// Font size in pixels at text scale 1
const FONT_PX: f64 = 48.0;

fn css(color: Color) -> String {
    let [r, g, b, a] = color;
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("rgba({},{},{},{:.3})", byte(r), byte(g), byte(b), a.clamp(0.0, 1.0))
}

fn average(a: Color, b: Color) -> Color {
    [
        (a[0] + b[0]) * 0.5,
        (a[1] + b[1]) * 0.5,
        (a[2] + b[2]) * 0.5,
        (a[3] + b[3]) * 0.5,
    ]
}

/// Draws onto an HTML canvas; images load lazily and are skipped until ready
pub struct CanvasDisplay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: Vec<(Sprite, HtmlImageElement)>,
    ortho_depth: usize,
    /// Pixels per unit of the active ortho, 1 outside
    units_scale: f64,
}

impl CanvasDisplay {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        let mut images = Vec::new();
        for sprite in Sprite::ALL {
            match HtmlImageElement::new() {
                Ok(img) => {
                    img.set_src(sprite.path());
                    images.push((sprite, img));
                }
                Err(_) => log::warn!("Could not create image for {:?}", sprite),
            }
        }
        Self {
            canvas,
            ctx,
            images,
            ortho_depth: 0,
            units_scale: 1.0,
        }
    }

    fn image(&self, sprite: Sprite) -> Option<&HtmlImageElement> {
        self.images
            .iter()
            .find(|(s, img)| *s == sprite && img.complete() && img.natural_width() > 0)
            .map(|(_, img)| img)
    }

    /// Pixel space with the origin at the bottom-left, y up
    fn reset_transform(&self) {
        let h = self.canvas.height() as f64;
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, -1.0, 0.0, h);
    }

    /// Prepare for a new frame
    pub fn begin_frame(&mut self) {
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        self.ortho_depth = 0;
        self.units_scale = 1.0;
        self.reset_transform();
    }

    fn trace_polygon(&self, points: &[Vec2]) {
        self.ctx.begin_path();
        if let Some(first) = points.first() {
            self.ctx.move_to(first.x as f64, first.y as f64);
            for p in &points[1..] {
                self.ctx.line_to(p.x as f64, p.y as f64);
            }
        }
        self.ctx.close_path();
    }

    /// One screen pixel in current units, so outlines stay thin
    fn pixel(&self) -> f64 {
        1.0 / self.units_scale.max(1e-6)
    }
}

impl Display for CanvasDisplay {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn fill_gradient(&mut self, min: Vec2, max: Vec2, corners: [Color; 4]) {
        // Canvas only does linear gradients: blend top and bottom pairs
        let top = average(corners[0], corners[1]);
        let bottom = average(corners[2], corners[3]);
        let gradient = self
            .ctx
            .create_linear_gradient(0.0, max.y as f64, 0.0, min.y as f64);
        let _ = gradient.add_color_stop(0.0, &css(top));
        let _ = gradient.add_color_stop(1.0, &css(bottom));
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.fill_rect(
            min.x as f64,
            min.y as f64,
            (max.x - min.x) as f64,
            (max.y - min.y) as f64,
        );
    }

    fn fill_rect(&mut self, min: Vec2, max: Vec2, color: Color) {
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_rect(
            min.x as f64,
            min.y as f64,
            (max.x - min.x) as f64,
            (max.y - min.y) as f64,
        );
    }

    fn push_ortho(&mut self, min: Vec2, max: Vec2) {
        self.ctx.save();
        let size = self.size();
        let sx = (size.x / (max.x - min.x)) as f64;
        let sy = (size.y / (max.y - min.y)) as f64;
        let _ = self.ctx.set_transform(
            sx,
            0.0,
            0.0,
            -sy,
            -(min.x as f64) * sx,
            (max.y as f64) * sy,
        );
        self.ortho_depth += 1;
        self.units_scale = sx;
    }

    fn pop_ortho(&mut self) {
        if self.ortho_depth > 0 {
            self.ctx.restore();
            self.ortho_depth -= 1;
            self.units_scale = 1.0;
        }
    }

    fn draw_sprite(&mut self, sprite: Sprite, pos: Vec2, rotation: f32, scale: Vec2, tint: Color) {
        let Some(img) = self.image(sprite) else { return };
        let w = img.natural_width() as f64;
        let h = img.natural_height() as f64;
        self.ctx.save();
        let _ = self.ctx.translate(pos.x as f64, pos.y as f64);
        let _ = self.ctx.rotate(rotation as f64);
        // Images are stored y-down
        let _ = self.ctx.scale(scale.x as f64, -scale.y as f64);
        self.ctx.set_global_alpha(tint[3] as f64);
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_dw_and_dh(img, -w / 2.0, -h / 2.0, w, h);
        self.ctx.restore();
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, scale: f32, color: Color) {
        self.ctx.save();
        let _ = self.ctx.translate(pos.x as f64, pos.y as f64);
        let _ = self.ctx.scale(1.0, -1.0);
        self.ctx
            .set_font(&format!("bold {}px sans-serif", (FONT_PX * scale as f64).round()));
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(&css(color));
        let _ = self.ctx.fill_text(text, 0.0, 0.0);
        self.ctx.restore();
    }

    fn draw_wide_line(&mut self, from: Vec2, to: Vec2, width: f32, outline: Color, fill: Color) {
        let dir = (to - from).normalize_or_zero();
        let normal = dir.perp() * width;
        self.trace_polygon(&[from + normal, to + normal, to - normal, from - normal]);
        self.ctx.set_fill_style_str(&css(fill));
        self.ctx.fill();
        self.ctx.set_stroke_style_str(&css(outline));
        self.ctx.set_line_width(self.pixel());
        self.ctx.stroke();
    }

    fn draw_triangle(&mut self, points: [Vec2; 3], outline: Color, fill: Color) {
        self.trace_polygon(&points);
        self.ctx.set_fill_style_str(&css(fill));
        self.ctx.fill();
        self.ctx.set_stroke_style_str(&css(outline));
        self.ctx.set_line_width(self.pixel());
        self.ctx.stroke();
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, outline: Color, fill: Option<Color>) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        if let Some(fill) = fill {
            self.ctx.set_fill_style_str(&css(fill));
            self.ctx.fill();
        }
        self.ctx.set_stroke_style_str(&css(outline));
        self.ctx.set_line_width(self.pixel());
        self.ctx.stroke();
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(self.pixel());
        self.ctx.stroke();
    }
}
