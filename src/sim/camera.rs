//! World viewport derived from the title transition

use glam::Vec2;

use super::easing::in_cubic;

/// Orthographic view of the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center: Vec2,
    pub half_height: f32,
    /// Width over height of the screen
    pub aspect: f32,
}

impl Camera {
    /// Camera for a title progress in [0, 1]: zoomed out on the whole tree
    /// at 0, pulled up and in on the crown at 1
    pub fn for_title(title: f32, aspect: f32) -> Self {
        let e = in_cubic(crate::clamp01(title));
        Self {
            center: Vec2::new(0.0, 100.0 + e * 120.0),
            half_height: 200.0 - e * 100.0,
            aspect,
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.half_height * self.aspect, self.half_height)
    }

    /// Bottom-left corner in world space
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents()
    }

    /// Top-right corner in world space
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents()
    }

    /// Map a pointer position (pixels, origin top-left, y down) to the world
    pub fn screen_to_world(&self, screen: Vec2, screen_size: Vec2) -> Vec2 {
        let size = screen_size.max(Vec2::ONE);
        let u = screen.x / size.x;
        let v = screen.y / size.y;
        let min = self.min();
        let max = self.max();
        Vec2::new(min.x + u * (max.x - min.x), max.y - v * (max.y - min.y))
    }

    /// Inverse of [`Camera::screen_to_world`]
    pub fn world_to_screen(&self, world: Vec2, screen_size: Vec2) -> Vec2 {
        let min = self.min();
        let max = self.max();
        let u = (world.x - min.x) / (max.x - min.x);
        let v = (max.y - world.y) / (max.y - min.y);
        Vec2::new(u * screen_size.x, v * screen_size.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_title_endpoints() {
        let start = Camera::for_title(0.0, 16.0 / 9.0);
        assert_eq!(start.center, Vec2::new(0.0, 100.0));
        assert_eq!(start.half_height, 200.0);

        let end = Camera::for_title(1.0, 2.0);
        assert_eq!(end.center, Vec2::new(0.0, 220.0));
        assert_eq!(end.half_extents(), Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_screen_corners() {
        let cam = Camera::for_title(1.0, 2.0);
        let size = Vec2::new(800.0, 400.0);
        assert_eq!(cam.screen_to_world(Vec2::ZERO, size), Vec2::new(-200.0, 320.0));
        assert_eq!(cam.screen_to_world(size, size), Vec2::new(200.0, 120.0));
        assert_eq!(cam.screen_to_world(size * 0.5, size), Vec2::new(0.0, 220.0));
    }

    proptest! {
        #[test]
        fn screen_mapping_inverts(x in 0.0f32..1280.0, y in 0.0f32..720.0, title in 0.0f32..=1.0) {
            let size = Vec2::new(1280.0, 720.0);
            let cam = Camera::for_title(title, size.x / size.y);
            let back = cam.world_to_screen(cam.screen_to_world(Vec2::new(x, y), size), size);
            prop_assert!((back - Vec2::new(x, y)).length() < 0.05);
        }
    }
}
