//! Easing curves over normalized time

/// Slow start, fast finish
pub fn in_cubic(t: f32) -> f32 {
    t * t * t
}

pub fn in_quad(t: f32) -> f32 {
    t * t
}

/// Overshoots the end and settles with decaying bounces
pub fn out_bounce(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}
