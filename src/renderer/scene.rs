//! Per-frame scene composition
//!
//! Reads the session and issues draw calls; never mutates gameplay state.

use glam::Vec2;

use super::colors::{self, luma, rgb};
use super::{Color, Display, Sprite};
use crate::consts::{HILL_SPRITE_SCALE, MONKEY_SPRITE_RADIUS, MONKEY_SPRITE_SCALE, TREE_SPRITE_SCALE};
use crate::sim::easing::{in_quad, out_bounce};
use crate::sim::physics::{BodyKind, JointKind, ShapeDesc, Side};
use crate::sim::state::{GameSession, Phase};
use crate::sim::tick::camera_for;

const HILL_POS: Vec2 = Vec2::new(0.0, -60.0);

/// Text with a solid border made of eight offset copies
pub fn draw_text_bordered(
    display: &mut impl Display,
    text: &str,
    pos: Vec2,
    scale: f32,
    fill: Color,
    border: f32,
) {
    for i in 0..9 {
        if i == 4 {
            continue;
        }
        let offset = Vec2::new((i % 3 - 1) as f32, (i / 3 - 1) as f32) * border;
        display.draw_text(text, pos + offset, scale, colors::BLACK);
    }
    display.draw_text(text, pos, scale, fill);
}

/// Draw the whole frame for the current session state
pub fn draw_frame(session: &GameSession, display: &mut impl Display) {
    let size = display.size();
    let aspect = size.x / size.y.max(1.0);
    let camera = camera_for(session, aspect);

    let sky = session.sky.corners.map(rgb);
    display.fill_gradient(Vec2::ZERO, size, sky);

    display.push_ortho(camera.min(), camera.max());
    draw_world(session, display);
    if session.debug_draw {
        draw_debug(session, display);
    }
    if session.is_playing() {
        draw_aim(session, display);
    }
    display.pop_ortho();

    match session.phase {
        Phase::GameOver { .. } => draw_game_over(session, display, size),
        Phase::Playing => draw_hud(session, display, size),
        Phase::Title { exiting, .. } => draw_title(session, display, size, exiting.is_some()),
    }
}

fn draw_world(session: &GameSession, display: &mut impl Display) {
    let world = &session.world;
    if let Some(pose) = world.pose(session.tree) {
        display.draw_sprite(
            Sprite::Tree,
            pose.position,
            pose.angle,
            Vec2::splat(TREE_SPRITE_SCALE),
            colors::WHITE,
        );
    }
    display.draw_sprite(Sprite::Hill, HILL_POS, 0.0, Vec2::splat(HILL_SPRITE_SCALE), colors::WHITE);

    for (id, record) in world.bodies() {
        let BodyKind::Monkey { side } = record.kind else {
            continue;
        };
        let Some(pose) = world.pose(id) else { continue };
        let radius = match record.shapes.first() {
            Some(ShapeDesc::Circle { radius }) => *radius,
            _ => MONKEY_SPRITE_RADIUS,
        };
        let size = radius / MONKEY_SPRITE_RADIUS * MONKEY_SPRITE_SCALE;
        // Thrown from the left: mirror so it faces the tree
        let flip = if side == Side::Left { -1.0 } else { 1.0 };
        display.draw_sprite(
            Sprite::Monkey,
            pose.position,
            pose.angle,
            Vec2::new(size * flip, size),
            colors::WHITE,
        );
    }

    // Fade the hill base into darkness
    display.fill_gradient(
        Vec2::new(-1000.0, -100.0),
        Vec2::new(1000.0, 0.0),
        [luma(0.0, 0.0), luma(0.0, 0.0), luma(0.0, 1.0), luma(0.0, 1.0)],
    );
}

fn draw_debug(session: &GameSession, display: &mut impl Display) {
    let world = &session.world;
    display.draw_line(Vec2::new(-10_000.0, 0.0), Vec2::new(10_000.0, 0.0), luma(0.5, 1.0));
    display.draw_line(Vec2::new(0.0, -10_000.0), Vec2::new(0.0, 10_000.0), luma(0.5, 1.0));

    for (id, record) in world.bodies() {
        let Some(pose) = world.pose(id) else { continue };
        for shape in &record.shapes {
            match *shape {
                ShapeDesc::Circle { radius } => {
                    display.draw_circle(pose.position, radius, colors::DEBUG_SHAPE, None);
                }
                ShapeDesc::Box {
                    center,
                    half_extents,
                } => {
                    let corners = [
                        Vec2::new(-half_extents.x, -half_extents.y),
                        Vec2::new(half_extents.x, -half_extents.y),
                        Vec2::new(half_extents.x, half_extents.y),
                        Vec2::new(-half_extents.x, half_extents.y),
                    ]
                    .map(|c| pose.local_to_world(center + c));
                    for i in 0..4 {
                        display.draw_line(corners[i], corners[(i + 1) % 4], colors::WHITE);
                    }
                }
            }
        }
        display.draw_circle(pose.position, 3.0, colors::RED, Some(colors::RED));
        let facing = pose.position + crate::rotate(Vec2::new(10.0, 0.0), pose.angle);
        display.draw_line(pose.position, facing, colors::YELLOW);
    }

    for joint in world.joints() {
        display.draw_line(joint.anchor_a, joint.anchor_b, colors::DEBUG_JOINT);
        if joint.kind == JointKind::Pin {
            display.draw_circle(joint.anchor_a, 2.0, colors::DEBUG_JOINT, Some(colors::DEBUG_JOINT));
            display.draw_circle(joint.anchor_b, 2.0, colors::DEBUG_JOINT, Some(colors::DEBUG_JOINT));
        }
    }
}

fn draw_aim(session: &GameSession, display: &mut impl Display) {
    let aim = session.aim;
    let side = aim.side.sign();
    let head = aim.point - Vec2::new(session.tuning.aim_x * aim.charge * side, 0.0);
    display.draw_wide_line(aim.point, head, 5.0, colors::YELLOW, colors::RED);
    display.draw_triangle(
        [
            head - Vec2::new(0.0, 10.0),
            head - Vec2::new(10.0 * side, 0.0),
            head + Vec2::new(0.0, 10.0),
        ],
        colors::YELLOW,
        colors::RED,
    );
    display.draw_circle(aim.point, 5.0, colors::YELLOW, Some(colors::RED));
}

fn draw_hud(session: &GameSession, display: &mut impl Display, size: Vec2) {
    let half = size * 0.5;
    draw_text_bordered(display, session.score.text(), Vec2::new(half.x, 100.0), 1.0, colors::WHITE, 2.0);
    if session.quit_prompt_active() {
        draw_text_bordered(display, "PRESS ESC AGAIN TO QUIT", half, 1.0, colors::WHITE, 2.0);
    }
}

fn draw_game_over(session: &GameSession, display: &mut impl Display, size: Vec2) {
    let half = size * 0.5;
    let up = 400.0 - out_bounce(session.game_over_progress()) * 400.0;
    draw_text_bordered(display, "GAME OVER", Vec2::new(half.x, half.y + 120.0 - up), 1.1, colors::RED, 4.0);
    draw_text_bordered(
        display,
        session.score.text(),
        Vec2::new(half.x, half.y - up * 0.9),
        0.9,
        colors::YELLOW,
        4.0,
    );
    draw_text_bordered(
        display,
        "CLICK TO RETURN TO TITLE",
        Vec2::new(half.x, half.y - 100.0 - up * 0.8),
        0.8,
        colors::WHITE,
        4.0,
    );
}

fn draw_title(session: &GameSession, display: &mut impl Display, size: Vec2, exiting: bool) {
    let title = session.title_progress();
    let half = size * 0.5;
    display.fill_rect(Vec2::ZERO, size, luma(0.0, title * 0.3));

    let eased = if exiting { in_quad(title) } else { out_bounce(title) };
    let up = 450.0 - eased * 450.0;

    // Logo drop shadow
    for i in 0..9 {
        if i == 4 {
            continue;
        }
        let pos = Vec2::new(
            half.x - 3.0 + 8.0 * (i / 3) as f32,
            half.y + 150.0 + 3.0 - 8.0 * (i % 3) as f32 + up * 0.9,
        );
        display.draw_sprite(Sprite::Logo, pos, 0.0, Vec2::ONE, luma(0.0, 0.5));
    }
    display.draw_sprite(Sprite::Logo, Vec2::new(half.x, half.y + 150.0 + up), 0.0, Vec2::ONE, colors::WHITE);

    draw_text_bordered(display, "CLICK TO START", Vec2::new(half.x, 200.0 - up), 1.0, colors::YELLOW, 4.0);
    draw_text_bordered(
        display,
        "HOLD LEFT MOUSE BUTTON TO FLING MONKEYS",
        Vec2::new(half.x, 120.0 - up * 0.8),
        0.8,
        colors::WHITE,
        4.0,
    );

    // Spinning monkeys in the top corners
    let spin = session.now as f32 / 1000.0;
    let top = size.y - 150.0;
    let right = size.x - 150.0;
    let shadow = luma(0.0, 0.5);
    display.draw_sprite(Sprite::Monkey, Vec2::new(right + 10.0 + up, top - 10.0), spin, Vec2::splat(2.0), shadow);
    display.draw_sprite(Sprite::Monkey, Vec2::new(160.0 - up, top - 10.0), -spin, Vec2::new(-2.0, 2.0), shadow);
    display.draw_sprite(Sprite::Monkey, Vec2::new(right + up, top), spin, Vec2::splat(2.0), colors::WHITE);
    display.draw_sprite(Sprite::Monkey, Vec2::new(150.0 - up, top), -spin, Vec2::new(-2.0, 2.0), colors::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::renderer::{DrawCommand, RecordingDisplay};
    use crate::sim::lifecycle::spawn_monkey;

    fn display() -> RecordingDisplay {
        RecordingDisplay::new(Vec2::new(1280.0, 720.0))
    }

    #[test]
    fn test_title_frame() {
        let mut session = GameSession::new(Tuning::default(), 5);
        session.now = 1500;
        let mut d = display();
        draw_frame(&session, &mut d);

        assert!(matches!(&d.commands()[0], DrawCommand::Gradient { min, .. } if *min == Vec2::ZERO));
        assert_eq!(d.ortho_depth(), 0);
        assert_eq!(d.max_ortho_depth(), 1);
        assert!(d.has_text("CLICK TO START"));
        assert!(d.has_text("HOLD LEFT MOUSE BUTTON TO FLING MONKEYS"));
        assert_eq!(d.sprites(Sprite::Logo), 9);
        assert_eq!(d.sprites(Sprite::Monkey), 4);
        assert_eq!(d.sprites(Sprite::Tree), 1);
        // No aim arrow outside play
        assert!(!d.commands().iter().any(|c| matches!(c, DrawCommand::WideLine { .. })));
    }

    #[test]
    fn test_playing_frame_shows_hud_and_monkeys() {
        let mut session = GameSession::new(Tuning::default(), 5);
        session.phase = Phase::Playing;
        spawn_monkey(&mut session, Side::Left, 120.0, 0.0);
        spawn_monkey(&mut session, Side::Right, 120.0, 0.0);
        session.score.increment();

        let mut d = display();
        draw_frame(&session, &mut d);
        assert_eq!(d.texts_in(colors::WHITE), vec!["1"]);
        assert!(!d.has_text("PRESS ESC AGAIN TO QUIT"));
        assert_eq!(d.sprites(Sprite::Monkey), 2);

        // Left-thrown monkey is mirrored
        let mirrored = d
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { sprite: Sprite::Monkey, scale, .. } if scale.x < 0.0))
            .count();
        assert_eq!(mirrored, 1);
        assert!(d.commands().iter().any(|c| matches!(c, DrawCommand::WideLine { .. })));
    }

    #[test]
    fn test_aim_arrow_grows_with_charge_toward_tree() {
        let mut session = GameSession::new(Tuning::default(), 5);
        session.phase = Phase::Playing;
        session.aim.side = Side::Right;
        session.aim.point = Vec2::new(200.0, 150.0);
        session.aim.charge = 0.5;

        let mut d = display();
        draw_frame(&session, &mut d);
        let head = Vec2::new(200.0 - session.tuning.aim_x * 0.5, 150.0);
        assert!(d.commands().iter().any(|c| matches!(
            c,
            DrawCommand::WideLine { from, to, width }
                if *from == Vec2::new(200.0, 150.0) && (*to - head).length() < 1e-4 && *width == 5.0
        )));
        assert!(d.commands().iter().any(|c| matches!(c, DrawCommand::Triangle { .. })));
        assert!(d.commands().iter().any(|c| matches!(
            c,
            DrawCommand::Circle { center, radius, filled: true }
                if *center == Vec2::new(200.0, 150.0) && *radius == 5.0
        )));
    }

    #[test]
    fn test_quit_prompt_drawn_while_armed() {
        let mut session = GameSession::new(Tuning::default(), 5);
        session.phase = Phase::Playing;
        session.now = 200;
        session.quit_armed = Some(100);
        let mut d = display();
        draw_frame(&session, &mut d);
        assert!(d.has_text("PRESS ESC AGAIN TO QUIT"));
    }

    #[test]
    fn test_game_over_frame() {
        let mut session = GameSession::new(Tuning::default(), 5);
        session.score.increment();
        session.score.increment();
        session.score.finalize();
        session.phase = Phase::GameOver { entered: 0 };
        session.now = 2000;

        let mut d = display();
        draw_frame(&session, &mut d);
        assert_eq!(d.texts_in(colors::RED), vec!["GAME OVER"]);
        assert_eq!(d.texts_in(colors::YELLOW), vec!["YOU HAD 2 MONKEYS ON THE TREE!"]);
        assert!(d.has_text("CLICK TO RETURN TO TITLE"));
        // Eight border copies plus the fill for each of three lines
        let texts = d
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { .. }))
            .count();
        assert_eq!(texts, 27);
    }

    #[test]
    fn test_debug_overlay_draws_joints() {
        let mut session = GameSession::new(Tuning::default(), 5);
        session.phase = Phase::Playing;
        session.debug_draw = true;
        let mut d = display();
        draw_frame(&session, &mut d);
        let joint_lines = d
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { color, .. } if *color == colors::DEBUG_JOINT))
            .count();
        assert_eq!(joint_lines, 1);
    }
}
