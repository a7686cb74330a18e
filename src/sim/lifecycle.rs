//! Creating and discarding bodies: world setup, throws, falls and toppling

use glam::Vec2;

use super::physics::{
    BodyDesc, BodyId, BodyKind, PhysicsWorld, PinSpring, PivotMotor, PostStepCommand, ShapeDesc,
    Side, moment_for_circle,
};
use super::state::{GameEvent, GameSession, Phase};
use crate::Tuning;
use crate::tuning::LocalBox;

fn box_shape(b: &LocalBox) -> ShapeDesc {
    ShapeDesc::Box {
        center: b.center(),
        half_extents: b.half_extents(),
    }
}

/// Build the hill and the tree pinned on top of it
pub fn build_world(tuning: &Tuning) -> (PhysicsWorld, BodyId, BodyId) {
    let mut world = PhysicsWorld::new(tuning.gravity, tuning.step_dt());
    world.set_pin_spring(PinSpring::from_softness(tuning.pin_softness, tuning.pin_frequency));

    let ground = world.add_body(BodyDesc::fixed(BodyKind::Ground).with_position(tuning.ground_center));
    world.add_shape(
        ground,
        ShapeDesc::Box {
            center: Vec2::ZERO,
            half_extents: tuning.ground_size * 0.5,
        },
        tuning.ground_friction,
    );

    let tree = world.add_body(
        BodyDesc::dynamic(
            BodyKind::Tree,
            tuning.tree_mass,
            moment_for_circle(tuning.tree_mass, 0.0, tuning.tree_moment_radius),
        )
        .with_position(tuning.tree_position),
    );
    world.add_shape(tree, box_shape(&tuning.trunk), 0.0);
    world.add_shape(tree, box_shape(&tuning.crown), 0.0);

    let motor = PivotMotor {
        max_force: tuning.pivot_max_force,
        stiffness: tuning.pivot_stiffness,
        damping: tuning.pivot_damping,
    };
    if world.add_pivot(tree, ground, tuning.pivot_point, motor).is_none() {
        log::warn!("Tree pivot could not be created");
    }

    (world, ground, tree)
}

/// Start a new round: fresh world, zero score, new sky
pub fn reset(session: &mut GameSession) {
    let (world, ground, tree) = build_world(&session.tuning);
    session.world = world;
    session.ground = ground;
    session.tree = tree;
    session.score.reset();
    session.reroll_sky();
    session.charge_started = None;
    session.quit_armed = None;
    session.accumulator = 0;
    log::info!("Round reset");
}

/// Throw a monkey from `side` at `height` with a charge in [0, 1]
pub fn spawn_monkey(session: &mut GameSession, side: Side, height: f32, charge: f32) -> BodyId {
    let scale = session.random_scale();
    let t = &session.tuning;
    let mass = t.monkey_mass * scale;
    let sign = side.sign();
    let desc = BodyDesc::dynamic(
        BodyKind::Monkey { side },
        mass,
        moment_for_circle(mass, 0.0, t.monkey_moment_radius * scale),
    )
    .with_position(Vec2::new(t.spawn_x * sign, height))
    .with_velocity(Vec2::new(-sign * t.throw_speed(charge), 0.0));
    let radius = t.monkey_radius * scale;

    let id = session.world.add_body(desc);
    session.world.add_shape(id, ShapeDesc::Circle { radius }, 0.0);
    session.events.push(GameEvent::Thrown { side });
    log::debug!("Threw monkey {:?} from {:?} (charge {:.2})", id, side, charge);
    id
}

/// Queue and apply removal of every monkey below the fall threshold
pub fn despawn_fallen(session: &mut GameSession) -> usize {
    let threshold = session.tuning.fall_threshold;
    let fallen: Vec<BodyId> = session
        .world
        .bodies()
        .filter(|(_, record)| record.kind.is_monkey())
        .map(|(id, _)| id)
        .filter(|id| {
            session
                .world
                .pose(*id)
                .is_some_and(|pose| pose.position.y < threshold)
        })
        .collect();

    for id in &fallen {
        log::debug!("Monkey {:?} fell out", id);
        session.world.post_step(PostStepCommand::RemoveBody(*id));
    }
    session.world.flush_post_step();
    fallen.len()
}

/// End the round if the tree has tipped past the limit while still held.
/// Drops every joint so the tree and its monkeys collapse.
pub fn evaluate_topple(session: &mut GameSession) -> bool {
    let Some(pose) = session.world.pose(session.tree) else {
        return false;
    };
    if pose.angle.abs() <= session.tuning.topple_angle || session.world.joint_count() == 0 {
        return false;
    }

    for joint in session.world.joint_ids() {
        session.world.post_step(PostStepCommand::RemoveJoint(joint));
    }
    session.world.flush_post_step();

    session.score.finalize();
    let count = session.score.count();
    session.events.push(GameEvent::GameOver { count });
    session.phase = Phase::GameOver {
        entered: session.now,
    };
    session.charge_started = None;
    session.quit_armed = None;
    log::info!("Tree toppled with {} monkeys", count);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::Pose;

    fn playing_session() -> GameSession {
        let mut session = GameSession::new(Tuning::default(), 42);
        session.phase = Phase::Playing;
        session
    }

    #[test]
    fn test_build_world_layout() {
        let (world, ground, tree) = build_world(&Tuning::default());
        assert_eq!(world.body(ground).unwrap().kind, BodyKind::Ground);
        assert_eq!(world.body(tree).unwrap().shapes.len(), 2);
        assert_eq!(world.pose(tree).unwrap().position, Vec2::new(0.0, 100.0));
        assert_eq!(world.joint_count(), 1);
        assert_eq!(world.pin_count(), 0);
        assert!((world.dt() - 0.032).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_monkey_from_each_side() {
        let mut session = playing_session();
        let left = spawn_monkey(&mut session, Side::Left, 150.0, 1.0);
        let right = spawn_monkey(&mut session, Side::Right, 80.0, 0.0);

        let pose = session.world.pose(left).unwrap();
        assert_eq!(pose.position, Vec2::new(-300.0, 150.0));
        assert!((session.world.velocity(left).unwrap().x - 300.0).abs() < 1e-3);
        assert_eq!(session.world.pose(right).unwrap().position, Vec2::new(300.0, 80.0));
        assert!((session.world.velocity(right).unwrap().x + 100.0).abs() < 1e-3);

        let Some(ShapeDesc::Circle { radius }) = session.world.body(left).unwrap().shapes.first().copied() else {
            panic!("monkey should be a circle");
        };
        assert!((9.6..15.0).contains(&radius));
        assert_eq!(
            session.drain_events(),
            vec![
                GameEvent::Thrown { side: Side::Left },
                GameEvent::Thrown { side: Side::Right }
            ]
        );
    }

    #[test]
    fn test_despawn_only_fallen_monkeys() {
        let mut session = playing_session();
        let low = spawn_monkey(&mut session, Side::Left, -250.0, 0.0);
        let high = spawn_monkey(&mut session, Side::Left, 150.0, 0.0);
        assert_eq!(despawn_fallen(&mut session), 1);
        assert!(session.world.body(low).is_none());
        assert!(session.world.body(high).is_some());
        // Tree and ground never fall out
        assert_eq!(session.world.body_count(), 3);
    }

    #[test]
    fn test_upright_tree_does_not_topple() {
        let mut session = playing_session();
        assert!(!evaluate_topple(&mut session));
        assert_eq!(session.phase, Phase::Playing);
    }

    #[test]
    fn test_tipped_tree_topples_once() {
        let mut session = playing_session();
        session.score.increment();
        session.now = 1234;
        let pivot = session.tuning.pivot_point;
        let offset = session.tuning.tree_position - pivot;
        session.world.set_pose(
            session.tree,
            Pose {
                position: pivot + crate::rotate(offset, -1.2),
                angle: -1.2,
            },
        );

        assert!(evaluate_topple(&mut session));
        assert_eq!(session.phase, Phase::GameOver { entered: 1234 });
        assert_eq!(session.world.joint_count(), 0);
        assert_eq!(session.score.text(), "YOU HAD 1 MONKEYS ON THE TREE!");
        assert_eq!(session.drain_events(), vec![GameEvent::GameOver { count: 1 }]);

        // Nothing left to drop
        assert!(!evaluate_topple(&mut session));
    }

    #[test]
    fn test_reset_restores_initial_world() {
        let mut session = playing_session();
        spawn_monkey(&mut session, Side::Right, 100.0, 0.5);
        session.score.increment();
        session.quit_armed = Some(3);
        reset(&mut session);
        assert_eq!(session.world.body_count(), 2);
        assert_eq!(session.world.joint_count(), 1);
        assert_eq!(session.score.count(), 0);
        assert!(session.quit_armed.is_none());
    }
}
