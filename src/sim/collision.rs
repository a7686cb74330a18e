//! Weld policy: what happens when a monkey touches something
//!
//! A monkey that touches the tree, or another monkey, stops dead. If exactly
//! one of the two bodies is already part of the tree structure, the monkey is
//! nudged onto the surface and welded there with two pins. Everything is
//! requested through the post-step queue since contacts arrive mid-step.

use glam::Vec2;

use super::physics::{BodyId, BodyKind, ContactEvent, PhysicsWorld, PostStepCommand};

/// Parameters of a weld
#[derive(Debug, Clone, Copy)]
pub struct WeldRules {
    /// Vertical offset of each pin from the contact point
    pub pin_offset: f32,
    /// Gap kept between the welded monkey and the surface
    pub margin: f32,
}

impl WeldRules {
    pub fn from_tuning(tuning: &crate::Tuning) -> Self {
        Self {
            pin_offset: tuning.pin_offset,
            margin: tuning.weld_margin,
        }
    }
}

impl Default for WeldRules {
    fn default() -> Self {
        Self::from_tuning(&crate::Tuning::default())
    }
}

/// Result of handling one contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Not a monkey contact (ground, or tree against ground)
    Ignored,
    /// The monkey stopped but nothing was welded
    Stopped { monkey: BodyId },
    /// The monkey was stopped and welded to `anchor`
    Welded { monkey: BodyId, anchor: BodyId },
}

/// Put the contact in (monkey, other) order, or `None` if no monkey is
/// involved or the other body cannot hold one.
///
/// Between two monkeys the free one is the subject when exactly one of them
/// is attached; otherwise the pair order decides.
fn orient(world: &PhysicsWorld, contact: &ContactEvent) -> Option<ContactEvent> {
    let kind_a = world.body(contact.body_a)?.kind;
    let kind_b = world.body(contact.body_b)?.kind;
    let holds = |kind: BodyKind| matches!(kind, BodyKind::Tree | BodyKind::Monkey { .. });

    match (kind_a.is_monkey(), kind_b.is_monkey()) {
        (true, true) => {
            if world.is_attached(contact.body_a) && !world.is_attached(contact.body_b) {
                Some(contact.swapped())
            } else {
                Some(*contact)
            }
        }
        (true, false) if holds(kind_b) => Some(*contact),
        (false, true) if holds(kind_a) => Some(contact.swapped()),
        _ => None,
    }
}

/// Handle a contact that began this step
pub fn on_contact(
    world: &mut PhysicsWorld,
    contact: &ContactEvent,
    rules: &WeldRules,
) -> ContactOutcome {
    let Some(contact) = orient(world, contact) else {
        return ContactOutcome::Ignored;
    };
    let monkey = contact.body_a;
    let other = contact.body_b;

    world.post_step(PostStepCommand::SetVelocity {
        body: monkey,
        velocity: Vec2::ZERO,
    });

    // Joints still waiting in the queue do not count yet
    if world.is_attached(monkey) == world.is_attached(other) {
        return ContactOutcome::Stopped { monkey };
    }

    let hit = contact.point_b;
    let settled = contact.pose_a.position + contact.normal * (contact.depth - rules.margin);
    world.post_step(PostStepCommand::SetPosition {
        body: monkey,
        position: settled,
    });

    let offset = Vec2::new(0.0, rules.pin_offset);
    for off in [offset, -offset] {
        world.post_step(PostStepCommand::AddPin {
            body_a: monkey,
            body_b: other,
            anchor_a: off,
            anchor_b: contact.pose_b.world_to_local(hit + off),
        });
    }

    log::debug!("Monkey {:?} welded to {:?}", monkey, other);
    ContactOutcome::Welded {
        monkey,
        anchor: other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::{BodyDesc, Pose, ShapeDesc, Side};
    use proptest::prelude::*;

    struct Fixture {
        world: PhysicsWorld,
        ground: BodyId,
        tree: BodyId,
        anchor: BodyId,
    }

    fn monkey(world: &mut PhysicsWorld, pos: Vec2) -> BodyId {
        let id = world.add_body(
            BodyDesc::dynamic(BodyKind::Monkey { side: Side::Right }, 3.0, 37.5)
                .with_position(pos)
                .with_velocity(Vec2::new(-200.0, 0.0)),
        );
        world.add_shape(id, ShapeDesc::Circle { radius: 12.0 }, 0.0);
        id
    }

    /// Tree pinned to the ground, plus an extra free body used to attach
    /// the tree when a test needs it
    fn fixture() -> Fixture {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 0.032);
        let ground = world.add_body(BodyDesc::fixed(BodyKind::Ground));
        let tree = world.add_body(
            BodyDesc::dynamic(BodyKind::Tree, 50.0, 62_500.0).with_position(Vec2::new(0.0, 100.0)),
        );
        let anchor = monkey(&mut world, Vec2::new(0.0, 300.0));
        Fixture {
            world,
            ground,
            tree,
            anchor,
        }
    }

    fn contact(world: &PhysicsWorld, a: BodyId, b: BodyId, point_b: Vec2, normal: Vec2) -> ContactEvent {
        let pose_a = world.pose(a).unwrap();
        let pose_b = world.pose(b).unwrap();
        ContactEvent {
            body_a: a,
            body_b: b,
            point_a: point_b + normal * 0.5,
            point_b,
            normal,
            depth: -0.5,
            pose_a,
            pose_b,
        }
    }

    fn attach(world: &mut PhysicsWorld, a: BodyId, b: BodyId) {
        world.add_pin(a, b, Vec2::ZERO, Vec2::ZERO).unwrap();
    }

    #[test]
    fn test_weld_to_attached_tree() {
        let mut f = fixture();
        attach(&mut f.world, f.tree, f.anchor);
        let m = monkey(&mut f.world, Vec2::new(23.0, 100.0));

        let c = contact(&f.world, m, f.tree, Vec2::new(10.0, 100.0), Vec2::new(-1.0, 0.0));
        let outcome = on_contact(&mut f.world, &c, &WeldRules::default());
        assert_eq!(outcome, ContactOutcome::Welded { monkey: m, anchor: f.tree });

        // Velocity, position, two pins
        assert_eq!(f.world.pending_post_step(), 4);
        assert_eq!(f.world.flush_post_step(), 4);
        assert_eq!(f.world.velocity(m).unwrap(), Vec2::ZERO);
        // Moved along the normal by depth minus margin
        let pos = f.world.pose(m).unwrap().position;
        assert!((pos - Vec2::new(24.5, 100.0)).length() < 1e-4, "{pos:?}");
        assert_eq!(f.world.body(m).unwrap().joint_count(), 2);

        // Pins straddle the hit point in the tree's frame
        let tree_pose = f.world.pose(f.tree).unwrap();
        let anchors: Vec<Vec2> = f
            .world
            .joints()
            .filter(|j| j.body_a == m)
            .map(|j| tree_pose.world_to_local(j.anchor_b))
            .collect();
        assert_eq!(anchors.len(), 2);
        assert!(anchors.iter().any(|a| (*a - Vec2::new(10.0, 3.0)).length() < 1e-3));
        assert!(anchors.iter().any(|a| (*a - Vec2::new(10.0, -3.0)).length() < 1e-3));
    }

    #[test]
    fn test_swapped_order_uses_monkey_perspective() {
        let mut f = fixture();
        attach(&mut f.world, f.tree, f.anchor);
        let m = monkey(&mut f.world, Vec2::new(23.0, 100.0));

        // Tree first: normal from tree toward monkey
        let c = contact(&f.world, m, f.tree, Vec2::new(10.0, 100.0), Vec2::new(-1.0, 0.0)).swapped();
        let outcome = on_contact(&mut f.world, &c, &WeldRules::default());
        assert_eq!(outcome, ContactOutcome::Welded { monkey: m, anchor: f.tree });
        f.world.flush_post_step();
        let pos = f.world.pose(m).unwrap().position;
        assert!((pos - Vec2::new(24.5, 100.0)).length() < 1e-4, "{pos:?}");
    }

    #[test]
    fn test_unattached_tree_only_stops() {
        let mut f = fixture();
        let m = monkey(&mut f.world, Vec2::new(23.0, 100.0));
        let c = contact(&f.world, m, f.tree, Vec2::new(10.0, 100.0), Vec2::new(-1.0, 0.0));
        assert_eq!(
            on_contact(&mut f.world, &c, &WeldRules::default()),
            ContactOutcome::Stopped { monkey: m }
        );
        assert_eq!(f.world.flush_post_step(), 1);
        assert_eq!(f.world.velocity(m).unwrap(), Vec2::ZERO);
        assert_eq!(f.world.joint_count(), 0);
    }

    #[test]
    fn test_ground_is_ignored() {
        let mut f = fixture();
        let m = monkey(&mut f.world, Vec2::new(0.0, 12.0));
        let c = contact(&f.world, m, f.ground, Vec2::ZERO, Vec2::new(0.0, -1.0));
        assert_eq!(on_contact(&mut f.world, &c, &WeldRules::default()), ContactOutcome::Ignored);
        let c = contact(&f.world, f.tree, f.ground, Vec2::ZERO, Vec2::new(0.0, -1.0));
        assert_eq!(on_contact(&mut f.world, &c, &WeldRules::default()), ContactOutcome::Ignored);
        assert_eq!(f.world.pending_post_step(), 0);
    }

    #[test]
    fn test_free_monkey_welds_to_attached_monkey() {
        let mut f = fixture();
        attach(&mut f.world, f.tree, f.anchor);
        let free = monkey(&mut f.world, Vec2::new(0.0, 323.0));

        // Attached monkey listed first: the free one still gets welded
        let c = contact(&f.world, f.anchor, free, Vec2::new(0.0, 311.0), Vec2::Y);
        let outcome = on_contact(&mut f.world, &c, &WeldRules::default());
        assert_eq!(outcome, ContactOutcome::Welded { monkey: free, anchor: f.anchor });
        f.world.flush_post_step();
        assert!(f.world.is_attached(free));
    }

    fn stub_pose() -> Pose {
        Pose {
            position: Vec2::ZERO,
            angle: 0.0,
        }
    }

    proptest! {
        /// Weld happens exactly when one side is attached
        #[test]
        fn weld_rule_table(monkey_attached: bool, other_attached: bool, other_is_tree: bool) {
            let mut f = fixture();
            let m = monkey(&mut f.world, Vec2::new(-100.0, 0.0));
            let other = if other_is_tree {
                f.tree
            } else {
                monkey(&mut f.world, Vec2::new(-100.0, 30.0))
            };
            if monkey_attached {
                let helper = monkey(&mut f.world, Vec2::new(-200.0, 0.0));
                attach(&mut f.world, m, helper);
            }
            if other_attached {
                attach(&mut f.world, other, f.ground);
            }

            let c = ContactEvent {
                body_a: m,
                body_b: other,
                point_a: Vec2::ZERO,
                point_b: Vec2::ZERO,
                normal: Vec2::Y,
                depth: 0.0,
                pose_a: stub_pose(),
                pose_b: stub_pose(),
            };
            let outcome = on_contact(&mut f.world, &c, &WeldRules::default());
            let welded = matches!(outcome, ContactOutcome::Welded { .. });
            prop_assert_eq!(welded, monkey_attached != other_attached);
            prop_assert!(!matches!(outcome, ContactOutcome::Ignored));
            // Every outcome except Ignored stops a monkey
            prop_assert!(f.world.pending_post_step() >= 1);
        }
    }
}
