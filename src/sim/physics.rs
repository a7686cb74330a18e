//! Physics world adapter over rapier2d
//!
//! Owns every rapier set and exposes the handful of operations the game needs:
//! create bodies/shapes/joints, step, and a post-step command queue. rapier
//! reports contacts through an `EventHandler` that only gets shared access, so
//! nothing can mutate the world mid-step; mutations requested by contact
//! handling are queued and applied by [`PhysicsWorld::flush_post_step`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

// ---------------------------------------------------------------------------
// glam <-> nalgebra
// ---------------------------------------------------------------------------

fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_na_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

fn from_na(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn from_na_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Stable body identifier, never reused within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// Stable joint identifier, never reused within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub u32);

/// Screen side a monkey was thrown from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side for a horizontal sign; zero counts as right
    pub fn from_sign(sign: f32) -> Self {
        if sign < 0.0 { Side::Left } else { Side::Right }
    }

    /// -1 for left, +1 for right
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Gameplay role of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Ground,
    Tree,
    Monkey { side: Side },
}

impl BodyKind {
    pub fn is_monkey(&self) -> bool {
        matches!(self, BodyKind::Monkey { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// Holds the tree to the ground; rotation resisted only up to a force cap
    Pivot,
    /// One half of a weld between two bodies
    Pin,
}

/// Collision shape in the body's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    Circle { radius: f32 },
    Box { center: Vec2, half_extents: Vec2 },
}

impl ShapeDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ShapeDesc::Circle { radius } => ColliderBuilder::ball(radius),
            ShapeDesc::Box {
                center,
                half_extents,
            } => ColliderBuilder::cuboid(half_extents.x, half_extents.y).translation(to_na(center)),
        }
    }
}

/// Description of a body before creation
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub dynamic: bool,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub mass: f32,
    pub moment: f32,
}

impl BodyDesc {
    /// Immovable body
    pub fn fixed(kind: BodyKind) -> Self {
        Self {
            kind,
            dynamic: false,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            mass: 0.0,
            moment: 0.0,
        }
    }

    /// Simulated body with explicit mass and moment of inertia
    pub fn dynamic(kind: BodyKind, mass: f32, moment: f32) -> Self {
        Self {
            kind,
            dynamic: true,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            mass,
            moment,
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Moment of inertia of a hollow disc between two radii
pub fn moment_for_circle(mass: f32, inner: f32, outer: f32) -> f32 {
    mass * (inner * inner + outer * outer) * 0.5
}

/// Position and rotation of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

impl Pose {
    pub fn local_to_world(&self, local: Vec2) -> Vec2 {
        self.position + crate::rotate(local, self.angle)
    }

    pub fn world_to_local(&self, world: Vec2) -> Vec2 {
        crate::rotate(world - self.position, -self.angle)
    }
}

/// Capped linear motors holding two anchors together. Rotation is free; a
/// load larger than `max_force` drags the anchors apart.
#[derive(Debug, Clone, Copy)]
pub struct PivotMotor {
    pub max_force: f32,
    pub stiffness: f32,
    pub damping: f32,
}

/// Compliance of weld pins, as an acceleration-level spring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinSpring {
    pub stiffness: f32,
    pub damping: f32,
}

impl PinSpring {
    /// Spring oscillating at `frequency` Hz whose damping ratio is the
    /// softness (1 is critical, lower rings longer)
    pub fn from_softness(softness: f32, frequency: f32) -> Self {
        let omega = std::f32::consts::TAU * frequency;
        Self {
            stiffness: omega * omega,
            damping: 2.0 * softness * omega,
        }
    }
}

impl Default for PinSpring {
    fn default() -> Self {
        Self::from_softness(crate::tuning::DEFAULT_PIN_SOFTNESS, crate::tuning::DEFAULT_PIN_FREQUENCY)
    }
}

/// A pair of bodies that started touching during a step
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Contact point on the surface of `body_a` (world space)
    pub point_a: Vec2,
    /// Contact point on the surface of `body_b` (world space)
    pub point_b: Vec2,
    /// Unit normal pointing from `body_a` toward `body_b`
    pub normal: Vec2,
    /// Signed separation, negative while the shapes overlap
    pub depth: f32,
    /// Poses at the moment the contact was detected
    pub pose_a: Pose,
    pub pose_b: Pose,
}

impl ContactEvent {
    /// Same contact seen from the other body; the normal flips with it
    pub fn swapped(&self) -> Self {
        Self {
            body_a: self.body_b,
            body_b: self.body_a,
            point_a: self.point_b,
            point_b: self.point_a,
            normal: -self.normal,
            depth: self.depth,
            pose_a: self.pose_b,
            pose_b: self.pose_a,
        }
    }
}

/// Mutation deferred until the current step has finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostStepCommand {
    SetVelocity { body: BodyId, velocity: Vec2 },
    SetPosition { body: BodyId, position: Vec2 },
    /// Pin two bodies at local anchors, keeping their current distance
    AddPin {
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
    },
    /// Remove a body with its shapes and every joint touching it
    RemoveBody(BodyId),
    RemoveJoint(JointId),
}

/// Metadata stored alongside each rapier body
#[derive(Debug, Clone)]
pub struct BodyRecord {
    pub kind: BodyKind,
    pub shapes: Vec<ShapeDesc>,
    handle: RigidBodyHandle,
    joints: u32,
}

impl BodyRecord {
    /// Number of joints currently attached
    pub fn joint_count(&self) -> u32 {
        self.joints
    }
}

#[derive(Debug, Clone)]
struct JointRecord {
    kind: JointKind,
    handle: ImpulseJointHandle,
    body_a: BodyId,
    body_b: BodyId,
    anchor_a: Vec2,
    anchor_b: Vec2,
}

/// World-space view of a joint for drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointView {
    pub id: JointId,
    pub kind: JointKind,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
}

// ---------------------------------------------------------------------------
// Contact collection during the step
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ContactCollector {
    begun: Mutex<Vec<ContactEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<ContactEvent> {
        match self.begun.lock() {
            Ok(mut begun) => std::mem::take(&mut *begun),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

fn body_pose(rb: &RigidBody) -> Pose {
    Pose {
        position: from_na(rb.translation()),
        angle: rb.rotation().angle(),
    }
}

fn capture_contact(
    bodies: &RigidBodySet,
    colliders: &ColliderSet,
    pair: &ContactPair,
) -> Option<ContactEvent> {
    let c1 = colliders.get(pair.collider1)?;
    let c2 = colliders.get(pair.collider2)?;
    let rb1 = bodies.get(c1.parent()?)?;
    let rb2 = bodies.get(c2.parent()?)?;
    let manifold = pair.manifolds.iter().find(|m| !m.points.is_empty())?;
    let contact = manifold.points.first()?;

    let point_a = c1.position() * contact.local_p1;
    let point_b = c2.position() * contact.local_p2;
    let normal = c1.position().rotation * manifold.local_n1;

    Some(ContactEvent {
        body_a: BodyId(rb1.user_data as u32),
        body_b: BodyId(rb2.user_data as u32),
        point_a: from_na_point(&point_a),
        point_b: from_na_point(&point_b),
        normal: from_na(&normal).normalize_or_zero(),
        depth: contact.dist,
        pose_a: body_pose(rb1),
        pose_b: body_pose(rb2),
    })
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        if !event.started() {
            return;
        }
        let Some(pair) = contact_pair else { return };
        if let Some(contact) = capture_contact(bodies, colliders, pair) {
            match self.begun.lock() {
                Ok(mut begun) => begun.push(contact),
                Err(poisoned) => poisoned.into_inner().push(contact),
            }
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// The whole simulation: rapier state plus body/joint metadata
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ContactCollector,
    pin_spring: PinSpring,

    records: BTreeMap<BodyId, BodyRecord>,
    joints: BTreeMap<JointId, JointRecord>,
    post_step: VecDeque<PostStepCommand>,
    next_body: u32,
    next_joint: u32,
    steps: u64,
}

impl PhysicsWorld {
    /// Create an empty world stepping by `dt` seconds
    pub fn new(gravity: Vec2, dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt,
            ..Default::default()
        };
        Self {
            gravity: to_na(gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ContactCollector::default(),
            pin_spring: PinSpring::default(),
            records: BTreeMap::new(),
            joints: BTreeMap::new(),
            post_step: VecDeque::new(),
            next_body: 1,
            next_joint: 1,
            steps: 0,
        }
    }

    /// Compliance used by every pin created from now on
    pub fn set_pin_spring(&mut self, spring: PinSpring) {
        self.pin_spring = spring;
    }

    #[cfg(test)]
    pub(crate) fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Number of completed steps
    pub fn steps(&self) -> u64 {
        self.steps
    }

    // -- Bodies and shapes --

    /// Register a body; shapes are added separately
    pub fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;

        let builder = if desc.dynamic {
            RigidBodyBuilder::dynamic().additional_mass_properties(MassProperties::new(
                point![0.0, 0.0],
                desc.mass,
                desc.moment,
            ))
        } else {
            RigidBodyBuilder::fixed()
        };
        let rb = builder
            .translation(to_na(desc.position))
            .rotation(desc.angle)
            .linvel(to_na(desc.velocity))
            .user_data(id.0 as u128)
            .build();
        let handle = self.bodies.insert(rb);

        self.records.insert(
            id,
            BodyRecord {
                kind: desc.kind,
                shapes: Vec::new(),
                handle,
                joints: 0,
            },
        );
        id
    }

    /// Attach a massless collision shape to a body. Mass comes from the body
    /// description alone.
    pub fn add_shape(&mut self, body: BodyId, shape: ShapeDesc, friction: f32) -> bool {
        let Some(record) = self.records.get_mut(&body) else {
            return false;
        };
        let collider = shape
            .build_collider()
            .density(0.0)
            .friction(friction)
            .restitution(0.0)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, record.handle, &mut self.bodies);
        record.shapes.push(shape);
        true
    }

    /// Remove a body, its shapes and all joints attached to it
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        let Some(record) = self.records.remove(&id) else {
            return false;
        };
        self.bodies.remove(
            record.handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );

        // rapier already dropped the joints; forget them on our side
        let orphaned: Vec<JointId> = self
            .joints
            .iter()
            .filter(|(_, j)| j.body_a == id || j.body_b == id)
            .map(|(jid, _)| *jid)
            .collect();
        for jid in orphaned {
            if let Some(joint) = self.joints.remove(&jid) {
                let other = if joint.body_a == id {
                    joint.body_b
                } else {
                    joint.body_a
                };
                self.release(other);
            }
        }
        true
    }

    pub fn body(&self, id: BodyId) -> Option<&BodyRecord> {
        self.records.get(&id)
    }

    /// All bodies in creation order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &BodyRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    pub fn body_count(&self) -> usize {
        self.records.len()
    }

    /// True when at least one joint is attached to the body
    pub fn is_attached(&self, id: BodyId) -> bool {
        self.records.get(&id).is_some_and(|r| r.joints > 0)
    }

    pub fn pose(&self, id: BodyId) -> Option<Pose> {
        let record = self.records.get(&id)?;
        self.bodies.get(record.handle).map(body_pose)
    }

    pub fn velocity(&self, id: BodyId) -> Option<Vec2> {
        let record = self.records.get(&id)?;
        self.bodies.get(record.handle).map(|rb| from_na(rb.linvel()))
    }

    pub fn angular_velocity(&self, id: BodyId) -> Option<f32> {
        let record = self.records.get(&id)?;
        self.bodies.get(record.handle).map(|rb| rb.angvel())
    }

    fn rigid_body_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        let handle = self.records.get(&id)?.handle;
        self.bodies.get_mut(handle)
    }

    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> bool {
        self.rigid_body_mut(id)
            .map(|rb| rb.set_linvel(to_na(velocity), true))
            .is_some()
    }

    pub fn set_position(&mut self, id: BodyId, position: Vec2) -> bool {
        self.rigid_body_mut(id)
            .map(|rb| rb.set_translation(to_na(position), true))
            .is_some()
    }

    pub fn set_pose(&mut self, id: BodyId, pose: Pose) -> bool {
        self.rigid_body_mut(id)
            .map(|rb| {
                rb.set_translation(to_na(pose.position), true);
                rb.set_rotation(nalgebra::UnitComplex::new(pose.angle), true);
            })
            .is_some()
    }

    /// Apply an impulse at a world point
    pub fn apply_impulse_at(&mut self, id: BodyId, impulse: Vec2, point: Vec2) -> bool {
        self.rigid_body_mut(id)
            .map(|rb| rb.apply_impulse_at_point(to_na(impulse), to_na_point(point), true))
            .is_some()
    }

    // -- Joints --

    fn insert_joint(
        &mut self,
        kind: JointKind,
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
        joint: impl Into<GenericJoint>,
    ) -> Option<JointId> {
        let handle_a = self.records.get(&body_a)?.handle;
        let handle_b = self.records.get(&body_b)?.handle;
        let handle = self.impulse_joints.insert(handle_a, handle_b, joint, true);

        let id = JointId(self.next_joint);
        self.next_joint += 1;
        self.joints.insert(
            id,
            JointRecord {
                kind,
                handle,
                body_a,
                body_b,
                anchor_a,
                anchor_b,
            },
        );
        for body in [body_a, body_b] {
            if let Some(record) = self.records.get_mut(&body) {
                record.joints += 1;
            }
        }
        Some(id)
    }

    fn release(&mut self, body: BodyId) {
        if let Some(record) = self.records.get_mut(&body) {
            record.joints = record.joints.saturating_sub(1);
        }
    }

    /// Hold two bodies together at a shared world point. Rotation about it is
    /// free and the bodies keep colliding; the hold gives way under loads
    /// above the motor's force cap.
    pub fn add_pivot(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        world_point: Vec2,
        motor: PivotMotor,
    ) -> Option<JointId> {
        let anchor_a = self.pose(body_a)?.world_to_local(world_point);
        let anchor_b = self.pose(body_b)?.world_to_local(world_point);
        let mut builder = GenericJointBuilder::new(JointAxesMask::empty())
            .local_anchor1(to_na_point(anchor_a))
            .local_anchor2(to_na_point(anchor_b))
            .contacts_enabled(true);
        for axis in [JointAxis::LinX, JointAxis::LinY] {
            builder = builder
                .motor_model(axis, MotorModel::ForceBased)
                .motor_position(axis, 0.0, motor.stiffness, motor.damping)
                .motor_max_force(axis, motor.max_force);
        }
        let joint = builder.build();
        self.insert_joint(JointKind::Pivot, body_a, body_b, anchor_a, anchor_b, joint)
    }

    /// Pin two local anchors together at their current distance. The pin is
    /// a stiff spring, so impacts flex it before it settles back.
    pub fn add_pin(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
    ) -> Option<JointId> {
        let world_a = self.pose(body_a)?.local_to_world(anchor_a);
        let world_b = self.pose(body_b)?.local_to_world(anchor_b);
        let length = world_a.distance(world_b);
        let spring = self.pin_spring;
        let joint = SpringJointBuilder::new(length, spring.stiffness, spring.damping)
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor1(to_na_point(anchor_a))
            .local_anchor2(to_na_point(anchor_b))
            .build();
        self.insert_joint(JointKind::Pin, body_a, body_b, anchor_a, anchor_b, joint)
    }

    pub fn remove_joint(&mut self, id: JointId) -> bool {
        let Some(joint) = self.joints.remove(&id) else {
            return false;
        };
        self.impulse_joints.remove(joint.handle, true);
        self.release(joint.body_a);
        self.release(joint.body_b);
        true
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn pin_count(&self) -> usize {
        self.joints
            .values()
            .filter(|j| j.kind == JointKind::Pin)
            .count()
    }

    pub fn joint_ids(&self) -> Vec<JointId> {
        self.joints.keys().copied().collect()
    }

    /// Joints with anchors resolved to world space
    pub fn joints(&self) -> impl Iterator<Item = JointView> + '_ {
        self.joints.iter().filter_map(|(id, joint)| {
            let pose_a = self.pose(joint.body_a)?;
            let pose_b = self.pose(joint.body_b)?;
            Some(JointView {
                id: *id,
                kind: joint.kind,
                body_a: joint.body_a,
                body_b: joint.body_b,
                anchor_a: pose_a.local_to_world(joint.anchor_a),
                anchor_b: pose_b.local_to_world(joint.anchor_b),
            })
        })
    }

    // -- Stepping --

    /// Advance one fixed step and return the contacts that began during it,
    /// ordered by body pair
    pub fn step(&mut self) -> Vec<ContactEvent> {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collector,
        );
        self.steps += 1;

        let mut contacts = self.collector.drain();
        contacts.sort_by_key(|c| (c.body_a.min(c.body_b), c.body_a.max(c.body_b)));
        contacts
    }

    /// Queue a mutation for the next flush
    pub fn post_step(&mut self, command: PostStepCommand) {
        self.post_step.push_back(command);
    }

    #[cfg(test)]
    pub(crate) fn pending_post_step(&self) -> usize {
        self.post_step.len()
    }

    /// Apply queued mutations in FIFO order. Commands whose targets vanished
    /// earlier in the queue are dropped. Returns how many took effect.
    pub fn flush_post_step(&mut self) -> usize {
        let mut applied = 0;
        while let Some(command) = self.post_step.pop_front() {
            let ok = match command {
                PostStepCommand::SetVelocity { body, velocity } => self.set_velocity(body, velocity),
                PostStepCommand::SetPosition { body, position } => self.set_position(body, position),
                PostStepCommand::AddPin {
                    body_a,
                    body_b,
                    anchor_a,
                    anchor_b,
                } => self.add_pin(body_a, body_b, anchor_a, anchor_b).is_some(),
                PostStepCommand::RemoveBody(body) => self.remove_body(body),
                PostStepCommand::RemoveJoint(joint) => self.remove_joint(joint),
            };
            if ok {
                applied += 1;
            } else {
                log::debug!("Dropped post-step command {:?}", command);
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(world: &mut PhysicsWorld, pos: Vec2, vel: Vec2) -> BodyId {
        let id = world.add_body(
            BodyDesc::dynamic(BodyKind::Monkey { side: Side::Left }, 3.0, 37.5)
                .with_position(pos)
                .with_velocity(vel),
        );
        world.add_shape(id, ShapeDesc::Circle { radius: 10.0 }, 0.0);
        id
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::from_sign(-3.0), Side::Left);
        assert_eq!(Side::from_sign(0.0), Side::Right);
        assert_eq!(Side::Left.sign(), -1.0);
        assert_eq!(Side::Right.sign(), 1.0);
    }

    #[test]
    fn test_pose_round_trip() {
        let pose = Pose {
            position: Vec2::new(10.0, -4.0),
            angle: 0.7,
        };
        let local = Vec2::new(3.0, 5.0);
        let back = pose.world_to_local(pose.local_to_world(local));
        assert!((back - local).length() < 1e-4);
    }

    #[test]
    fn test_swapped_contact_flips_normal() {
        let pose = Pose {
            position: Vec2::ZERO,
            angle: 0.0,
        };
        let contact = ContactEvent {
            body_a: BodyId(1),
            body_b: BodyId(2),
            point_a: Vec2::new(1.0, 0.0),
            point_b: Vec2::new(2.0, 0.0),
            normal: Vec2::X,
            depth: -0.5,
            pose_a: pose,
            pose_b: pose,
        };
        let swapped = contact.swapped();
        assert_eq!(swapped.body_a, BodyId(2));
        assert_eq!(swapped.point_a, Vec2::new(2.0, 0.0));
        assert_eq!(swapped.normal, -Vec2::X);
        assert_eq!(swapped.depth, -0.5);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -98.7), 0.032);
        let id = ball(&mut world, Vec2::ZERO, Vec2::ZERO);
        for _ in 0..10 {
            world.step();
        }
        assert!(world.pose(id).unwrap().position.y < -1.0);
        assert_eq!(world.steps(), 10);
    }

    #[test]
    fn test_joint_bookkeeping() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 0.032);
        let a = ball(&mut world, Vec2::ZERO, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(25.0, 0.0), Vec2::ZERO);
        assert!(!world.is_attached(a));

        let pin = world.add_pin(a, b, Vec2::new(0.0, 3.0), Vec2::ZERO).unwrap();
        world.add_pin(a, b, Vec2::new(0.0, -3.0), Vec2::ZERO).unwrap();
        assert_eq!(world.body(a).unwrap().joint_count(), 2);
        assert_eq!(world.pin_count(), 2);

        assert!(world.remove_joint(pin));
        assert!(!world.remove_joint(pin));
        assert_eq!(world.body(b).unwrap().joint_count(), 1);

        // Removing a body drops the joints it shared
        assert!(world.remove_body(a));
        assert_eq!(world.joint_count(), 0);
        assert!(!world.is_attached(b));
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_post_step_fifo_and_stale_commands() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 0.032);
        let a = ball(&mut world, Vec2::ZERO, Vec2::new(5.0, 0.0));
        world.post_step(PostStepCommand::SetVelocity {
            body: a,
            velocity: Vec2::new(1.0, 2.0),
        });
        world.post_step(PostStepCommand::RemoveBody(a));
        // Targets a body removed earlier in the same flush
        world.post_step(PostStepCommand::SetPosition {
            body: a,
            position: Vec2::ONE,
        });
        assert_eq!(world.pending_post_step(), 3);
        assert_eq!(world.flush_post_step(), 2);
        assert_eq!(world.pending_post_step(), 0);
        assert!(world.body(a).is_none());
    }

    #[test]
    fn test_contact_reports_begin_once() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 0.032);
        let a = ball(&mut world, Vec2::new(-30.0, 0.0), Vec2::new(100.0, 0.0));
        let b = ball(&mut world, Vec2::new(30.0, 0.0), Vec2::new(-100.0, 0.0));

        let mut begun = Vec::new();
        for _ in 0..30 {
            begun.extend(world.step());
        }
        assert_eq!(begun.len(), 1);
        let contact = begun[0];
        let ids = [contact.body_a, contact.body_b];
        assert!(ids.contains(&a) && ids.contains(&b));

        // Normal points from a toward b
        let dir = (contact.pose_b.position - contact.pose_a.position).normalize();
        assert!(contact.normal.dot(dir) > 0.9);
    }

    #[test]
    fn test_pivot_holds_body_to_fixed_point() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -98.7), 0.032);
        let ground = world.add_body(BodyDesc::fixed(BodyKind::Ground));
        let bob = world.add_body(
            BodyDesc::dynamic(BodyKind::Tree, 5.0, 100.0).with_position(Vec2::new(0.0, -40.0)),
        );
        world.add_shape(
            bob,
            ShapeDesc::Box {
                center: Vec2::ZERO,
                half_extents: Vec2::new(5.0, 5.0),
            },
            0.0,
        );
        let motor = PivotMotor {
            max_force: 1.0e6,
            stiffness: 1.0e5,
            damping: 1.0e4,
        };
        world.add_pivot(bob, ground, Vec2::ZERO, motor).unwrap();
        assert!(world.is_attached(ground) && world.is_attached(bob));

        for _ in 0..60 {
            world.step();
        }
        // Hanging below the pivot: it stays put
        let pos = world.pose(bob).unwrap().position;
        assert!((pos - Vec2::new(0.0, -40.0)).length() < 2.0, "moved to {pos:?}");
        let view = world.joints().next().unwrap();
        assert_eq!(view.kind, JointKind::Pivot);
        assert!((view.anchor_a - view.anchor_b).length() < 2.0);
    }

    #[test]
    fn test_pin_holds_distance_when_pushed_together() {
        let mut world = PhysicsWorld::new(Vec2::ZERO, 0.032);
        let a = ball(&mut world, Vec2::ZERO, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(60.0, 0.0), Vec2::ZERO);
        world.add_pin(a, b, Vec2::ZERO, Vec2::ZERO).unwrap();
        world.set_velocity(a, Vec2::new(50.0, 0.0));

        let distance = |world: &PhysicsWorld| {
            let view = world.joints().next().unwrap();
            view.anchor_a.distance(view.anchor_b)
        };
        let mut closest = f32::MAX;
        for _ in 0..60 {
            world.step();
            closest = closest.min(distance(&world));
        }
        // A slack link would let `a` close the whole gap
        assert!(closest > 55.0, "pin compressed to {closest}");
        assert!((distance(&world) - 60.0).abs() < 1.0);
        // The pair moves on together
        assert!(world.velocity(b).unwrap().x > 10.0);
    }

    #[test]
    fn test_pin_spring_from_softness() {
        let spring = PinSpring::from_softness(1.0, 1.0);
        let omega = std::f32::consts::TAU;
        assert!((spring.stiffness - omega * omega).abs() < 1e-3);
        assert!((spring.damping - 2.0 * omega).abs() < 1e-4);
        // Softer pins damp less
        assert!(PinSpring::default().damping < PinSpring::from_softness(1.0, 10.0).damping);
    }

    #[test]
    fn test_pivot_gives_way_above_force_cap() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -98.7), 0.032);
        let ground = world.add_body(BodyDesc::fixed(BodyKind::Ground));
        let bob = ball(&mut world, Vec2::new(0.0, -40.0), Vec2::ZERO);
        // Weight is about 300, far above the cap
        let motor = PivotMotor {
            max_force: 10.0,
            stiffness: 1.0e5,
            damping: 1.0e4,
        };
        world.add_pivot(bob, ground, Vec2::new(0.0, -40.0), motor).unwrap();
        for _ in 0..30 {
            world.step();
        }
        assert!(world.pose(bob).unwrap().position.y < -50.0);
        assert_eq!(world.joint_count(), 1);
    }

    #[test]
    fn test_pivoted_bodies_still_collide() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -98.7), 0.032);
        let ground = world.add_body(BodyDesc::fixed(BodyKind::Ground));
        world.add_shape(
            ground,
            ShapeDesc::Box {
                center: Vec2::new(0.0, -10.0),
                half_extents: Vec2::new(50.0, 10.0),
            },
            1.0,
        );
        let post = world.add_body(
            BodyDesc::dynamic(BodyKind::Tree, 5.0, 100.0).with_position(Vec2::new(0.0, 9.5)),
        );
        world.add_shape(
            post,
            ShapeDesc::Box {
                center: Vec2::ZERO,
                half_extents: Vec2::new(5.0, 10.0),
            },
            0.0,
        );
        let motor = PivotMotor {
            max_force: 1000.0,
            stiffness: 1.0e5,
            damping: 1.0e4,
        };
        world.add_pivot(post, ground, Vec2::new(0.0, 1.0), motor).unwrap();

        let mut begun = Vec::new();
        for _ in 0..10 {
            begun.extend(world.step());
        }
        assert!(begun.iter().any(|c| [c.body_a, c.body_b].contains(&post)
            && [c.body_a, c.body_b].contains(&ground)));
        // Resting on the ground, not sunk into it
        assert!(world.pose(post).unwrap().position.y > 9.0);
    }

    #[test]
    fn test_moment_for_circle() {
        assert!((moment_for_circle(50.0, 0.0, 50.0) - 62_500.0).abs() < 1e-3);
    }
}
