//! A solver-free [`PhysicsWorld`].
//!
//! Awake bodies that are in the world and not static move by their linear
//! and angular velocity. Gravity, damping, mass and shapes are stored and
//! reported back but never simulated, and bodies never fall asleep on their
//! own. Every call that matters to transform sync is counted in
//! [`HeadlessStats`].

use std::any::Any;
use std::collections::HashMap;

use engine_math::{Quat, Vec3};

use crate::backend::{
    BodyDesc, BodyHandle, BodyKind, ConstraintDesc, ConstraintHandle, PhysicsWorld, ShapeDesc,
    ShapeHandle,
};

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub steps: u64,
    /// Calls to [`PhysicsWorld::set_transform`].
    pub transform_writes: u64,
    pub wakes: u64,
    pub shapes_added: u64,
    pub shapes_removed: u64,
}

#[derive(Debug, Clone)]
struct Body {
    desc: BodyDesc,
    in_world: bool,
    sleeping: bool,
}

#[derive(Debug)]
pub struct HeadlessWorld {
    gravity: Vec3,
    next_handle: u64,
    bodies: HashMap<BodyHandle, Body>,
    shapes: HashMap<ShapeHandle, (BodyHandle, ShapeDesc)>,
    constraints: HashMap<ConstraintHandle, ConstraintDesc>,
    stats: HeadlessStats,
}

impl HeadlessWorld {
    #[must_use]
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            next_handle: 0,
            bodies: HashMap::new(),
            shapes: HashMap::new(),
            constraints: HashMap::new(),
            stats: HeadlessStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> HeadlessStats {
        self.stats
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Shapes currently attached to `body`.
    pub fn shapes_of(&self, body: BodyHandle) -> impl Iterator<Item = &ShapeDesc> {
        self.shapes
            .values()
            .filter(move |(owner, _)| *owner == body)
            .map(|(_, desc)| desc)
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn desc(&self, body: BodyHandle) -> Option<&BodyDesc> {
        self.bodies.get(&body).map(|b| &b.desc)
    }

    fn desc_mut(&mut self, body: BodyHandle) -> Option<&mut BodyDesc> {
        self.bodies.get_mut(&body).map(|b| &mut b.desc)
    }
}

impl Default for HeadlessWorld {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl PhysicsWorld for HeadlessWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next());
        self.bodies.insert(
            handle,
            Body {
                desc: desc.clone(),
                in_world: false,
                sleeping: false,
            },
        );
        handle
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        if self.bodies.remove(&body).is_none() {
            return;
        }
        self.shapes.retain(|_, (owner, _)| *owner != body);
        self.constraints
            .retain(|_, c| c.body_a != body && c.body_b != Some(body));
    }

    fn add_body(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.in_world = true;
        }
    }

    fn remove_body(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.in_world = false;
        }
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.in_world)
    }

    fn body_kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.desc(body).map(|d| d.kind)
    }

    fn set_body_kind(&mut self, body: BodyHandle, kind: BodyKind) {
        if let Some(d) = self.desc_mut(body) {
            d.kind = kind;
        }
    }

    fn add_shape(&mut self, body: BodyHandle, shape: &ShapeDesc) -> Option<ShapeHandle> {
        if !self.bodies.contains_key(&body) {
            return None;
        }
        let handle = ShapeHandle(self.next());
        self.shapes.insert(handle, (body, shape.clone()));
        self.stats.shapes_added += 1;
        Some(handle)
    }

    fn remove_shape(&mut self, shape: ShapeHandle) {
        if self.shapes.remove(&shape).is_some() {
            self.stats.shapes_removed += 1;
        }
    }

    fn num_shapes(&self, body: BodyHandle) -> usize {
        self.shapes.values().filter(|(owner, _)| *owner == body).count()
    }

    fn add_constraint(&mut self, desc: &ConstraintDesc) -> Option<ConstraintHandle> {
        let known = |b: BodyHandle| self.bodies.contains_key(&b);
        if !known(desc.body_a) || desc.body_b.is_some_and(|b| !known(b)) {
            return None;
        }
        let handle = ConstraintHandle(self.next());
        self.constraints.insert(handle, desc.clone());
        Some(handle)
    }

    fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.remove(&constraint);
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if !body.in_world || body.sleeping || body.desc.kind == BodyKind::Static {
                continue;
            }
            let d = &mut body.desc;
            d.position += d.linear_velocity * dt;
            let spin = d.angular_velocity * d.rotation_factor * dt;
            if spin != Vec3::ZERO {
                d.rotation = (Quat::from_scaled_axis(spin) * d.rotation).normalize();
            }
        }
        self.stats.steps += 1;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.desc(body).map(|d| d.position)
    }

    fn rotation(&self, body: BodyHandle) -> Option<Quat> {
        self.desc(body).map(|d| d.rotation)
    }

    fn set_transform(&mut self, body: BodyHandle, position: Vec3, rotation: Quat) {
        if let Some(d) = self.desc_mut(body) {
            d.position = position;
            d.rotation = rotation;
            self.stats.transform_writes += 1;
        }
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.desc(body).map(|d| d.linear_velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(d) = self.desc_mut(body) {
            d.linear_velocity = velocity;
        }
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.desc(body).map(|d| d.angular_velocity)
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(d) = self.desc_mut(body) {
            d.angular_velocity = velocity;
        }
    }

    fn damping(&self, body: BodyHandle) -> Option<(f32, f32)> {
        self.desc(body).map(|d| (d.linear_damping, d.angular_damping))
    }

    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32) {
        if let Some(d) = self.desc_mut(body) {
            d.linear_damping = linear;
            d.angular_damping = angular;
        }
    }

    fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.desc(body).map(|d| d.mass)
    }

    fn set_mass(&mut self, body: BodyHandle, mass: f32) {
        if let Some(d) = self.desc_mut(body) {
            d.mass = mass;
        }
    }

    fn rotation_factor(&self, body: BodyHandle) -> Option<Vec3> {
        self.desc(body).map(|d| d.rotation_factor)
    }

    fn set_rotation_factor(&mut self, body: BodyHandle, factor: Vec3) {
        if let Some(d) = self.desc_mut(body) {
            d.rotation_factor = factor;
        }
    }

    fn gravity_scale(&self, body: BodyHandle) -> Option<f32> {
        self.desc(body).map(|d| d.gravity_scale)
    }

    fn set_gravity_scale(&mut self, body: BodyHandle, scale: f32) {
        if let Some(d) = self.desc_mut(body) {
            d.gravity_scale = scale;
        }
    }

    fn set_auto_sleep(&mut self, body: BodyHandle, auto_sleep: bool) {
        if let Some(d) = self.desc_mut(body) {
            d.auto_sleep = auto_sleep;
        }
    }

    fn is_sleeping(&self, body: BodyHandle) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.sleeping)
    }

    fn sleep(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.sleeping = true;
        }
    }

    fn wake(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.sleeping = false;
            self.stats.wakes += 1;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ColliderShape;

    fn dynamic_at(world: &mut HeadlessWorld, position: Vec3) -> BodyHandle {
        let body = world.create_body(&BodyDesc {
            position,
            ..BodyDesc::default()
        });
        world.add_body(body);
        body
    }

    #[test]
    fn test_body_outside_world_does_not_move() {
        let mut world = HeadlessWorld::new(Vec3::new(0.0, -10.0, 0.0));
        let body = world.create_body(&BodyDesc::default());
        world.step(1.0);
        assert_eq!(world.position(body), Some(Vec3::ZERO));
        assert!(!world.contains_body(body));
    }

    #[test]
    fn test_awake_body_moves_by_velocity_only() {
        let mut world = HeadlessWorld::new(Vec3::new(0.0, -10.0, 0.0));
        let body = dynamic_at(&mut world, Vec3::ZERO);
        world.set_linear_velocity(body, Vec3::new(2.0, 0.0, 0.0));
        world.step(0.5);
        assert_eq!(world.linear_velocity(body), Some(Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(world.position(body), Some(Vec3::X));
        assert_eq!(world.stats().steps, 1);
    }

    #[test]
    fn test_static_body_stays_put() {
        let mut world = HeadlessWorld::default();
        let body = dynamic_at(&mut world, Vec3::ZERO);
        world.set_body_kind(body, BodyKind::Static);
        world.set_linear_velocity(body, Vec3::X);
        world.step(1.0);
        assert_eq!(world.position(body), Some(Vec3::ZERO));
    }

    #[test]
    fn test_sleeping_body_is_frozen_until_woken() {
        let mut world = HeadlessWorld::default();
        let body = dynamic_at(&mut world, Vec3::ZERO);
        world.set_linear_velocity(body, Vec3::Y);
        world.sleep(body);
        world.step(1.0);
        assert_eq!(world.position(body), Some(Vec3::ZERO));

        world.wake(body);
        world.step(1.0);
        assert_eq!(world.position(body), Some(Vec3::Y));
        assert_eq!(world.stats().wakes, 1);
    }

    #[test]
    fn test_destroy_body_drops_shapes_and_constraints() {
        let mut world = HeadlessWorld::default();
        let a = dynamic_at(&mut world, Vec3::ZERO);
        let b = dynamic_at(&mut world, Vec3::X);
        let shape = ShapeDesc {
            shape: ColliderShape::Sphere { radius: 1.0 },
            offset: Vec3::ZERO,
            friction: 0.2,
            restitution: 0.2,
        };
        world.add_shape(a, &shape).unwrap();
        world
            .add_constraint(&ConstraintDesc {
                kind: crate::backend::JointKind::Ball,
                body_a: a,
                body_b: Some(b),
                anchor_a: Vec3::ZERO,
                anchor_b: Vec3::ZERO,
                axis_a: Vec3::X,
                axis_b: Vec3::X,
            })
            .unwrap();

        world.destroy_body(a);
        assert_eq!(world.num_shapes(a), 0);
        assert_eq!(world.constraint_count(), 0);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_set_transform_is_counted() {
        let mut world = HeadlessWorld::default();
        let body = dynamic_at(&mut world, Vec3::ZERO);
        world.set_transform(body, Vec3::ONE, Quat::IDENTITY);
        assert_eq!(world.position(body), Some(Vec3::ONE));
        assert_eq!(world.stats().transform_writes, 1);
    }
}
