//! The physics world capability.
//!
//! [`PhysicsWorld`] is everything the runtime needs from a rigid-body
//! engine. Bodies, shapes and constraints are referred to by opaque handles
//! owned by the implementation; unknown handles are ignored by setters and
//! yield `None` from getters.

use std::any::Any;

use engine_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Handle to a collision shape attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

/// Handle to a constraint between bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub u64);

/// How the solver treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyKind {
    #[default]
    Dynamic,
    Static,
    Kinematic,
}

/// Initial state of a new body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Per-axis multiplier on angular motion; zero locks an axis.
    pub rotation_factor: Vec3,
    pub gravity_scale: f32,
    pub auto_sleep: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mass: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            rotation_factor: Vec3::ONE,
            gravity_scale: 1.0,
            auto_sleep: true,
        }
    }
}

/// Collision geometry, already scaled to world size.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Capsule { radius: f32, half_height: f32 },
    Cylinder { radius: f32, half_height: f32 },
    ConvexHull { points: Vec<Vec3> },
}

impl ColliderShape {
    /// Radius of a sphere centred on the shape origin that encloses it.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Box { half_extents } => half_extents.length(),
            Self::Sphere { radius } => *radius,
            Self::Capsule { radius, half_height } => radius + half_height,
            Self::Cylinder { radius, half_height } => radius.hypot(*half_height),
            Self::ConvexHull { points } => points.iter().map(|p| p.length()).fold(0.0, f32::max),
        }
    }
}

/// A shape plus its placement and material.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDesc {
    pub shape: ColliderShape,
    /// Offset from the body origin.
    pub offset: Vec3,
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// Point-to-point.
    Ball,
    /// Rotation about one axis.
    Hinge,
    /// Rotation about and sliding along one axis.
    Cylindrical,
    Fixed,
}

/// A constraint between a body and an optional second body (the world
/// when absent).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDesc {
    pub kind: JointKind,
    pub body_a: BodyHandle,
    pub body_b: Option<BodyHandle>,
    /// Anchor in `body_a`'s local space.
    pub anchor_a: Vec3,
    /// Anchor in `body_b`'s local space.
    pub anchor_b: Vec3,
    pub axis_a: Vec3,
    pub axis_b: Vec3,
}

/// An external rigid-body simulation.
pub trait PhysicsWorld {
    /// Create a body. It takes part in the simulation only after
    /// [`PhysicsWorld::add_body`].
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Destroy a body together with its shapes and constraints.
    fn destroy_body(&mut self, body: BodyHandle);

    fn add_body(&mut self, body: BodyHandle);

    fn remove_body(&mut self, body: BodyHandle);

    /// Whether the body currently takes part in the simulation.
    fn contains_body(&self, body: BodyHandle) -> bool;

    fn body_kind(&self, body: BodyHandle) -> Option<BodyKind>;

    fn set_body_kind(&mut self, body: BodyHandle, kind: BodyKind);

    fn add_shape(&mut self, body: BodyHandle, shape: &ShapeDesc) -> Option<ShapeHandle>;

    fn remove_shape(&mut self, shape: ShapeHandle);

    fn num_shapes(&self, body: BodyHandle) -> usize;

    fn add_constraint(&mut self, desc: &ConstraintDesc) -> Option<ConstraintHandle>;

    fn remove_constraint(&mut self, constraint: ConstraintHandle);

    /// Advance the simulation by exactly `dt` seconds.
    fn step(&mut self, dt: f32);

    fn gravity(&self) -> Vec3;

    fn set_gravity(&mut self, gravity: Vec3);

    fn position(&self, body: BodyHandle) -> Option<Vec3>;

    fn rotation(&self, body: BodyHandle) -> Option<Quat>;

    /// Teleport a body. Previous and interpolated state are reset to the new
    /// transform so no interpolation happens across the jump.
    fn set_transform(&mut self, body: BodyHandle, position: Vec3, rotation: Quat);

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// `(linear, angular)` damping.
    fn damping(&self, body: BodyHandle) -> Option<(f32, f32)>;

    fn set_damping(&mut self, body: BodyHandle, linear: f32, angular: f32);

    fn mass(&self, body: BodyHandle) -> Option<f32>;

    fn set_mass(&mut self, body: BodyHandle, mass: f32);

    fn rotation_factor(&self, body: BodyHandle) -> Option<Vec3>;

    fn set_rotation_factor(&mut self, body: BodyHandle, factor: Vec3);

    fn gravity_scale(&self, body: BodyHandle) -> Option<f32>;

    fn set_gravity_scale(&mut self, body: BodyHandle, scale: f32);

    fn set_auto_sleep(&mut self, body: BodyHandle, auto_sleep: bool);

    fn is_sleeping(&self, body: BodyHandle) -> bool;

    fn sleep(&mut self, body: BodyHandle);

    fn wake(&mut self, body: BodyHandle);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_radius() {
        let sphere = ColliderShape::Sphere { radius: 2.0 };
        assert_eq!(sphere.bounding_radius(), 2.0);
        let capsule = ColliderShape::Capsule { radius: 0.5, half_height: 1.0 };
        assert_eq!(capsule.bounding_radius(), 1.5);
        let hull = ColliderShape::ConvexHull {
            points: vec![Vec3::X, Vec3::new(0.0, 3.0, 4.0)],
        };
        assert_eq!(hull.bounding_radius(), 5.0);
    }

    #[test]
    fn test_body_kind_serde() {
        let kind: BodyKind = serde_json::from_str("\"kinematic\"").unwrap();
        assert_eq!(kind, BodyKind::Kinematic);
        assert_eq!(BodyDesc::default().kind, BodyKind::Dynamic);
    }
}
