//! # engine_physics
//!
//! Rigid-body components and the per-step synchronisation between entity
//! transforms and an external physics world.
//!
//! The simulation itself sits behind the [`PhysicsWorld`] trait. A scene is
//! made physical by [`PhysicsSync::attach`], which stores a [`PhysicsScene`]
//! in its resources; [`PhysicsSync::step`] then runs push, step and
//! write-back once per fixed step. [`HeadlessWorld`] is a collision-free
//! integrator for tools and tests.

pub mod backend;
pub mod binding;
pub mod components;
pub mod config;
pub mod headless;
pub mod sync;

pub use backend::{
    BodyDesc, BodyHandle, BodyKind, ColliderShape, ConstraintDesc, ConstraintHandle, JointKind,
        PhysicsWorld,
    ShapeDesc, ShapeHandle,
};
pub use binding::{PhysicsBodyBinding, PhysicsScene};
pub use components::{
    COLLIDER, Collider, JOINT, Joint, MeshAssets, RIGIDBODY, Rigidbody, register_physics_components,
};
pub use config::{DEFAULT_GRAVITY, PhysicsConfig};
pub use headless::{HeadlessStats, HeadlessWorld};
pub use sync::{PhysicsSync, StepReport};
