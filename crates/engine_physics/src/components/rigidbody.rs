//! The `rigidbody` component: owns one body in its scene's physics world.

use std::any::Any;

use engine_component::{Component, ComponentConfig, ComponentError, ComponentType, HookContext};
use engine_math::{Transform3D, Vec3};
use engine_schema::{FieldKind, FieldSpec, Record, Schema, Value};
use tracing::{debug, warn};

use crate::backend::{BodyDesc, BodyHandle, BodyKind};
use crate::binding::{PhysicsBodyBinding, PhysicsScene};

pub const RIGIDBODY: &str = "rigidbody";

#[derive(Debug, Default)]
pub struct Rigidbody {
    desc: BodyDesc,
    kinematic: bool,
    body: Option<BodyHandle>,
}

impl Rigidbody {
    #[must_use]
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    #[must_use]
    pub fn settings(&self) -> &BodyDesc {
        &self.desc
    }

    fn active_kind(&self) -> BodyKind {
        if self.kinematic {
            BodyKind::Kinematic
        } else {
            BodyKind::Dynamic
        }
    }

    /// Create and bind the body in the current scene, or reuse the entity's
    /// existing binding.
    fn ensure_body(&mut self, ctx: &mut HookContext<'_>) -> Option<BodyHandle> {
        let entity = ctx.entity();
        let world: Transform3D = ctx.world();
        let attached = ctx.scene().is_some();
        let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() else {
            if attached {
                warn!(entity = %entity, "scene has no physics world; rigidbody inactive");
            }
            return None;
        };

        if let Some(body) = physics.body_of(entity) {
            self.body = Some(body);
            return self.body;
        }

        let desc = BodyDesc {
            position: world.position,
            rotation: world.rotation,
            ..self.desc.clone()
        };
        let body = physics.world_mut().create_body(&desc);
        physics.bind(entity, PhysicsBodyBinding::new(body, &world));
        debug!(entity = %entity, ?body, "rigidbody created");
        self.body = Some(body);
        self.body
    }

    /// Push the configured settings onto an existing body.
    fn apply_settings(&self, ctx: &mut HookContext<'_>, body: BodyHandle) {
        let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() else {
            return;
        };
        let d = &self.desc;
        let world = physics.world_mut();
        world.set_mass(body, d.mass);
        world.set_damping(body, d.linear_damping, d.angular_damping);
        world.set_linear_velocity(body, d.linear_velocity);
        world.set_angular_velocity(body, d.angular_velocity);
        world.set_rotation_factor(body, d.rotation_factor);
        world.set_gravity_scale(body, d.gravity_scale);
        world.set_auto_sleep(body, d.auto_sleep);
    }

    fn release(&mut self, ctx: &mut HookContext<'_>) {
        let entity = ctx.entity();
        let Some(body) = self.body.take() else {
            return;
        };
        if let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() {
            physics.world_mut().remove_body(body);
            physics.world_mut().destroy_body(body);
            physics.unbind(entity);
        }
    }

    /// Put the body into the simulation with its active kind.
    fn activate(&mut self, ctx: &mut HookContext<'_>) {
        let Some(body) = self.ensure_body(ctx) else {
            return;
        };
        let kind = self.active_kind();
        if let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() {
            let world = physics.world_mut();
            world.set_body_kind(body, kind);
            if !world.contains_body(body) {
                world.add_body(body);
            }
        }
    }
}

fn vec3(data: &Record, key: &str) -> Option<Vec3> {
    data.get(key).and_then(Value::as_vec3)
}

fn number(data: &Record, key: &str) -> Option<f32> {
    data.get(key).and_then(Value::as_f32)
}

impl Component for Rigidbody {
    fn start(&mut self, ctx: &mut HookContext<'_>, data: &Record) -> Result<(), ComponentError> {
        let defaults = BodyDesc::default();
        let use_gravity = data.get("useGravity").and_then(Value::as_bool).unwrap_or(true);
        self.kinematic = data.get("isKinematic").and_then(Value::as_bool).unwrap_or(false);
        self.desc = BodyDesc {
            kind: self.active_kind(),
            mass: number(data, "mass").unwrap_or(defaults.mass),
            linear_damping: number(data, "linearDamping").unwrap_or(defaults.linear_damping),
            angular_damping: number(data, "angularDamping").unwrap_or(defaults.angular_damping),
            linear_velocity: vec3(data, "linearVelocity").unwrap_or(defaults.linear_velocity),
            angular_velocity: vec3(data, "angularVelocity").unwrap_or(defaults.angular_velocity),
            rotation_factor: vec3(data, "rotationFactor").unwrap_or(defaults.rotation_factor),
            gravity_scale: if use_gravity { 1.0 } else { 0.0 },
            auto_sleep: data.get("autoSleep").and_then(Value::as_bool).unwrap_or(true),
            ..defaults
        };

        let existing = self.body;
        if let Some(body) = self.ensure_body(ctx)
            && existing == Some(body)
        {
            self.apply_settings(ctx, body);
        }
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut HookContext<'_>) {
        self.activate(ctx);
    }

    /// A body that still carries shapes stays in the world as a static
    /// obstacle; a bare body leaves the simulation.
    fn on_disable(&mut self, ctx: &mut HookContext<'_>) {
        let Some(body) = self.body else {
            return;
        };
        if let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() {
            let world = physics.world_mut();
            if world.num_shapes(body) > 0 {
                world.set_body_kind(body, BodyKind::Static);
            } else {
                world.remove_body(body);
            }
        }
    }

    fn on_scene_exit(&mut self, ctx: &mut HookContext<'_>) {
        self.release(ctx);
    }

    fn on_scene_enter(&mut self, ctx: &mut HookContext<'_>) {
        if ctx.is_enabled() {
            self.activate(ctx);
        } else if let Some(body) = self.ensure_body(ctx) {
            debug!(entity = %ctx.entity(), ?body, "rigidbody moved while disabled");
        }
    }

    fn teardown(&mut self, ctx: &mut HookContext<'_>) {
        self.release(ctx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ComponentType for Rigidbody {
    fn type_name() -> &'static str {
        RIGIDBODY
    }

    fn config() -> ComponentConfig {
        ComponentConfig::new().with_schema(
            Schema::new()
                .field("mass", FieldSpec::new(FieldKind::Number).with_default(1.0))
                .field("linearDamping", FieldSpec::new(FieldKind::Number))
                .field("angularDamping", FieldSpec::new(FieldKind::Number))
                .field("linearVelocity", FieldSpec::new(FieldKind::Vector3))
                .field("angularVelocity", FieldSpec::new(FieldKind::Vector3))
                .field("isKinematic", FieldSpec::new(FieldKind::Boolean))
                .field("autoSleep", FieldSpec::new(FieldKind::Boolean).with_default(true))
                .field("rotationFactor", FieldSpec::new(FieldKind::Vector3).with_default(Vec3::ONE))
                .field("useGravity", FieldSpec::new(FieldKind::Boolean).with_default(true)),
        )
    }
}
