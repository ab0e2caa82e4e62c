//! The `collider` component: one collision shape on the entity's body.
//!
//! Shape dimensions are multiplied by the entity's world scale when the
//! instance starts, so a rescaled entity needs its colliders re-initialised
//! (see [`PhysicsSync`](crate::PhysicsSync)).

use std::any::Any;
use std::collections::HashMap;

use engine_component::{Component, ComponentConfig, ComponentError, ComponentType, HookContext};
use engine_math::Vec3;
use engine_schema::{FieldKind, FieldSpec, Record, Schema, Value};
use tracing::warn;

use crate::backend::{ColliderShape, ShapeDesc, ShapeHandle};
use crate::binding::PhysicsScene;
use crate::components::rigidbody::RIGIDBODY;

pub const COLLIDER: &str = "collider";

/// Application resource: point clouds for mesh colliders, keyed by asset
/// name.
#[derive(Debug, Default, Clone)]
pub struct MeshAssets {
    points: HashMap<String, Vec<Vec3>>,
}

impl MeshAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, points: Vec<Vec3>) {
        self.points.insert(key.into(), points);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[Vec3]> {
        self.points.get(key).map(Vec::as_slice)
    }
}

#[derive(Debug, Default)]
pub struct Collider {
    desc: Option<ShapeDesc>,
    shape: Option<ShapeHandle>,
}

impl Collider {
    /// The shape built by the last start, scaled to world size.
    #[must_use]
    pub fn shape_desc(&self) -> Option<&ShapeDesc> {
        self.desc.as_ref()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.shape.is_some()
    }

    fn attach(&mut self, ctx: &mut HookContext<'_>) {
        let entity = ctx.entity();
        let Some(desc) = &self.desc else {
            return;
        };
        let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() else {
            return;
        };
        let Some(body) = physics.body_of(entity) else {
            warn!(entity = %entity, "collider has no body to attach to");
            return;
        };
        self.shape = physics.world_mut().add_shape(body, desc);
        physics.world_mut().wake(body);
    }

    fn detach(&mut self, ctx: &mut HookContext<'_>) {
        let Some(shape) = self.shape.take() else {
            return;
        };
        if let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() {
            physics.world_mut().remove_shape(shape);
        }
    }
}

fn build_shape(
    ctx: &HookContext<'_>,
    data: &Record,
    scale: Vec3,
) -> Result<ColliderShape, ComponentError> {
    let number = |key: &str, default: f32| data.get(key).and_then(Value::as_f32).unwrap_or(default);
    let radial = scale.x.abs().max(scale.z.abs());

    let shape = match data.get("shape").and_then(Value::as_str).unwrap_or("box") {
        "sphere" => ColliderShape::Sphere {
            radius: number("radius", 0.5) * scale.abs().max_element(),
        },
        "capsule" => ColliderShape::Capsule {
            radius: number("radius", 0.5) * radial,
            half_height: number("halfHeight", 0.5) * scale.y.abs(),
        },
        "cylinder" => ColliderShape::Cylinder {
            radius: number("radius", 0.5) * radial,
            half_height: number("halfHeight", 0.5) * scale.y.abs(),
        },
        "mesh" => {
            let key = data.get("points").and_then(Value::as_str).unwrap_or_default();
            let points = ctx
                .app()
                .get::<MeshAssets>()
                .and_then(|assets| assets.get(key))
                .filter(|points| !points.is_empty())
                .ok_or_else(|| {
                    ComponentError::construction(
                        COLLIDER,
                        format!("mesh collider has no points (asset '{key}')"),
                    )
                })?;
            ColliderShape::ConvexHull {
                points: points.iter().map(|p| *p * scale).collect(),
            }
        }
        "box" => ColliderShape::Box {
            half_extents: data
                .get("halfExtents")
                .and_then(Value::as_vec3)
                .unwrap_or(Vec3::splat(0.5))
                * scale.abs(),
        },
        other => {
            return Err(ComponentError::construction(COLLIDER, format!("unknown shape '{other}'")));
        }
    };
    Ok(shape)
}

impl Component for Collider {
    fn start(&mut self, ctx: &mut HookContext<'_>, data: &Record) -> Result<(), ComponentError> {
        let scale = ctx.world().scale;
        let shape = build_shape(ctx, data, scale)?;
        let number = |key: &str, default: f32| {
            data.get(key).and_then(Value::as_f32).unwrap_or(default)
        };
        self.desc = Some(ShapeDesc {
            shape,
            offset: data.get("offset").and_then(Value::as_vec3).unwrap_or(Vec3::ZERO) * scale,
            friction: number("friction", 0.2),
            restitution: number("restitution", 0.2),
        });
        Ok(())
    }

    fn on_enable(&mut self, ctx: &mut HookContext<'_>) {
        self.attach(ctx);
    }

    fn on_disable(&mut self, ctx: &mut HookContext<'_>) {
        self.detach(ctx);
    }

    fn on_scene_exit(&mut self, ctx: &mut HookContext<'_>) {
        self.detach(ctx);
    }

    fn on_scene_enter(&mut self, ctx: &mut HookContext<'_>) {
        if ctx.is_enabled() {
            self.attach(ctx);
        }
    }

    fn teardown(&mut self, ctx: &mut HookContext<'_>) {
        self.detach(ctx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ComponentType for Collider {
    fn type_name() -> &'static str {
        COLLIDER
    }

    fn config() -> ComponentConfig {
        ComponentConfig::new()
            .allow_multiple(true)
            .depends_on(RIGIDBODY)
            .with_schema(
                Schema::new()
                    .field(
                        "shape",
                        FieldSpec::select(["box", "sphere", "capsule", "cylinder", "mesh"])
                            .with_default("box"),
                    )
                    .field(
                        "halfExtents",
                        FieldSpec::new(FieldKind::Vector3)
                            .with_default(Vec3::splat(0.5))
                            .when("shape", ["box"]),
                    )
                    .field(
                        "radius",
                        FieldSpec::new(FieldKind::Number)
                            .with_default(0.5)
                            .when("shape", ["sphere", "capsule", "cylinder"]),
                    )
                    .field(
                        "halfHeight",
                        FieldSpec::new(FieldKind::Number)
                            .with_default(0.5)
                            .when("shape", ["capsule", "cylinder"]),
                    )
                    .field("points", FieldSpec::new(FieldKind::Asset).when("shape", ["mesh"]))
                    .field("offset", FieldSpec::new(FieldKind::Vector3))
                    .field("friction", FieldSpec::new(FieldKind::Number).with_default(0.2))
                    .field("restitution", FieldSpec::new(FieldKind::Number).with_default(0.2)),
            )
    }
}
