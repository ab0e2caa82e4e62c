//! The `joint` component: a constraint from the entity's body to another
//! entity's body, or to the world when no entity is linked.

use std::any::Any;

use engine_component::{
    Component, ComponentConfig, ComponentError, ComponentType, EntityId, HookContext,
};
use engine_math::Vec3;
use engine_schema::{FieldKind, FieldSpec, Record, Schema, Value};
use tracing::warn;

use crate::backend::{ConstraintDesc, ConstraintHandle, JointKind};
use crate::binding::PhysicsScene;
use crate::components::rigidbody::RIGIDBODY;

pub const JOINT: &str = "joint";

#[derive(Debug)]
pub struct Joint {
    kind: JointKind,
    linked: Option<EntityId>,
    anchor: Vec3,
    linked_anchor: Vec3,
    axis: Vec3,
    linked_axis: Vec3,
    constraint: Option<ConstraintHandle>,
}

impl Default for Joint {
    fn default() -> Self {
        Self {
            kind: JointKind::Ball,
            linked: None,
            anchor: Vec3::ZERO,
            linked_anchor: Vec3::ZERO,
            axis: Vec3::X,
            linked_axis: Vec3::X,
            constraint: None,
        }
    }
}

impl Joint {
    #[must_use]
    pub fn kind(&self) -> JointKind {
        self.kind
    }

    #[must_use]
    pub fn linked_entity(&self) -> Option<EntityId> {
        self.linked
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.constraint.is_some()
    }

    fn attach(&mut self, ctx: &mut HookContext<'_>) {
        let entity = ctx.entity();
        let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() else {
            return;
        };
        let Some(body_a) = physics.body_of(entity) else {
            warn!(entity = %entity, "joint has no body on its own entity");
            return;
        };
        let body_b = match self.linked {
            Some(linked) => match physics.body_of(linked) {
                Some(body) => Some(body),
                None => {
                    warn!(entity = %entity, linked = %linked, "joint target has no body");
                    return;
                }
            },
            None => None,
        };
        self.constraint = physics.world_mut().add_constraint(&ConstraintDesc {
            kind: self.kind,
            body_a,
            body_b,
            anchor_a: self.anchor,
            anchor_b: self.linked_anchor,
            axis_a: self.axis,
            axis_b: self.linked_axis,
        });
    }

    fn detach(&mut self, ctx: &mut HookContext<'_>) {
        let Some(constraint) = self.constraint.take() else {
            return;
        };
        if let Some(physics) = ctx.scene_resource_mut::<PhysicsScene>() {
            physics.world_mut().remove_constraint(constraint);
        }
    }
}

impl Component for Joint {
    fn start(&mut self, _ctx: &mut HookContext<'_>, data: &Record) -> Result<(), ComponentError> {
        let vec3 = |key: &str, default: Vec3| {
            data.get(key).and_then(Value::as_vec3).unwrap_or(default)
        };
        self.kind = match data.get("type").and_then(Value::as_str).unwrap_or("ball") {
            "ball" => JointKind::Ball,
            "hinge" => JointKind::Hinge,
            "cylindrical" => JointKind::Cylindrical,
            "fixed" => JointKind::Fixed,
            other => {
                return Err(ComponentError::construction(
                    JOINT,
                    format!("unknown joint type '{other}'"),
                ));
            }
        };
        self.linked = data
            .get("connectedEntity")
            .and_then(Value::as_entity)
            .map(EntityId::from_raw);
        self.anchor = vec3("anchor", Vec3::ZERO);
        self.linked_anchor = vec3("connectedAnchor", Vec3::ZERO);
        self.axis = vec3("axis", Vec3::X);
        self.linked_axis = vec3("connectedAxis", Vec3::X);
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

impl ComponentType for Joint {
    fn type_name() -> &'static str {
        JOINT
    }

    fn config() -> ComponentConfig {
        let axial = ["hinge", "cylindrical"];
        ComponentConfig::new()
            .allow_multiple(true)
            .depends_on(RIGIDBODY)
            .with_schema(
                Schema::new()
                    .field(
                        "type",
                        FieldSpec::select(["ball", "hinge", "cylindrical", "fixed"])
                            .with_default("ball"),
                    )
                    .field("connectedEntity", FieldSpec::new(FieldKind::Entity))
                    .field("anchor", FieldSpec::new(FieldKind::Vector3))
                    .field("connectedAnchor", FieldSpec::new(FieldKind::Vector3))
                    .field(
                        "axis",
                        FieldSpec::new(FieldKind::Vector3)
                            .with_default(Vec3::X)
                            .when("type", axial),
                    )
                    .field(
                        "connectedAxis",
                        FieldSpec::new(FieldKind::Vector3)
                            .with_default(Vec3::X)
                            .when("type", axial),
                    ),
            )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_component::{ComponentRegistry, SceneId};
    use engine_scene::World;

    use super::*;
    use crate::components::register_physics_components;
    use crate::headless::HeadlessWorld;

    fn world_with_physics() -> (World, SceneId) {
        let mut registry = ComponentRegistry::new();
        register_physics_components(&mut registry).unwrap();
        let mut world = World::new(Arc::new(registry));
        let scene = world.create_scene("main");
        world
            .scene_mut(scene)
            .unwrap()
            .resources_mut()
            .insert(PhysicsScene::new(Box::new(HeadlessWorld::default())));
        (world, scene)
    }

    fn constraints(world: &World, scene: SceneId) -> usize {
        world
            .scene(scene)
            .and_then(|s| s.resources().get::<PhysicsScene>())
            .and_then(|p| p.backend::<HeadlessWorld>())
            .map_or(0, HeadlessWorld::constraint_count)
    }

    fn with_body(world: &mut World, scene: SceneId, name: &str) -> EntityId {
        let e = world.spawn_in(scene, name).unwrap();
        world.add_component(e, RIGIDBODY, Record::new()).unwrap();
        e
    }

    #[test]
    fn test_cylindrical_joint_defaults_axes_to_x() {
        let (mut world, scene) = world_with_physics();
        let e = with_body(&mut world, scene, "a");
        let mut data = Record::new();
        data.insert("type".into(), Value::from("cylindrical"));
        let id = world.add_component(e, JOINT, data).unwrap();

        let stored = world.instance(id).unwrap().data();
        assert_eq!(stored.get("axis"), Some(&Value::Vec3(Vec3::X)));
        assert_eq!(stored.get("connectedAxis"), Some(&Value::Vec3(Vec3::X)));
        let joint = world.component::<Joint>(id).unwrap();
        assert_eq!(joint.kind(), JointKind::Cylindrical);
        assert!(joint.is_attached());
    }

    #[test]
    fn test_ball_joint_has_no_axis_fields() {
        let (mut world, scene) = world_with_physics();
        let e = with_body(&mut world, scene, "a");
        let id = world.add_component(e, JOINT, Record::new()).unwrap();
        assert!(!world.instance(id).unwrap().data().contains_key("axis"));
    }

    #[test]
    fn test_joint_links_two_bodies_and_detaches_on_disable() {
        let (mut world, scene) = world_with_physics();
        let a = with_body(&mut world, scene, "a");
        let b = with_body(&mut world, scene, "b");
        let mut data = Record::new();
        data.insert("type".into(), Value::from("hinge"));
        data.insert("connectedEntity".into(), Value::Entity(b.0));
        let id = world.add_component(a, JOINT, data).unwrap();

        assert_eq!(world.component::<Joint>(id).unwrap().linked_entity(), Some(b));
        assert_eq!(constraints(&world, scene), 1);

        world.set_component_enabled(id, false).unwrap();
        assert_eq!(constraints(&world, scene), 0);
        assert!(!world.component::<Joint>(id).unwrap().is_attached());
    }

    #[test]
    fn test_joint_to_entity_without_body_stays_detached() {
        let (mut world, scene) = world_with_physics();
        let a = with_body(&mut world, scene, "a");
        let lonely = world.spawn_in(scene, "lonely").unwrap();
        let mut data = Record::new();
        data.insert("connectedEntity".into(), Value::Entity(lonely.0));
        let id = world.add_component(a, JOINT, data).unwrap();
        assert!(!world.component::<Joint>(id).unwrap().is_attached());
        assert_eq!(constraints(&world, scene), 0);
    }

    #[test]
    fn test_unknown_joint_type_fails_construction() {
        let (mut world, scene) = world_with_physics();
        let a = with_body(&mut world, scene, "a");
        let mut data = Record::new();
        data.insert("type".into(), Value::from("slider"));
        assert!(world.add_component(a, JOINT, data).is_err());
        assert!(world.components_of(a, JOINT).is_empty());
    }
}
