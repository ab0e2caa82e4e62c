//! The world: entity arena, scenes and component lifecycle.
//!
//! [`World`] owns every entity, every scene and the application resources.
//! Entities refer to each other by [`EntityId`]; component instances are
//! addressed by [`InstanceId`] and live inside their owning entity.
//!
//! All enable/disable effects funnel through one private path that keeps the
//! scene collections in step with each instance's effective state, runs the
//! matching hook and publishes the matching event.

use std::collections::HashMap;
use std::sync::Arc;

use engine_component::{
    Component, ComponentEvent, ComponentRegistry, ComponentTypeDescriptor, EntityId,
    HookContext, IdAllocator, InstanceId, Resources, SceneId, SubscriptionId, Transition,
};
use engine_math::{Mat4, Transform3D};
use engine_schema::Record;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SceneError;
use crate::node::{ComponentInstance, EntityNode, Parent};
use crate::scene::Scene;

/// Which component hook to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Start,
    Enable,
    Disable,
    SceneExit,
    SceneEnter,
    Teardown,
}

/// Entity arena plus scenes.
pub struct World {
    registry: Arc<ComponentRegistry>,
    entity_ids: IdAllocator,
    scene_ids: IdAllocator,
    instance_ids: IdAllocator,
    pub(crate) entities: HashMap<EntityId, EntityNode>,
    pub(crate) scenes: HashMap<SceneId, Scene>,
    /// Owning entity of every live instance.
    owners: HashMap<InstanceId, EntityId>,
    /// Application-wide resources reachable from every hook.
    resources: Resources,
}

impl World {
    /// Create an empty world over a finished registry.
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            entity_ids: IdAllocator::new(),
            scene_ids: IdAllocator::new(),
            instance_ids: IdAllocator::new(),
            entities: Default::default(),
            scenes: Default::default(),
            owners: Default::default(),
            resources: Resources::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    // -- scenes ------------------------------------------------------------

    /// Create a scene with an empty collection for every registered type.
    pub fn create_scene(&mut self, name: impl Into<String>) -> SceneId {
        let id = SceneId(self.scene_ids.allocate());
        let scene = Scene::new(id, name.into(), &self.registry);
        debug!(scene = %id, name = scene.name(), "scene created");
        self.scenes.insert(id, scene);
        id
    }

    #[must_use]
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(&id)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// The enabled instances of `type_name` in `scene`, in enable order.
    pub fn collection(&self, scene: SceneId, type_name: &str) -> Result<&[InstanceId], SceneError> {
        let type_id = self
            .registry
            .id_of(type_name)
            .ok_or_else(|| SceneError::UnknownType(type_name.to_owned()))?;
        let scene = self.scenes.get(&scene).ok_or(SceneError::SceneNotFound(scene))?;
        Ok(scene.collection(type_id))
    }

    // -- entities ----------------------------------------------------------

    /// Create an entity attached to nothing.
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        let id = EntityId(self.entity_ids.allocate());
        self.entities.insert(id, EntityNode::new(id, name.into()));
        id
    }

    /// Create an entity as a root of `scene`.
    pub fn spawn_in(
        &mut self,
        scene: SceneId,
        name: impl Into<String>,
    ) -> Result<EntityId, SceneError> {
        if !self.scenes.contains_key(&scene) {
            return Err(SceneError::SceneNotFound(scene));
        }
        let id = self.spawn(name);
        self.add_entity(scene, id)?;
        Ok(id)
    }

    /// Create an entity as the last child of `parent`.
    pub fn spawn_child(
        &mut self,
        parent: EntityId,
        name: impl Into<String>,
    ) -> Result<EntityId, SceneError> {
        if !self.entities.contains_key(&parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        let id = self.spawn(name);
        self.set_parent(id, parent)?;
        Ok(id)
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityNode> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityNode> {
        self.entities.values()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn find_by_uuid(&self, uuid: Uuid) -> Option<EntityId> {
        self.entities
            .values()
            .find(|node| node.uuid == uuid)
            .map(|node| node.id)
    }

    pub fn set_name(
        &mut self,
        entity: EntityId,
        name: impl Into<String>,
    ) -> Result<(), SceneError> {
        self.node_mut(entity)?.name = name.into();
        Ok(())
    }

    /// Replace the entity's local transform.
    pub fn set_local_transform(
        &mut self,
        entity: EntityId,
        transform: Transform3D,
    ) -> Result<(), SceneError> {
        self.node_mut(entity)?.transform = transform;
        Ok(())
    }

    /// The entity's world matrix, composed from its ancestors on demand.
    pub fn world_matrix(&self, entity: EntityId) -> Result<Mat4, SceneError> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(entity);
        while let Some(id) = current {
            let node = self.node(id)?;
            matrix = node.transform.to_matrix() * matrix;
            current = node.parent_entity();
        }
        Ok(matrix)
    }

    /// Set the entity's own enabled flag.
    ///
    /// Each directly owned instance is re-evaluated; explicit flags are left
    /// untouched so toggling back restores the previous set exactly. Child
    /// entities are not affected.
    pub fn set_entity_enabled(
        &mut self,
        entity: EntityId,
        enabled: bool,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(entity)?;
        if node.enabled == enabled {
            return Ok(());
        }
        let was = node.enabled;
        node.enabled = enabled;
        let transitions: Vec<(InstanceId, Transition)> = node
            .components
            .iter()
            .map(|c| (c.id, c.lifecycle.entity_toggled(was, enabled)))
            .collect();

        debug!(entity = %entity, enabled, "entity toggled");
        for (instance, transition) in transitions {
            self.apply(instance, transition)?;
        }
        Ok(())
    }

    /// Destroy an entity: children first, then its instances in reverse
    /// order (each disabled, then torn down), then detachment from the
    /// parent.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<(), SceneError> {
        let children = self.node(entity)?.children.clone();
        for child in children {
            self.destroy_entity(child)?;
        }

        let instances: Vec<InstanceId> =
            self.node(entity)?.components.iter().map(|c| c.id).collect();
        for instance in instances.into_iter().rev() {
            self.remove_component(instance)?;
        }

        self.unlink(entity)?;
        self.entities.remove(&entity);
        debug!(entity = %entity, "entity destroyed");
        Ok(())
    }

    // -- components --------------------------------------------------------

    /// Attach a new instance of `type_name` to `entity`.
    ///
    /// `data` is completed against the type's schema, the behaviour is
    /// constructed and started, and the instance is enabled if its entity
    /// is. A failing start hook discards the instance and leaves the entity
    /// unchanged.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        type_name: &str,
        data: Record,
    ) -> Result<InstanceId, SceneError> {
        let registry = Arc::clone(&self.registry);
        let descriptor = registry
            .get(type_name)
            .ok_or_else(|| SceneError::UnknownType(type_name.to_owned()))?;

        let node = self.node(entity)?;
        if !descriptor.config.allow_multiple && node.has_type(descriptor.id) {
            return Err(SceneError::Multiplicity {
                entity,
                type_name: type_name.to_owned(),
            });
        }
        check_dependencies(&registry, node, descriptor)?;

        let data = descriptor.config.schema.sanitize(data);
        let id = InstanceId(self.instance_ids.allocate());
        let instance = ComponentInstance::new(
            id,
            entity,
            descriptor.id,
            descriptor.name.clone(),
            data,
            descriptor.instantiate(),
        );
        self.node_mut(entity)?.components.push(instance);
        self.owners.insert(id, entity);

        if let Err(err) = self.run_hook(id, Hook::Start) {
            self.discard(id);
            warn!(entity = %entity, type_name, error = %err, "component construction failed");
            return Err(err);
        }

        debug!(entity = %entity, instance = %id, type_name, "component added");
        if self.node(entity)?.enabled {
            self.apply(id, Transition::Enabled)?;
        }
        Ok(id)
    }

    /// Like [`World::add_component`], converting a JSON object through the
    /// type's schema first.
    pub fn add_component_json(
        &mut self,
        entity: EntityId,
        type_name: &str,
        data: &serde_json::Value,
    ) -> Result<InstanceId, SceneError> {
        let record = self
            .registry
            .get(type_name)
            .ok_or_else(|| SceneError::UnknownType(type_name.to_owned()))?
            .config
            .schema
            .record_from_json(data)?;
        self.add_component(entity, type_name, record)
    }

    /// Disable (if enabled), tear down and detach an instance.
    ///
    /// Returns `Ok(false)` for an instance that is already detached.
    pub fn remove_component(&mut self, instance: InstanceId) -> Result<bool, SceneError> {
        if !self.owners.contains_key(&instance) {
            return Ok(false);
        }
        if self.is_enabled(instance) {
            self.apply(instance, Transition::Disabled)?;
        }
        self.run_hook(instance, Hook::Teardown)?;
        self.publish(instance, ComponentEvent::Removed);

        if let Some(mut removed) = self.discard(instance) {
            removed.lifecycle.listeners_mut().clear();
            debug!(
                entity = %removed.entity(),
                instance = %instance,
                type_name = removed.type_name(),
                "component removed"
            );
        }
        Ok(true)
    }

    /// Set an instance's enabled property.
    ///
    /// Enabling re-checks the type's dependencies. Enabling under a disabled
    /// entity is refused with a warning and reported as
    /// [`Transition::Blocked`].
    pub fn set_component_enabled(
        &mut self,
        instance: InstanceId,
        enabled: bool,
    ) -> Result<Transition, SceneError> {
        let entity = self.owner(instance)?;
        let node = self.node(entity)?;
        let current = node.instance(instance).ok_or(SceneError::InstanceNotFound(instance))?;

        if enabled && node.enabled && !current.lifecycle.is_explicitly_enabled() {
            let registry = Arc::clone(&self.registry);
            let descriptor = registry
                .get_by_id(current.type_id)
                .ok_or_else(|| SceneError::UnknownType(current.type_name.clone()))?;
            check_dependencies(&registry, node, descriptor)?;
        }

        let node = self.node_mut(entity)?;
        let entity_enabled = node.enabled;
        let current = node
            .instance_mut(instance)
            .ok_or(SceneError::InstanceNotFound(instance))?;
        let transition = current.lifecycle.request(enabled, entity_enabled);

        if transition == Transition::Blocked {
            warn!(
                entity = %entity,
                instance = %instance,
                type_name = current.type_name(),
                "cannot enable a component on a disabled entity"
            );
        }
        self.apply(instance, transition)?;
        Ok(transition)
    }

    /// Run the instance's start hook again with its stored data, wrapped in
    /// a disable/enable pair when it is currently enabled.
    ///
    /// If the start hook fails the instance stays disabled.
    pub fn reinitialize(&mut self, instance: InstanceId) -> Result<(), SceneError> {
        let was_enabled = self.is_enabled(instance);
        if was_enabled {
            self.apply(instance, Transition::Disabled)?;
        }
        if let Err(err) = self.run_hook(instance, Hook::Start) {
            // Already out of the collection; clear the flag to match.
            if was_enabled && let Some(current) = self.instance_mut(instance) {
                current.lifecycle.request(false, true);
            }
            warn!(instance = %instance, error = %err, "restart failed; component left disabled");
            return Err(err);
        }
        if was_enabled {
            self.apply(instance, Transition::Enabled)?;
        }
        Ok(())
    }

    /// Subscribe to an instance's `Enabled`/`Disabled`/`Removed` events.
    pub fn subscribe(
        &mut self,
        instance: InstanceId,
        callback: impl FnMut(ComponentEvent) + 'static,
    ) -> Result<SubscriptionId, SceneError> {
        let current = self
            .instance_mut(instance)
            .ok_or(SceneError::InstanceNotFound(instance))?;
        Ok(current.lifecycle.listeners_mut().subscribe(callback))
    }

    pub fn unsubscribe(&mut self, instance: InstanceId, subscription: SubscriptionId) -> bool {
        self.instance_mut(instance)
            .is_some_and(|c| c.lifecycle.listeners_mut().unsubscribe(subscription))
    }

    #[must_use]
    pub fn owner_of(&self, instance: InstanceId) -> Option<EntityId> {
        self.owners.get(&instance).copied()
    }

    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&ComponentInstance> {
        let entity = self.owners.get(&id)?;
        self.entities.get(entity)?.instance(id)
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut ComponentInstance> {
        let entity = self.owners.get(&id)?;
        self.entities.get_mut(entity)?.instance_mut(id)
    }

    /// The instance's behaviour as its concrete type.
    #[must_use]
    pub fn component<T: Component>(&self, id: InstanceId) -> Option<&T> {
        self.instance(id)?.downcast_ref::<T>()
    }

    pub fn component_mut<T: Component>(&mut self, id: InstanceId) -> Option<&mut T> {
        self.instance_mut(id)?.downcast_mut::<T>()
    }

    /// Instances of `type_name` owned by `entity`, in insertion order.
    #[must_use]
    pub fn components_of(&self, entity: EntityId, type_name: &str) -> Vec<InstanceId> {
        self.entities
            .get(&entity)
            .map(|node| {
                node.components
                    .iter()
                    .filter(|c| c.type_name == type_name)
                    .map(|c| c.id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Effective-enabled: explicit flag and owning entity's flag.
    #[must_use]
    pub fn is_enabled(&self, instance: InstanceId) -> bool {
        self.owners
            .get(&instance)
            .and_then(|entity| self.entities.get(entity))
            .and_then(|node| {
                node.instance(instance)
                    .map(|c| c.lifecycle.is_enabled(node.enabled))
            })
            .unwrap_or(false)
    }

    // -- internals ---------------------------------------------------------

    pub(crate) fn node(&self, id: EntityId) -> Result<&EntityNode, SceneError> {
        self.entities.get(&id).ok_or(SceneError::EntityNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: EntityId) -> Result<&mut EntityNode, SceneError> {
        self.entities.get_mut(&id).ok_or(SceneError::EntityNotFound(id))
    }

    fn owner(&self, instance: InstanceId) -> Result<EntityId, SceneError> {
        self.owner_of(instance)
            .ok_or(SceneError::InstanceNotFound(instance))
    }

    /// Carry out an enable/disable transition: collection membership, hook,
    /// event. `Unchanged` and `Blocked` do nothing.
    pub(crate) fn apply(
        &mut self,
        instance: InstanceId,
        transition: Transition,
    ) -> Result<(), SceneError> {
        let Some(event) = transition.event() else {
            return Ok(());
        };
        let entity = self.owner(instance)?;
        let node = self.node(entity)?;
        let type_id = node
            .instance(instance)
            .ok_or(SceneError::InstanceNotFound(instance))?
            .type_id;
        let scene_id = node.scene;

        if let Some(scene) = scene_id.and_then(|id| self.scenes.get_mut(&id)) {
            match transition {
                Transition::Enabled => scene.join(type_id, instance),
                _ => {
                    scene.leave(type_id, instance);
                }
            }
        }

        let hook = if transition == Transition::Enabled {
            Hook::Enable
        } else {
            Hook::Disable
        };
        self.run_hook(instance, hook)?;
        self.publish(instance, event);
        debug!(entity = %entity, instance = %instance, ?event, "component transition");
        Ok(())
    }

    /// Invoke one hook with a context built from the instance's entity, its
    /// scene and the application resources.
    pub(crate) fn run_hook(&mut self, instance: InstanceId, hook: Hook) -> Result<(), SceneError> {
        let entity = self.owner(instance)?;
        let world_transform = self.world_matrix(entity)?;

        let World {
            entities,
            scenes,
            resources,
            ..
        } = self;
        let node = entities
            .get_mut(&entity)
            .ok_or(SceneError::EntityNotFound(entity))?;
        let entity_enabled = node.enabled;
        let scene_id = node.scene;
        let current = node
            .instance_mut(instance)
            .ok_or(SceneError::InstanceNotFound(instance))?;

        let enabled = match hook {
            Hook::Enable => true,
            Hook::Disable | Hook::Teardown => false,
            Hook::Start | Hook::SceneExit | Hook::SceneEnter => {
                current.lifecycle.is_enabled(entity_enabled)
            }
        };
        let mut ctx =
            HookContext::new(entity, instance, world_transform, resources).with_enabled(enabled);
        if let Some(id) = scene_id
            && let Some(scene) = scenes.get_mut(&id)
        {
            ctx = ctx.with_scene(id, &mut scene.resources);
        }

        match hook {
            Hook::Start => current
                .behavior
                .start(&mut ctx, &current.data)
                .map_err(|source| SceneError::Construction {
                    entity,
                    type_name: current.type_name.clone(),
                    source,
                })?,
            Hook::Enable => current.behavior.on_enable(&mut ctx),
            Hook::Disable => current.behavior.on_disable(&mut ctx),
            Hook::SceneExit => current.behavior.on_scene_exit(&mut ctx),
            Hook::SceneEnter => current.behavior.on_scene_enter(&mut ctx),
            Hook::Teardown => current.behavior.teardown(&mut ctx),
        }
        Ok(())
    }

    fn publish(&mut self, instance: InstanceId, event: ComponentEvent) {
        if let Some(current) = self.instance_mut(instance) {
            current.lifecycle.listeners_mut().publish(event);
        }
    }

    /// Detach an instance from its entity without running any hook.
    fn discard(&mut self, instance: InstanceId) -> Option<ComponentInstance> {
        let entity = self.owners.remove(&instance)?;
        let node = self.entities.get_mut(&entity)?;
        let pos = node.components.iter().position(|c| c.id == instance)?;
        Some(node.components.remove(pos))
    }

    /// Remove `entity` from its parent's child list or its scene's roots.
    pub(crate) fn unlink(&mut self, entity: EntityId) -> Result<(), SceneError> {
        let parent = std::mem::replace(&mut self.node_mut(entity)?.parent, Parent::None);
        match parent {
            Parent::None => {}
            Parent::Scene(scene) => {
                if let Some(scene) = self.scenes.get_mut(&scene) {
                    scene.roots.retain(|&e| e != entity);
                }
            }
            Parent::Entity(parent) => {
                if let Some(parent) = self.entities.get_mut(&parent) {
                    parent.children.retain(|&e| e != entity);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("scenes", &self.scenes.len())
            .field("instances", &self.owners.len())
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

/// Every dependency of `descriptor` must be present on `node` with its
/// explicit flag set.
fn check_dependencies(
    registry: &ComponentRegistry,
    node: &EntityNode,
    descriptor: &ComponentTypeDescriptor,
) -> Result<(), SceneError> {
    for dependency in &descriptor.config.dependencies {
        let satisfied = registry
            .id_of(dependency)
            .is_some_and(|id| node.has_explicitly_enabled(id));
        if !satisfied {
            return Err(SceneError::Dependency {
                entity: node.id,
                type_name: descriptor.name.clone(),
                missing: dependency.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine_component::{ComponentConfig, ComponentError, ComponentType};
    use engine_math::{Quat, Vec3};
    use engine_schema::{FieldKind, FieldSpec, Schema, Value};

    use super::*;

    /// Hook calls recorded by [`Tracker`], stored as an application resource.
    #[derive(Debug, Default)]
    struct HookLog(Vec<(InstanceId, &'static str)>);

    impl HookLog {
        fn count(&self, hook: &str) -> usize {
            self.0.iter().filter(|(_, h)| *h == hook).count()
        }
    }

    fn record(ctx: &mut HookContext<'_>, hook: &'static str) {
        let instance = ctx.instance();
        if let Some(log) = ctx.app_mut().get_mut::<HookLog>() {
            log.0.push((instance, hook));
        }
    }

    struct FailStarts;

    #[derive(Default)]
    struct Tracker {
        started: u32,
    }

    impl Component for Tracker {
        fn start(
            &mut self,
            ctx: &mut HookContext<'_>,
            data: &Record,
        ) -> Result<(), ComponentError> {
            let asked = data.get("fail").and_then(Value::as_bool) == Some(true);
            if asked || ctx.app().get::<FailStarts>().is_some() {
                return Err(ComponentError::construction("tracker", "asked to fail"));
            }
            self.started += 1;
            record(ctx, "start");
            Ok(())
        }

        fn on_enable(&mut self, ctx: &mut HookContext<'_>) {
            record(ctx, "enable");
        }

        fn on_disable(&mut self, ctx: &mut HookContext<'_>) {
            record(ctx, "disable");
        }

        fn on_scene_exit(&mut self, ctx: &mut HookContext<'_>) {
            record(ctx, "exit");
        }

        fn on_scene_enter(&mut self, ctx: &mut HookContext<'_>) {
            record(ctx, "enter");
        }

        fn teardown(&mut self, ctx: &mut HookContext<'_>) {
            record(ctx, "teardown");
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl ComponentType for Tracker {
        fn type_name() -> &'static str {
            "tracker"
        }

        fn config() -> ComponentConfig {
            ComponentConfig::new().allow_multiple(true).with_schema(
                Schema::new()
                    .field("fail", FieldSpec::new(FieldKind::Boolean))
                    .field("speed", FieldSpec::new(FieldKind::Number).with_default(2.0)),
            )
        }
    }

    fn world() -> World {
        let mut registry = ComponentRegistry::new();
        registry.register_type::<Tracker>().unwrap();
        registry
            .register("single", Box::new(|| Box::new(Tracker::default())), ComponentConfig::new())
            .unwrap();
        registry
            .register(
                "dependent",
                Box::new(|| Box::new(Tracker::default())),
                ComponentConfig::new().depends_on("single"),
            )
            .unwrap();
        let mut world = World::new(Arc::new(registry));
        world.resources_mut().insert(HookLog::default());
        world
    }

    fn log(world: &World) -> &HookLog {
        world.resources().get::<HookLog>().unwrap()
    }

    #[test]
    fn test_unknown_type() {
        let mut world = world();
        let e = world.spawn("e");
        let err = world.add_component(e, "nope", Record::new()).unwrap_err();
        assert!(matches!(err, SceneError::UnknownType(name) if name == "nope"));
    }

    #[test]
    fn test_multiplicity_leaves_single_instance() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        world.add_component(e, "single", Record::new()).unwrap();
        let err = world.add_component(e, "single", Record::new()).unwrap_err();
        assert!(matches!(err, SceneError::Multiplicity { .. }));
        assert_eq!(world.components_of(e, "single").len(), 1);
        assert_eq!(world.collection(scene, "single").unwrap().len(), 1);
    }

    #[test]
    fn test_allow_multiple() {
        let mut world = world();
        let e = world.spawn("e");
        world.add_component(e, "tracker", Record::new()).unwrap();
        world.add_component(e, "tracker", Record::new()).unwrap();
        assert_eq!(world.components_of(e, "tracker").len(), 2);
    }

    #[test]
    fn test_dependency_required_at_add() {
        let mut world = world();
        let e = world.spawn("e");
        let err = world.add_component(e, "dependent", Record::new()).unwrap_err();
        assert!(matches!(err, SceneError::Dependency { missing, .. } if missing == "single"));

        world.add_component(e, "single", Record::new()).unwrap();
        assert!(world.add_component(e, "dependent", Record::new()).is_ok());
    }

    #[test]
    fn test_dependency_uses_explicit_flag() {
        let mut world = world();
        let e = world.spawn("e");
        world.set_entity_enabled(e, false).unwrap();
        world.add_component(e, "single", Record::new()).unwrap();
        // Entity disabled, but the dependency is explicitly enabled.
        assert!(world.add_component(e, "dependent", Record::new()).is_ok());
    }

    #[test]
    fn test_dependency_checked_on_enable() {
        let mut world = world();
        let e = world.spawn("e");
        let base = world.add_component(e, "single", Record::new()).unwrap();
        let dep = world.add_component(e, "dependent", Record::new()).unwrap();
        world.set_component_enabled(dep, false).unwrap();
        world.set_component_enabled(base, false).unwrap();

        let err = world.set_component_enabled(dep, true).unwrap_err();
        assert!(matches!(err, SceneError::Dependency { .. }));
        assert!(!world.is_enabled(dep));

        world.set_component_enabled(base, true).unwrap();
        assert_eq!(world.set_component_enabled(dep, true).unwrap(), Transition::Enabled);
    }

    #[test]
    fn test_add_sanitizes_data() {
        let mut world = world();
        let e = world.spawn("e");
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        let data = world.instance(id).unwrap().data();
        assert_eq!(data.get("speed"), Some(&Value::Number(2.0)));
        assert_eq!(data.get("fail"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_add_component_json() {
        let mut world = world();
        let e = world.spawn("e");
        let id = world
            .add_component_json(e, "tracker", &serde_json::json!({ "speed": 5 }))
            .unwrap();
        assert_eq!(world.instance(id).unwrap().data().get("speed"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn test_enabled_instances_join_collection_in_order() {
        let mut world = world();
        let scene = world.create_scene("main");
        let a = world.spawn_in(scene, "a").unwrap();
        let b = world.spawn_in(scene, "b").unwrap();
        let first = world.add_component(b, "tracker", Record::new()).unwrap();
        let second = world.add_component(a, "tracker", Record::new()).unwrap();
        assert_eq!(world.collection(scene, "tracker").unwrap(), &[first, second]);
        assert_eq!(log(&world).count("start"), 2);
        assert_eq!(log(&world).count("enable"), 2);
    }

    #[test]
    fn test_construction_failure_discards_instance() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        let ok = world.add_component(e, "tracker", Record::new()).unwrap();

        let mut data = Record::new();
        data.insert("fail".into(), Value::Bool(true));
        let err = world.add_component(e, "tracker", data).unwrap_err();
        assert!(matches!(err, SceneError::Construction { .. }));

        assert_eq!(world.components_of(e, "tracker"), vec![ok]);
        assert_eq!(world.collection(scene, "tracker").unwrap(), &[ok]);
    }

    #[test]
    fn test_entity_toggle_restores_exact_set() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        let a = world.add_component(e, "tracker", Record::new()).unwrap();
        let b = world.add_component(e, "tracker", Record::new()).unwrap();
        let c = world.add_component(e, "tracker", Record::new()).unwrap();
        world.set_component_enabled(b, false).unwrap();

        world.set_entity_enabled(e, false).unwrap();
        assert!(world.collection(scene, "tracker").unwrap().is_empty());
        assert!(world.instance(a).unwrap().is_explicitly_enabled());

        world.set_entity_enabled(e, true).unwrap();
        assert_eq!(world.collection(scene, "tracker").unwrap(), &[a, c]);
        assert!(!world.instance(b).unwrap().is_explicitly_enabled());
        assert_eq!(world.components_of(e, "tracker").len(), 3);
    }

    #[test]
    fn test_entity_toggle_does_not_reach_children() {
        let mut world = world();
        let scene = world.create_scene("main");
        let parent = world.spawn_in(scene, "parent").unwrap();
        let child = world.spawn_child(parent, "child").unwrap();
        let id = world.add_component(child, "tracker", Record::new()).unwrap();
        world.set_entity_enabled(parent, false).unwrap();
        assert!(world.is_enabled(id));
        assert_eq!(world.collection(scene, "tracker").unwrap(), &[id]);
    }

    #[test]
    fn test_enable_on_disabled_entity_is_blocked() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        world.set_component_enabled(id, false).unwrap();
        world.set_entity_enabled(e, false).unwrap();

        assert_eq!(world.set_component_enabled(id, true).unwrap(), Transition::Blocked);
        assert!(!world.instance(id).unwrap().is_explicitly_enabled());
        assert!(world.collection(scene, "tracker").unwrap().is_empty());
    }

    #[test]
    fn test_setting_current_value_publishes_nothing() {
        let mut world = world();
        let e = world.spawn("e");
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        world.subscribe(id, move |event| sink.borrow_mut().push(event)).unwrap();

        assert_eq!(world.set_component_enabled(id, true).unwrap(), Transition::Unchanged);
        assert!(events.borrow().is_empty());

        world.set_component_enabled(id, false).unwrap();
        world.set_component_enabled(id, true).unwrap();
        assert_eq!(*events.borrow(), vec![ComponentEvent::Disabled, ComponentEvent::Enabled]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut world = world();
        let e = world.spawn("e");
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let sub = world.subscribe(id, move |_| *sink.borrow_mut() += 1).unwrap();
        assert!(world.unsubscribe(id, sub));
        world.set_component_enabled(id, false).unwrap();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_remove_component_is_idempotent() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        world.subscribe(id, move |event| sink.borrow_mut().push(event)).unwrap();

        assert!(world.remove_component(id).unwrap());
        assert!(!world.remove_component(id).unwrap());
        assert_eq!(*events.borrow(), vec![ComponentEvent::Disabled, ComponentEvent::Removed]);
        assert!(world.collection(scene, "tracker").unwrap().is_empty());
        assert!(world.owner_of(id).is_none());
        assert_eq!(log(&world).count("teardown"), 1);
    }

    #[test]
    fn test_destroy_children_first_then_instances_in_reverse() {
        let mut world = world();
        let scene = world.create_scene("main");
        let parent = world.spawn_in(scene, "parent").unwrap();
        let child = world.spawn_child(parent, "child").unwrap();
        let p1 = world.add_component(parent, "tracker", Record::new()).unwrap();
        let p2 = world.add_component(parent, "tracker", Record::new()).unwrap();
        let c1 = world.add_component(child, "tracker", Record::new()).unwrap();

        world.destroy_entity(parent).unwrap();

        let teardowns: Vec<InstanceId> = log(&world)
            .0
            .iter()
            .filter(|(_, hook)| *hook == "teardown")
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(teardowns, vec![c1, p2, p1]);
        assert_eq!(world.entity_count(), 0);
        assert!(world.scene(scene).unwrap().roots().is_empty());
        assert!(world.collection(scene, "tracker").unwrap().is_empty());
    }

    #[test]
    fn test_relocation_moves_membership_without_enable_hooks() {
        let mut world = world();
        let from = world.create_scene("from");
        let to = world.create_scene("to");
        let root = world.spawn_in(from, "root").unwrap();
        let child = world.spawn_child(root, "child").unwrap();
        let a = world.add_component(root, "tracker", Record::new()).unwrap();
        let b = world.add_component(child, "tracker", Record::new()).unwrap();
        let off = world.add_component(child, "tracker", Record::new()).unwrap();
        world.set_component_enabled(off, false).unwrap();
        let enables = log(&world).count("enable");
        let disables = log(&world).count("disable");

        world.add_entity(to, root).unwrap();

        assert!(world.collection(from, "tracker").unwrap().is_empty());
        assert_eq!(world.collection(to, "tracker").unwrap(), &[a, b]);
        assert_eq!(world.entity(child).unwrap().scene(), Some(to));
        assert_eq!(log(&world).count("enable"), enables);
        assert_eq!(log(&world).count("disable"), disables);
        assert_eq!(log(&world).count("exit"), 3);
        assert_eq!(log(&world).count("enter"), 3);
    }

    #[test]
    fn test_detached_instances_join_on_attach() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn("loose");
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        assert!(world.is_enabled(id));

        world.add_entity(scene, e).unwrap();
        assert_eq!(world.collection(scene, "tracker").unwrap(), &[id]);

        world.remove_entity(e).unwrap();
        assert!(world.collection(scene, "tracker").unwrap().is_empty());
        assert_eq!(world.entity(e).unwrap().parent(), Parent::None);
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut world = world();
        let a = world.spawn("a");
        let b = world.spawn_child(a, "b").unwrap();
        let c = world.spawn_child(b, "c").unwrap();
        assert!(matches!(world.set_parent(a, c), Err(SceneError::Cycle { .. })));
        assert!(matches!(world.set_parent(a, a), Err(SceneError::Cycle { .. })));
        assert_eq!(world.entity(c).unwrap().parent_entity(), Some(b));
    }

    #[test]
    fn test_world_matrix_composes_ancestors() {
        let mut world = world();
        let parent = world.spawn("parent");
        let child = world.spawn_child(parent, "child").unwrap();
        world
            .set_local_transform(
                parent,
                Transform3D::from_position_rotation(
                    Vec3::new(10.0, 0.0, 0.0),
                    Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                ),
            )
            .unwrap();
        world
            .set_local_transform(child, Transform3D::from_position(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();

        let world_pos = world.world_matrix(child).unwrap().w_axis.truncate();
        assert!(world_pos.abs_diff_eq(Vec3::new(11.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn test_reinitialize_cycles_enabled_instance() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        let other = world.add_component(e, "tracker", Record::new()).unwrap();
        let id = world.add_component(e, "tracker", Record::new()).unwrap();

        world.reinitialize(id).unwrap();

        let hooks: Vec<&str> = log(&world)
            .0
            .iter()
            .filter(|(i, _)| *i == id)
            .map(|(_, h)| *h)
            .collect();
        assert_eq!(hooks, ["start", "enable", "disable", "start", "enable"]);
        assert_eq!(world.component::<Tracker>(id).unwrap().started, 2);
        assert_eq!(world.collection(scene, "tracker").unwrap(), &[other, id]);
    }

    #[test]
    fn test_failed_restart_leaves_instance_disabled() {
        let mut world = world();
        let scene = world.create_scene("main");
        let e = world.spawn_in(scene, "e").unwrap();
        let id = world.add_component(e, "tracker", Record::new()).unwrap();
        world.resources_mut().insert(FailStarts);

        let err = world.reinitialize(id).unwrap_err();

        assert!(matches!(err, SceneError::Construction { .. }));
        assert!(!world.is_enabled(id));
        assert!(world.collection(scene, "tracker").unwrap().is_empty());

        world.remove_component(id).unwrap();
        assert_eq!(log(&world).count("disable"), 1);
        assert_eq!(log(&world).count("teardown"), 1);
    }

    #[test]
    fn test_add_entities_makes_each_a_root_in_order() {
        let mut world = world();
        let scene = world.create_scene("main");
        let a = world.spawn("a");
        let b = world.spawn("b");
        let child = world.spawn_child(a, "child").unwrap();

        world.add_entities(scene, [b, a, child]).unwrap();

        assert_eq!(world.scene(scene).unwrap().roots(), &[b, a, child]);
        assert_eq!(world.entity(child).unwrap().parent_entity(), None);
    }

    #[test]
    fn test_find_by_uuid() {
        let mut world = world();
        let e = world.spawn("e");
        let uuid = world.entity(e).unwrap().uuid();
        assert_eq!(world.find_by_uuid(uuid), Some(e));
        assert_eq!(world.find_by_uuid(Uuid::new_v4()), None);
    }
}
