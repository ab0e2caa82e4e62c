//! Entity nodes and the component instances they own.

use engine_component::{
    Component, ComponentTypeId, EntityId, InstanceId, Lifecycle, SceneId,
};
use engine_math::Transform3D;
use engine_schema::Record;
use uuid::Uuid;

/// Where an entity hangs in the ownership tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Not attached to anything.
    None,
    /// A root entity of the scene.
    Scene(SceneId),
    /// A child of another entity.
    Entity(EntityId),
}

/// One entity of the world.
#[derive(Debug)]
pub struct EntityNode {
    pub(crate) id: EntityId,
    pub(crate) uuid: Uuid,
    pub(crate) name: String,
    pub(crate) enabled: bool,
    pub(crate) parent: Parent,
    pub(crate) children: Vec<EntityId>,
    /// Scene of the subtree root, shared by every descendant.
    pub(crate) scene: Option<SceneId>,
    pub(crate) transform: Transform3D,
    pub(crate) components: Vec<ComponentInstance>,
}

impl EntityNode {
    pub(crate) fn new(id: EntityId, name: String) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            name,
            enabled: true,
            parent: Parent::None,
            children: Vec::new(),
            scene: None,
            transform: Transform3D::IDENTITY,
            components: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Identity that stays stable across runs, unlike [`EntityNode::id`].
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity's own enabled flag. Ancestors are not consulted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// The parent entity, if this is not a root.
    #[must_use]
    pub fn parent_entity(&self) -> Option<EntityId> {
        match self.parent {
            Parent::Entity(parent) => Some(parent),
            Parent::None | Parent::Scene(_) => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    #[must_use]
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Transform relative to the parent entity, or to the world for roots.
    #[must_use]
    pub fn transform(&self) -> &Transform3D {
        &self.transform
    }

    /// Owned instances in insertion order.
    #[must_use]
    pub fn components(&self) -> &[ComponentInstance] {
        &self.components
    }

    pub(crate) fn instance(&self, id: InstanceId) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> Option<&mut ComponentInstance> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub(crate) fn has_type(&self, type_id: ComponentTypeId) -> bool {
        self.components.iter().any(|c| c.type_id == type_id)
    }

    /// Whether an instance of `type_id` with its explicit flag set exists.
    pub(crate) fn has_explicitly_enabled(&self, type_id: ComponentTypeId) -> bool {
        self.components
            .iter()
            .any(|c| c.type_id == type_id && c.lifecycle.is_explicitly_enabled())
    }
}

/// A component attached to an entity.
pub struct ComponentInstance {
    pub(crate) id: InstanceId,
    entity: EntityId,
    pub(crate) type_id: ComponentTypeId,
    pub(crate) type_name: String,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) data: Record,
    pub(crate) behavior: Box<dyn Component>,
}

impl ComponentInstance {
    pub(crate) fn new(
        id: InstanceId,
        entity: EntityId,
        type_id: ComponentTypeId,
        type_name: String,
        data: Record,
        behavior: Box<dyn Component>,
    ) -> Self {
        Self {
            id,
            entity,
            type_id,
            type_name,
            lifecycle: Lifecycle::new(),
            data,
            behavior,
        }
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The owning entity. Fixed at creation.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The sanitized configuration record.
    #[must_use]
    pub fn data(&self) -> &Record {
        &self.data
    }

    #[must_use]
    pub fn is_explicitly_enabled(&self) -> bool {
        self.lifecycle.is_explicitly_enabled()
    }

    #[must_use]
    pub fn behavior(&self) -> &dyn Component {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn Component {
        self.behavior.as_mut()
    }

    /// Downcast the behaviour to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.behavior.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.behavior.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("entity", &self.entity)
            .field("type_name", &self.type_name)
            .field("lifecycle", &self.lifecycle)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
