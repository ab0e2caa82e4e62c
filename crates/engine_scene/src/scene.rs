//! Scenes and their per-type collections.

use std::collections::HashMap;

use engine_component::{
    ComponentRegistry, ComponentTypeId, EntityId, InstanceId, Resources, SceneId,
};

/// A scene: root entities, one ordered collection per registered type, and
/// scene-scoped resources (such as the physics world).
///
/// A collection holds exactly the effective-enabled instances of its type
/// among the scene's entities, in the order they were enabled. It is only
/// mutated by enable/disable transitions and by subtree relocation.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    name: String,
    pub(crate) roots: Vec<EntityId>,
    collections: HashMap<ComponentTypeId, Vec<InstanceId>>,
    pub(crate) resources: Resources,
}

impl Scene {
    pub(crate) fn new(id: SceneId, name: String, registry: &ComponentRegistry) -> Self {
        Self {
            id,
            name,
            roots: Vec::new(),
            collections: registry.iter().map(|d| (d.id, Vec::new())).collect(),
            resources: Resources::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// The enabled instances of `type_id`, in enable order. Empty for types
    /// that are not registered.
    #[must_use]
    pub fn collection(&self, type_id: ComponentTypeId) -> &[InstanceId] {
        self.collections.get(&type_id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    pub(crate) fn join(&mut self, type_id: ComponentTypeId, instance: InstanceId) {
        self.collections.entry(type_id).or_default().push(instance);
    }

    /// Remove the single entry for `instance`. Returns `false` if absent.
    pub(crate) fn leave(&mut self, type_id: ComponentTypeId, instance: InstanceId) -> bool {
        let Some(list) = self.collections.get_mut(&type_id) else {
            return false;
        };
        match list.iter().position(|&i| i == instance) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        }
    }
}
