//! Context handed to component hooks.

use engine_math::{Mat4, Transform3D};

use crate::entity::{EntityId, InstanceId, SceneId};
use crate::resources::Resources;

/// What a hook can see of the world: its owning entity and scene, the
/// entity's world transform at call time, and the scene and application
/// resources.
pub struct HookContext<'a> {
    entity: EntityId,
    instance: InstanceId,
    scene: Option<SceneId>,
    enabled: bool,
    world_transform: Mat4,
    scene_resources: Option<&'a mut Resources>,
    app: &'a mut Resources,
}

impl<'a> HookContext<'a> {
    #[must_use]
    pub fn new(
        entity: EntityId,
        instance: InstanceId,
        world_transform: Mat4,
        app: &'a mut Resources,
    ) -> Self {
        Self {
            entity,
            instance,
            scene: None,
            enabled: false,
            world_transform,
            scene_resources: None,
            app,
        }
    }

    /// Attach the scene the entity currently belongs to.
    #[must_use]
    pub fn with_scene(mut self, scene: SceneId, resources: &'a mut Resources) -> Self {
        self.scene = Some(scene);
        self.scene_resources = Some(resources);
        self
    }

    /// Record the instance's effective-enabled state at call time.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The owning entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The instance the hook runs for.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The owning scene, if the entity is attached to one.
    #[must_use]
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Whether the instance is effective-enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    /// The entity's world transform decomposed into position, rotation and
    /// scale.
    #[must_use]
    pub fn world(&self) -> Transform3D {
        Transform3D::from_matrix(self.world_transform)
    }

    #[must_use]
    pub fn scene_resource<T: 'static>(&self) -> Option<&T> {
        self.scene_resources.as_deref()?.get::<T>()
    }

    pub fn scene_resource_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.scene_resources.as_deref_mut()?.get_mut::<T>()
    }

    /// Application-wide resources.
    #[must_use]
    pub fn app(&self) -> &Resources {
        &*self.app
    }

    pub fn app_mut(&mut self) -> &mut Resources {
        &mut *self.app
    }
}
