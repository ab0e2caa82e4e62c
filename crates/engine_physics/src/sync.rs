//! Per-step reconciliation between entity transforms and physics bodies.
//!
//! Each fixed step runs in three phases over a snapshot of the scene's
//! enabled rigidbodies:
//!
//! 1. **Push.** The entity's world transform is compared to its body. A
//!    position or rotation off by at least `epsilon` in any component is
//!    written into the body, which is then woken. A changed world scale
//!    rebuilds every collider on the entity and wakes the body.
//! 2. **Step.** The world advances by exactly one fixed step.
//! 3. **Write-back.** Every body that is not sleeping writes its position and
//!    rotation back into the entity's local transform, going through the
//!    parent's inverse world transform when the parent is an entity.

use engine_component::{EntityId, SceneId};
use engine_math::{Transform3D, quat_differs, vec3_differs};
use engine_scene::{SceneError, World};
use tracing::{debug, warn};

use crate::backend::{BodyHandle, PhysicsWorld};
use crate::binding::PhysicsScene;
use crate::components::{COLLIDER, RIGIDBODY};
use crate::config::PhysicsConfig;

/// What one [`PhysicsSync::step`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Bodies whose transform was overwritten from their entity.
    pub pushed: usize,
    /// Entities whose colliders were rebuilt for a new scale.
    pub rebuilt: usize,
    pub stepped: bool,
    /// Entities updated from their body after the step.
    pub written_back: usize,
}

#[derive(Debug, Clone)]
pub struct PhysicsSync {
    config: PhysicsConfig,
    shape_types: Vec<String>,
}

impl PhysicsSync {
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            shape_types: vec![COLLIDER.to_owned()],
        }
    }

    /// Also rebuild instances of `type_name` when an entity is rescaled.
    #[must_use]
    pub fn with_shape_type(mut self, type_name: impl Into<String>) -> Self {
        self.shape_types.push(type_name.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Install a physics world on `scene`, replacing any previous one.
    pub fn attach(
        &self,
        world: &mut World,
        scene: SceneId,
        mut backend: Box<dyn PhysicsWorld>,
    ) -> Result<(), SceneError> {
        backend.set_gravity(self.config.gravity);
        let target = world.scene_mut(scene).ok_or(SceneError::SceneNotFound(scene))?;
        if target.resources_mut().insert(PhysicsScene::new(backend)).is_some() {
            warn!(scene = %scene, "replaced existing physics world; old bodies dropped");
        }
        debug!(scene = %scene, gravity = ?self.config.gravity, "physics world attached");
        Ok(())
    }

    /// Run one fixed step for `scene`. Scenes without a physics world are
    /// skipped with a warning.
    pub fn step(
        &self,
        world: &mut World,
        scene: SceneId,
        fixed_timestep: f32,
        elapsed: f32,
    ) -> StepReport {
        let mut report = StepReport::default();
        let rigidbodies = match world.collection(scene, RIGIDBODY) {
            Ok(list) => list.to_vec(),
            Err(err) => {
                warn!(scene = %scene, error = %err, "physics step skipped");
                return report;
            }
        };
        if physics_mut(world, scene).is_none() {
            warn!(scene = %scene, "physics step skipped: scene has no physics world");
            return report;
        }

        let mut bodies: Vec<(EntityId, BodyHandle)> = Vec::with_capacity(rigidbodies.len());
        for instance in rigidbodies {
            let Some(entity) = world.owner_of(instance) else {
                continue;
            };
            if let Some(body) = self.push(world, scene, entity, &mut report) {
                bodies.push((entity, body));
            }
        }

        if let Some(physics) = physics_mut(world, scene) {
            physics.world_mut().step(fixed_timestep);
            report.stepped = true;
        }

        for (entity, body) in bodies {
            if write_back(world, scene, entity, body) {
                report.written_back += 1;
            }
        }

        debug!(
            scene = %scene,
            elapsed,
            pushed = report.pushed,
            rebuilt = report.rebuilt,
            written_back = report.written_back,
            "physics step"
        );
        report
    }

    /// Phase one for a single entity. Returns its body, if bound.
    fn push(
        &self,
        world: &mut World,
        scene: SceneId,
        entity: EntityId,
        report: &mut StepReport,
    ) -> Option<BodyHandle> {
        let current = Transform3D::from_matrix(world.world_matrix(entity).ok()?);
        let epsilon = self.config.epsilon;

        let physics = physics_mut(world, scene)?;
        let mut binding = *physics.binding(entity)?;
        let body = binding.body;
        let body_position = physics.world().position(body).unwrap_or(binding.position);
        let body_rotation = physics.world().rotation(body).unwrap_or(binding.rotation);

        if vec3_differs(body_position, current.position, epsilon)
            || quat_differs(body_rotation, current.rotation, epsilon)
        {
            physics
                .world_mut()
                .set_transform(body, current.position, current.rotation);
            physics.world_mut().wake(body);
            report.pushed += 1;
        }
        binding.position = current.position;
        binding.rotation = current.rotation;

        let rescaled = vec3_differs(binding.scale, current.scale, epsilon);
        if rescaled {
            binding.scale = current.scale;
        }
        physics.bind(entity, binding);

        if rescaled {
            self.rebuild_shapes(world, entity);
            if let Some(physics) = physics_mut(world, scene) {
                physics.world_mut().wake(body);
            }
            report.rebuilt += 1;
        }
        Some(body)
    }

    fn rebuild_shapes(&self, world: &mut World, entity: EntityId) {
        for type_name in &self.shape_types {
            for instance in world.components_of(entity, type_name) {
                if let Err(err) = world.reinitialize(instance) {
                    warn!(
                        entity = %entity,
                        instance = %instance,
                        error = %err,
                        "collider rebuild failed"
                    );
                }
            }
        }
        debug!(entity = %entity, "colliders rebuilt for new scale");
    }
}

impl Default for PhysicsSync {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

fn physics_mut(world: &mut World, scene: SceneId) -> Option<&mut PhysicsScene> {
    world.scene_mut(scene)?.resources_mut().get_mut::<PhysicsScene>()
}

/// Phase three for a single entity. Returns `true` if the entity moved.
fn write_back(world: &mut World, scene: SceneId, entity: EntityId, body: BodyHandle) -> bool {
    let Some(physics) = physics_mut(world, scene) else {
        return false;
    };
    if physics.world().is_sleeping(body) {
        return false;
    }
    let (Some(position), Some(rotation)) =
        (physics.world().position(body), physics.world().rotation(body))
    else {
        return false;
    };
    if let Some(binding) = physics.binding_mut(entity) {
        binding.position = position;
        binding.rotation = rotation;
    }

    let Some(node) = world.entity(entity) else {
        return false;
    };
    let mut local = *node.transform();
    match node.parent_entity() {
        Some(parent) => {
            let Ok(parent_matrix) = world.world_matrix(parent) else {
                return false;
            };
            let parent_rotation = Transform3D::from_matrix(parent_matrix).rotation;
            local.position = parent_matrix.inverse().transform_point3(position);
            local.rotation = (parent_rotation.inverse() * rotation).normalize();
        }
        None => {
            local.position = position;
            local.rotation = rotation;
        }
    }
    world.set_local_transform(entity, local).is_ok()
}
