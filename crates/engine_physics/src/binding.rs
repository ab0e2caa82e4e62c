//! Per-scene physics state.
//!
//! A scene simulated by physics carries one [`PhysicsScene`] resource: the
//! world implementation plus a binding from each entity with a rigidbody to
//! its body handle.

use std::collections::HashMap;

use engine_component::EntityId;
use engine_math::{Quat, Transform3D, Vec3};

use crate::backend::{BodyHandle, PhysicsWorld};

/// An entity's body and the world transform last synced with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBodyBinding {
    pub body: BodyHandle,
    pub position: Vec3,
    pub rotation: Quat,
    /// World scale the entity's collision shapes were built with.
    pub scale: Vec3,
}

impl PhysicsBodyBinding {
    #[must_use]
    pub fn new(body: BodyHandle, world: &Transform3D) -> Self {
        Self {
            body,
            position: world.position,
            rotation: world.rotation,
            scale: world.scale,
        }
    }
}

pub struct PhysicsScene {
    world: Box<dyn PhysicsWorld>,
    bindings: HashMap<EntityId, PhysicsBodyBinding>,
}

impl PhysicsScene {
    #[must_use]
    pub fn new(world: Box<dyn PhysicsWorld>) -> Self {
        Self {
            world,
            bindings: HashMap::new(),
        }
    }

    #[must_use]
    pub fn world(&self) -> &dyn PhysicsWorld {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> &mut dyn PhysicsWorld {
        self.world.as_mut()
    }

    /// The world implementation as its concrete type.
    #[must_use]
    pub fn backend<T: PhysicsWorld + 'static>(&self) -> Option<&T> {
        self.world.as_any().downcast_ref::<T>()
    }

    pub fn backend_mut<T: PhysicsWorld + 'static>(&mut self) -> Option<&mut T> {
        self.world.as_any_mut().downcast_mut::<T>()
    }

    #[must_use]
    pub fn binding(&self, entity: EntityId) -> Option<&PhysicsBodyBinding> {
        self.bindings.get(&entity)
    }

    pub fn binding_mut(&mut self, entity: EntityId) -> Option<&mut PhysicsBodyBinding> {
        self.bindings.get_mut(&entity)
    }

    #[must_use]
    pub fn body_of(&self, entity: EntityId) -> Option<BodyHandle> {
        self.bindings.get(&entity).map(|b| b.body)
    }

    pub fn bind(
        &mut self,
        entity: EntityId,
        binding: PhysicsBodyBinding,
    ) -> Option<PhysicsBodyBinding> {
        self.bindings.insert(entity, binding)
    }

    pub fn unbind(&mut self, entity: EntityId) -> Option<PhysicsBodyBinding> {
        self.bindings.remove(&entity)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (EntityId, &PhysicsBodyBinding)> {
        self.bindings.iter().map(|(entity, binding)| (*entity, binding))
    }
}

impl std::fmt::Debug for PhysicsScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsScene")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}
