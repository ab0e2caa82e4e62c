//! Moving entities between parents and scenes.
//!
//! A subtree always belongs to the scene of its root. When a move changes
//! that scene, every effective-enabled instance in the subtree leaves the old
//! scene's collections and joins the new one's. Enable/disable hooks are not
//! re-run; instances get `on_scene_exit` before and `on_scene_enter` after.

use engine_component::{EntityId, InstanceId, SceneId};
use tracing::debug;

use crate::error::SceneError;
use crate::node::Parent;
use crate::world::{Hook, World};

impl World {
    /// Make `entity` a root of `scene`, detaching it from its current parent.
    pub fn add_entity(&mut self, scene: SceneId, entity: EntityId) -> Result<(), SceneError> {
        if !self.scenes.contains_key(&scene) {
            return Err(SceneError::SceneNotFound(scene));
        }
        let from = self.node(entity)?.scene;
        self.move_subtree(entity, from, Some(scene), |world| {
            world.unlink(entity)?;
            world.node_mut(entity)?.parent = Parent::Scene(scene);
            if let Some(target) = world.scenes.get_mut(&scene) {
                target.roots.push(entity);
            }
            Ok(())
        })
    }

    /// [`add_entity`](Self::add_entity) for each entity in order, stopping
    /// at the first failure.
    pub fn add_entities(
        &mut self,
        scene: SceneId,
        entities: impl IntoIterator<Item = EntityId>,
    ) -> Result<(), SceneError> {
        for entity in entities {
            self.add_entity(scene, entity)?;
        }
        Ok(())
    }

    /// Detach `entity` from its parent or scene. Its subtree stays intact
    /// but belongs to no scene until attached again.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<(), SceneError> {
        let from = self.node(entity)?.scene;
        self.move_subtree(entity, from, None, |world| world.unlink(entity))
    }

    /// Re-parent `entity` under `parent`, relocating it to the parent's
    /// scene when that differs.
    pub fn set_parent(&mut self, entity: EntityId, parent: EntityId) -> Result<(), SceneError> {
        let from = self.node(entity)?.scene;
        let to = self.node(parent)?.scene;
        if self.is_ancestor_or_self(entity, parent) {
            return Err(SceneError::Cycle { entity, parent });
        }
        self.move_subtree(entity, from, to, |world| {
            world.unlink(entity)?;
            world.node_mut(entity)?.parent = Parent::Entity(parent);
            world.node_mut(parent)?.children.push(entity);
            Ok(())
        })
    }

    /// `entity` followed by all its descendants, depth first.
    #[must_use]
    pub fn subtree(&self, entity: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![entity];
        while let Some(id) = stack.pop() {
            let Some(node) = self.entities.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Whether `ancestor` is `entity` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entities.get(&id).and_then(|node| node.parent_entity());
        }
        false
    }

    fn move_subtree(
        &mut self,
        root: EntityId,
        from: Option<SceneId>,
        to: Option<SceneId>,
        relink: impl FnOnce(&mut World) -> Result<(), SceneError>,
    ) -> Result<(), SceneError> {
        if from == to {
            return relink(self);
        }
        let subtree = self.subtree(root);
        if from.is_some() {
            self.leave_scene(&subtree)?;
        }
        relink(self)?;
        if let Some(scene) = to {
            self.enter_scene(&subtree, scene)?;
        }
        debug!(entity = %root, ?from, ?to, entities = subtree.len(), "subtree relocated");
        Ok(())
    }

    fn leave_scene(&mut self, subtree: &[EntityId]) -> Result<(), SceneError> {
        for &entity in subtree {
            for instance in self.instance_ids(entity)?.into_iter().rev() {
                self.run_hook(instance, Hook::SceneExit)?;
            }
        }
        for &entity in subtree {
            let node = self
                .entities
                .get_mut(&entity)
                .ok_or(SceneError::EntityNotFound(entity))?;
            let Some(scene_id) = node.scene.take() else {
                continue;
            };
            let Some(scene) = self.scenes.get_mut(&scene_id) else {
                continue;
            };
            for c in node.components.iter().filter(|c| c.lifecycle.is_enabled(node.enabled)) {
                scene.leave(c.type_id, c.id);
            }
        }
        Ok(())
    }

    fn enter_scene(&mut self, subtree: &[EntityId], scene_id: SceneId) -> Result<(), SceneError> {
        let scene = self
            .scenes
            .get_mut(&scene_id)
            .ok_or(SceneError::SceneNotFound(scene_id))?;
        for &entity in subtree {
            let node = self
                .entities
                .get_mut(&entity)
                .ok_or(SceneError::EntityNotFound(entity))?;
            node.scene = Some(scene_id);
            for c in node.components.iter().filter(|c| c.lifecycle.is_enabled(node.enabled)) {
                scene.join(c.type_id, c.id);
            }
        }
        for &entity in subtree {
            for instance in self.instance_ids(entity)? {
                self.run_hook(instance, Hook::SceneEnter)?;
            }
        }
        Ok(())
    }

    fn instance_ids(&self, entity: EntityId) -> Result<Vec<InstanceId>, SceneError> {
        Ok(self.node(entity)?.components.iter().map(|c| c.id).collect())
    }
}
