//! Errors raised by world operations.

use engine_component::{ComponentError, EntityId, InstanceId, SceneId};
use engine_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown component type '{0}'")]
    UnknownType(String),

    /// The type does not allow several instances per entity.
    #[error("entity {entity} already holds a '{type_name}' component")]
    Multiplicity { entity: EntityId, type_name: String },

    #[error("'{type_name}' on entity {entity} requires an enabled '{missing}' component")]
    Dependency {
        entity: EntityId,
        type_name: String,
        missing: String,
    },

    #[error("entity {0} does not exist")]
    EntityNotFound(EntityId),

    #[error("scene {0} does not exist")]
    SceneNotFound(SceneId),

    #[error("component instance {0} is not attached to any entity")]
    InstanceNotFound(InstanceId),

    /// The instance's start hook failed; the instance was discarded.
    #[error("'{type_name}' on entity {entity} failed to start")]
    Construction {
        entity: EntityId,
        type_name: String,
        #[source]
        source: ComponentError,
    },

    #[error("entity {entity} cannot be parented under its descendant {parent}")]
    Cycle { entity: EntityId, parent: EntityId },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
