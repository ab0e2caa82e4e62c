//! Errors raised by component types and the registry.

use engine_schema::SchemaError;
use thiserror::Error;

use crate::component::ComponentTypeId;

/// Failure while registering a component type.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A type with this name is already registered.
    #[error("component type '{0}' is already registered")]
    DuplicateType(String),

    /// Two distinct names hash to the same [`ComponentTypeId`].
    #[error("component type '{name}' collides with '{existing}' (id {id:?})")]
    IdCollision {
        name: String,
        existing: String,
        id: ComponentTypeId,
    },

    /// The type's configuration or schema is malformed.
    #[error("invalid configuration for component type '{type_name}'")]
    Configuration {
        type_name: String,
        #[source]
        source: SchemaError,
    },

    /// A type depends on a name that is not registered.
    #[error("component type '{type_name}' depends on unregistered type '{dependency}'")]
    UnknownDependency { type_name: String, dependency: String },
}

/// Failure raised by a component while it is being constructed.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The component rejected its configuration (for example a mesh collider
    /// whose asset is missing).
    #[error("failed to construct '{type_name}': {reason}")]
    Construction { type_name: String, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ComponentError {
    pub fn construction(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}
