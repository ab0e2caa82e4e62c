//! Component type registry.
//!
//! Holds one [`ComponentTypeDescriptor`] per registered type name: the
//! factory producing fresh instances plus the type's [`ComponentConfig`].
//! The registry is built once during startup and shared read-only by every
//! scene afterwards.

use std::collections::HashMap;
use std::fmt;

use engine_schema::Schema;
use serde::Deserialize;
use tracing::debug;

use crate::component::{Component, ComponentType, ComponentTypeId};
use crate::error::RegistryError;

/// Constructor of a component behaviour instance.
pub type ComponentFactory = Box<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// Static description of a component type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentConfig {
    /// Whether an entity may hold several instances of the type.
    pub allow_multiple: bool,
    /// Type names that must be present and explicitly enabled on the same
    /// entity before an instance can be added or enabled.
    pub dependencies: Vec<String>,
    pub schema: Schema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    allow_multiple: bool,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    schema: Option<serde_json::Value>,
}

impl ComponentConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }

    #[must_use]
    pub fn depends_on(mut self, type_name: impl Into<String>) -> Self {
        self.dependencies.push(type_name.into());
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Parse `{"allowMultiple": .., "dependencies": [..], "schema": {..}}`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, engine_schema::SchemaError> {
        let raw = RawConfig::deserialize(json)?;
        let schema = match raw.schema {
            Some(schema) => Schema::from_json(&schema)?,
            None => Schema::new(),
        };
        Ok(Self {
            allow_multiple: raw.allow_multiple,
            dependencies: raw.dependencies,
            schema,
        })
    }
}

/// A registered component type.
pub struct ComponentTypeDescriptor {
    pub id: ComponentTypeId,
    pub name: String,
    pub config: ComponentConfig,
    factory: ComponentFactory,
}

impl ComponentTypeDescriptor {
    /// Produce a fresh, un-started behaviour instance.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for ComponentTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTypeDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Registry of every component type known to the runtime.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    types: HashMap<ComponentTypeId, ComponentTypeDescriptor>,
    /// Registration order, used for deterministic iteration.
    order: Vec<ComponentTypeId>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under `name`.
    ///
    /// The schema is validated first; malformed schemas, duplicate names and
    /// hash collisions are rejected and leave the registry unchanged.
    /// Dependencies may name types registered later; call
    /// [`validate`](Self::validate) once registration is finished.
    pub fn register(
        &mut self,
        name: &str,
        factory: ComponentFactory,
        config: ComponentConfig,
    ) -> Result<ComponentTypeId, RegistryError> {
        let id = ComponentTypeId::from_name(name);
        if let Some(existing) = self.types.get(&id) {
            return Err(if existing.name == name {
                RegistryError::DuplicateType(name.to_owned())
            } else {
                RegistryError::IdCollision {
                    name: name.to_owned(),
                    existing: existing.name.clone(),
                    id,
                }
            });
        }
        config
            .schema
            .validate()
            .map_err(|source| RegistryError::Configuration {
                type_name: name.to_owned(),
                source,
            })?;

        debug!(
            type_name = name,
            allow_multiple = config.allow_multiple,
            dependencies = ?config.dependencies,
            fields = config.schema.len(),
            "registered component type"
        );
        self.types.insert(
            id,
            ComponentTypeDescriptor {
                id,
                name: name.to_owned(),
                config,
                factory,
            },
        );
        self.order.push(id);
        Ok(id)
    }

    /// Check that every declared dependency names a registered type.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for descriptor in self.iter() {
            if let Some(missing) = descriptor
                .config
                .dependencies
                .iter()
                .find(|name| !self.contains(name))
            {
                return Err(RegistryError::UnknownDependency {
                    type_name: descriptor.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }
        Ok(())
    }

    /// Register a Rust component type using its static name and config.
    pub fn register_type<T: ComponentType>(&mut self) -> Result<ComponentTypeId, RegistryError> {
        self.register(
            T::type_name(),
            Box::new(|| Box::new(T::default())),
            T::config(),
        )
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ComponentTypeDescriptor> {
        self.types
            .get(&ComponentTypeId::from_name(name))
            .filter(|descriptor| descriptor.name == name)
    }

    #[must_use]
    pub fn get_by_id(&self, id: ComponentTypeId) -> Option<&ComponentTypeDescriptor> {
        self.types.get(&id)
    }

    /// Id of a registered type name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ComponentTypeId> {
        self.get(name).map(|descriptor| descriptor.id)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentTypeDescriptor> {
        self.order.iter().filter_map(|id| self.types.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
