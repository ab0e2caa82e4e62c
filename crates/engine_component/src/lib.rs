//! # engine_component
//!
//! What a component is and how its type is registered.
//!
//! - [`Component`] / [`ComponentType`]: behaviour hooks of an instance.
//! - [`ComponentRegistry`]: type name → factory, multiplicity, dependencies
//!   and schema.
//! - [`Lifecycle`]: the explicit-flag state machine deciding enable/disable
//!   transitions.
//! - [`Listeners`]: per-instance `Enabled`/`Disabled`/`Removed` pub/sub.
//! - [`HookContext`] / [`Resources`]: what hooks can reach.
//! - [`EntityId`], [`SceneId`], [`InstanceId`]: arena handles.

pub mod component;
pub mod context;
pub mod entity;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod registry;
pub mod resources;

pub use component::{Component, ComponentType, ComponentTypeId};
pub use context::HookContext;
pub use entity::{EntityId, IdAllocator, InstanceId, SceneId};
pub use error::{ComponentError, RegistryError};
pub use events::{ComponentEvent, Listeners, SubscriptionId};
pub use lifecycle::{Lifecycle, Transition};
pub use registry::{ComponentConfig, ComponentFactory, ComponentRegistry, ComponentTypeDescriptor};
pub use resources::Resources;
