//! Core [`Component`] trait and component type identity.
//!
//! A component type is a named, schema-described unit of behaviour. Its
//! instances are created by the registry's factory, handed their sanitized
//! configuration record once in [`Component::start`], and then driven through
//! the enable/disable lifecycle by the scene.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm, so the same name always yields the same
//! id across runs and processes.

use std::any::Any;

use engine_schema::Record;
use serde::{Deserialize, Serialize};

use crate::context::HookContext;
use crate::error::ComponentError;
use crate::registry::ComponentConfig;

/// A unique identifier for a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's string name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: ComponentType>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// Behaviour of a component instance.
///
/// All hooks run synchronously on the world's thread. The context gives
/// access to the owning entity, its scene's resources and the application
/// resources; hooks must not assume a scene is present, since entities can
/// hold components before they are attached to one.
///
/// # Examples
///
/// ```rust
/// use std::any::Any;
/// use engine_component::{Component, ComponentError, HookContext};
/// use engine_schema::Record;
///
/// #[derive(Default)]
/// struct Spinner {
///     speed: f32,
/// }
///
/// impl Component for Spinner {
///     fn start(
///         &mut self,
///         _ctx: &mut HookContext<'_>,
///         data: &Record,
///     ) -> Result<(), ComponentError> {
///         self.speed = data.get("speed").and_then(|v| v.as_f32()).unwrap_or(1.0);
///         Ok(())
///     }
///
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait Component: Any {
    /// Initialise from the sanitized configuration record.
    ///
    /// Also called again with the stored record when the scene re-initialises
    /// an instance (for example a collider whose entity was rescaled). An
    /// error fails the construction of this instance only.
    fn start(&mut self, ctx: &mut HookContext<'_>, data: &Record) -> Result<(), ComponentError>;

    /// The instance became effective-enabled and joined its scene collection.
    fn on_enable(&mut self, _ctx: &mut HookContext<'_>) {}

    /// The instance stopped being effective-enabled.
    fn on_disable(&mut self, _ctx: &mut HookContext<'_>) {}

    /// The entity's subtree is leaving `ctx.scene()`.
    fn on_scene_exit(&mut self, _ctx: &mut HookContext<'_>) {}

    /// The entity's subtree has joined `ctx.scene()`.
    fn on_scene_enter(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Release external resources. Runs once, after the final disable.
    fn teardown(&mut self, _ctx: &mut HookContext<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A component implemented as a Rust type with a static name and
/// configuration, registrable with
/// [`ComponentRegistry::register_type`](crate::ComponentRegistry::register_type).
pub trait ComponentType: Component + Default {
    /// The registered type name (e.g. `"rigidbody"`).
    fn type_name() -> &'static str;

    /// Multiplicity, dependencies and schema of this type.
    fn config() -> ComponentConfig {
        ComponentConfig::default()
    }
}
