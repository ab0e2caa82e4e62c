//! Physics component types.

pub mod collider;
pub mod joint;
pub mod rigidbody;

use engine_component::{ComponentRegistry, RegistryError};

pub use collider::{COLLIDER, Collider, MeshAssets};
pub use joint::{JOINT, Joint};
pub use rigidbody::{RIGIDBODY, Rigidbody};

/// Register `rigidbody`, `collider` and `joint`.
pub fn register_physics_components(registry: &mut ComponentRegistry) -> Result<(), RegistryError> {
    registry.register_type::<Rigidbody>()?;
    registry.register_type::<Collider>()?;
    registry.register_type::<Joint>()?;
    registry.validate()
}
