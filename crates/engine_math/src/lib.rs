//! # engine_math
//!
//! Math types for the entity-component runtime. Re-exports [`glam`] for linear
//! algebra and defines the spatial and color value types shared by the schema,
//! scene and physics crates.

pub mod color;
pub mod tolerance;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use color::Color;
pub use tolerance::{quat_differs, vec3_differs};
pub use transform::Transform3D;
