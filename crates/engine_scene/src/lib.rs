//! # engine_scene
//!
//! Entities, the scenes that own them, and the per-type collections of
//! enabled component instances that systems iterate.
//!
//! Everything lives in one [`World`] arena. Entities form a tree per scene;
//! each component instance belongs to exactly one entity for its whole life.

pub mod error;
pub mod hierarchy;
pub mod node;
pub mod scene;
pub mod world;

pub use error::SceneError;
pub use node::{ComponentInstance, EntityNode, Parent};
pub use scene::Scene;
pub use world::World;
