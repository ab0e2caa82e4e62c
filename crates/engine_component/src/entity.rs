//! Identifier types and allocation.
//!
//! Entities, scenes and component instances are addressed by lightweight
//! `u64` identifiers handed out by the world that owns them. Zero is never
//! allocated and serves as the invalid sentinel.

use serde::{Deserialize, Serialize};

/// A unique entity identifier.
///
/// Entity ids are runtime handles. Stable identity across sessions is the
/// job of the entity's uuid, kept by the scene crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The null / invalid entity sentinel.
    pub const INVALID: EntityId = EntityId(0);

    /// Create an entity id from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) entity.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// A unique scene identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u64);

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Scene({})", self.0)
    }
}

/// A unique component instance identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.0)
    }
}

/// Allocates monotonically increasing raw ids.
///
/// Ids are never recycled within one allocator.
#[derive(Debug)]
pub struct IdAllocator {
    next_id: u64,
}

impl IdAllocator {
    /// Creates a new allocator. Ids start at 1 (0 is reserved).
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh raw id.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Returns the number of ids allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
