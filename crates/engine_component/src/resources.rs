//! Type-keyed resource storage.
//!
//! Scenes and the application each own a [`Resources`] map. Components reach
//! shared services (a physics world, an asset store) through it instead of
//! holding references of their own.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A map holding at most one value per Rust type.
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Resources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the previous value of the same type.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Remove and return the resource of type `T`.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values.get_mut(&TypeId::of::<T>())?.downcast_mut::<T>()
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("len", &self.values.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Gravity(f32);

    #[test]
    fn test_insert_and_get() {
        let mut resources = Resources::new();
        assert!(resources.insert(Gravity(9.8)).is_none());
        assert_eq!(resources.get::<Gravity>(), Some(&Gravity(9.8)));
        assert!(resources.get::<u32>().is_none());
    }

    #[test]
    fn test_insert_replaces_and_returns_previous() {
        let mut resources = Resources::new();
        resources.insert(Gravity(1.0));
        assert_eq!(resources.insert(Gravity(2.0)), Some(Gravity(1.0)));
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn test_get_mut_and_remove() {
        let mut resources = Resources::new();
        resources.insert(Gravity(1.0));
        if let Some(g) = resources.get_mut::<Gravity>() {
            g.0 = 3.0;
        }
        assert_eq!(resources.remove::<Gravity>(), Some(Gravity(3.0)));
        assert!(!resources.contains::<Gravity>());
    }
}
