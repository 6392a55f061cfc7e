//! Per-kind entity registries
//!
//! Every entity kind (edge servers, services) lives in its own
//! [`EntityRegistry`], an insertion-ordered store with an id index. The
//! registry holds no cross-entity relations; a service's host is an attribute
//! of the service.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::{PlacementError, Result};
use crate::types::{EdgeServer, HostId, Service, ServiceId};

/// An entity that can be stored in a registry
pub trait Entity {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Into<u64>;

    /// Kind name used in error messages
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
}

impl Entity for EdgeServer {
    type Id = HostId;
    const KIND: &'static str = "EdgeServer";

    fn id(&self) -> HostId {
        self.id
    }
}

impl Entity for Service {
    type Id = ServiceId;
    const KIND: &'static str = "Service";

    fn id(&self) -> ServiceId {
        self.id
    }
}

/// All live instances of one entity kind, in registration order
#[derive(Debug, Clone)]
pub struct EntityRegistry<T: Entity> {
    entries: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Entity> EntityRegistry<T> {
    pub fn new() -> Self {
        EntityRegistry {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add an instance; rejects an id that is already registered
    pub fn register(&mut self, instance: T) -> Result<T::Id> {
        let id = instance.id();
        if self.index.contains_key(&id) {
            return Err(PlacementError::DuplicateEntity {
                kind: T::KIND,
                id: id.into(),
            });
        }

        self.index.insert(id, self.entries.len());
        self.entries.push(instance);
        Ok(id)
    }

    /// Every live instance in registration order
    ///
    /// Not a snapshot: calling this again after a transition observes it.
    pub fn all(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.entries.iter().map(Entity::id)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.index.get(&id).map(|&idx| &self.entries[idx])
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        match self.index.get(&id) {
            Some(&idx) => Some(&mut self.entries[idx]),
            None => None,
        }
    }

    /// Like [`get`](Self::get) but with an `UnknownEntity` error
    pub fn require(&self, id: T::Id) -> Result<&T> {
        self.get(id).ok_or_else(|| Self::unknown(id))
    }

    pub fn require_mut(&mut self, id: T::Id) -> Result<&mut T> {
        self.get_mut(id).ok_or_else(|| Self::unknown(id))
    }

    /// Mutable access to two distinct entries at once
    ///
    /// Returns `None` if either id is unknown or both ids are equal.
    pub fn get_pair_mut(&mut self, a: T::Id, b: T::Id) -> Option<(&mut T, &mut T)> {
        let ia = *self.index.get(&a)?;
        let ib = *self.index.get(&b)?;
        if ia == ib {
            return None;
        }

        if ia < ib {
            let (left, right) = self.entries.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.entries.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    fn unknown(id: T::Id) -> PlacementError {
        PlacementError::UnknownEntity {
            kind: T::KIND,
            id: id.into(),
        }
    }
}

impl<T: Entity> Default for EntityRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Entity> IntoIterator for &'a EntityRegistry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}
