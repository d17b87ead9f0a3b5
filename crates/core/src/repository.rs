//! Persistence contracts.
//!
//! Services never talk to a concrete store. They receive a unit of work that
//! exposes one [`Repository`] per table and commits every pending write with a
//! single [`UnitOfWork::save`].

use crate::entity::Entity;
use crate::error::DomainResult;

/// Collection-like access to one entity table.
pub trait Repository<E: Entity> {
    /// All entities matching `filter`, in ascending id order.
    fn get(&self, filter: &dyn Fn(&E) -> bool) -> Vec<E>;

    fn get_by_id(&self, id: E::Id) -> Option<E>;

    /// Reserve a fresh identifier. Identifiers are never handed out twice,
    /// even after the entity holding one is deleted.
    fn next_id(&mut self) -> E::Id;

    /// Fails with `Conflict` if an entity with the same id already exists.
    fn insert(&mut self, entity: E) -> DomainResult<()>;

    /// Fails with `NotFound` if the entity does not exist.
    fn update(&mut self, entity: E) -> DomainResult<()>;

    /// Removes and returns the entity; `NotFound` if absent.
    fn delete(&mut self, id: E::Id) -> DomainResult<E>;

    /// First entity (lowest id) matching `filter`.
    fn first(&self, filter: &dyn Fn(&E) -> bool) -> Option<E> {
        self.get(filter).into_iter().next()
    }
}

/// A persistence session scoped to one request.
///
/// Writes made through the session's repositories are invisible to everyone
/// else until `save` returns `Ok`. Dropping a session without saving discards
/// its writes.
pub trait UnitOfWork {
    fn save(&mut self) -> DomainResult<()>;
}
