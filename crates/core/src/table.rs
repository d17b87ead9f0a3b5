//! In-memory entity table.
//!
//! A plain ordered map plus an id sequence. Stores compose one `Table` per
//! entity type; cloning a table is how a unit of work takes its snapshot.

use std::collections::BTreeMap;

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::repository::Repository;

#[derive(Debug, Clone)]
pub struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
    last_id: u64,
}

impl<E: Entity> Table<E> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Repository<E> for Table<E> {
    fn get(&self, filter: &dyn Fn(&E) -> bool) -> Vec<E> {
        self.rows.values().filter(|e| filter(e)).cloned().collect()
    }

    fn get_by_id(&self, id: E::Id) -> Option<E> {
        self.rows.get(&id).cloned()
    }

    fn next_id(&mut self) -> E::Id {
        self.last_id += 1;
        E::Id::from(self.last_id)
    }

    fn insert(&mut self, entity: E) -> DomainResult<()> {
        let id = entity.id();
        if self.rows.contains_key(&id) {
            return Err(DomainError::conflict(format!("duplicate id {id:?}")));
        }
        // Explicit ids must not be handed out again by `next_id`.
        self.last_id = self.last_id.max(id.into());
        self.rows.insert(id, entity);
        Ok(())
    }

    fn update(&mut self, entity: E) -> DomainResult<()> {
        let id = entity.id();
        match self.rows.get_mut(&id) {
            Some(row) => {
                *row = entity;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("{id:?}"))),
        }
    }

    fn delete(&mut self, id: E::Id) -> DomainResult<E> {
        self.rows
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("{id:?}")))
    }
}
