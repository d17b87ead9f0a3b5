//! Snapshot-isolated in-memory persistence.
//!
//! The store holds one committed [`Tables`] value and a version counter. A unit
//! of work clones the tables on creation and swaps its copy in on `save`, after
//! checking nobody else committed in between.

mod tables;
mod unit_of_work;

pub use tables::Tables;
pub use unit_of_work::InMemoryUnitOfWork;

use std::sync::{PoisonError, RwLock};

use tracing::debug;

use contentmart_core::{DomainResult, ExpectedVersion};

/// Upper bound on [`InMemoryStore::transact`] attempts.
const MAX_ATTEMPTS: usize = 16;

#[derive(Debug, Default)]
struct Committed {
    version: u64,
    tables: Tables,
}

/// In-memory store for tests/dev. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    committed: RwLock<Committed>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a unit of work over a snapshot of the current committed state.
    pub fn begin(&self) -> InMemoryUnitOfWork<'_> {
        // Commits replace the tables wholesale, so a poisoned lock still
        // guards a consistent value.
        let committed = self.committed.read().unwrap_or_else(PoisonError::into_inner);
        debug!(version = committed.version, "unit of work started");
        InMemoryUnitOfWork::new(self, committed.version, committed.tables.clone())
    }

    /// Run `work` in a fresh unit of work, retrying while it fails on a
    /// snapshot that another commit has already replaced.
    ///
    /// `work` calls `save` itself. A failure on an up-to-date snapshot is
    /// returned as it is, so domain conflicts are not retried.
    pub fn transact<T, F>(&self, mut work: F) -> DomainResult<T>
    where
        F: FnMut(&mut InMemoryUnitOfWork<'_>) -> DomainResult<T>,
    {
        let mut attempt = 1;
        loop {
            let mut uow = self.begin();
            match work(&mut uow) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < MAX_ATTEMPTS && uow.base_version() != self.version() => {
                    debug!(attempt, error = %e, "snapshot went stale; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Number of commits so far.
    pub fn version(&self) -> u64 {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Copy of the committed tables.
    pub fn snapshot(&self) -> Tables {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tables
            .clone()
    }

    fn commit(&self, base_version: u64, tables: &Tables) -> DomainResult<u64> {
        let mut committed = self.committed.write().unwrap_or_else(PoisonError::into_inner);
        ExpectedVersion::Exact(base_version).check(committed.version)?;
        committed.tables = tables.clone();
        committed.version += 1;
        Ok(committed.version)
    }
}
