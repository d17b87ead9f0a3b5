use tracing::{debug, warn};

use contentmart_catalog::{
    CatalogUnitOfWork, ContentFile, ContentPackage, PackageState, Property, PropertyState,
};
use contentmart_core::{DomainResult, Repository, UnitOfWork};
use contentmart_finance::{FinanceUnitOfWork, Order, UserProfile};

use super::InMemoryStore;
use super::tables::Tables;

/// One session over an [`InMemoryStore`].
///
/// Reads and writes hit a private copy of the tables. `save` publishes the copy
/// if the store is still at the version the session started from, otherwise
/// it fails with `Conflict` and the store is left as it was.
#[derive(Debug)]
pub struct InMemoryUnitOfWork<'s> {
    store: &'s InMemoryStore,
    base_version: u64,
    tables: Tables,
}

impl<'s> InMemoryUnitOfWork<'s> {
    pub(super) fn new(store: &'s InMemoryStore, base_version: u64, tables: Tables) -> Self {
        Self {
            store,
            base_version,
            tables,
        }
    }

    /// Store version this session reads from.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// The session's working copy, pending writes included.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }
}

impl UnitOfWork for InMemoryUnitOfWork<'_> {
    fn save(&mut self) -> DomainResult<()> {
        match self.store.commit(self.base_version, &self.tables) {
            Ok(version) => {
                debug!(version, "unit of work committed");
                self.base_version = version;
                Ok(())
            }
            Err(e) => {
                warn!(base_version = self.base_version, error = %e, "commit rejected");
                Err(e)
            }
        }
    }
}

impl CatalogUnitOfWork for InMemoryUnitOfWork<'_> {
    fn properties(&mut self) -> &mut dyn Repository<Property> {
        &mut self.tables.properties
    }

    fn states(&mut self) -> &mut dyn Repository<PropertyState> {
        &mut self.tables.states
    }

    fn packages(&mut self) -> &mut dyn Repository<ContentPackage> {
        &mut self.tables.packages
    }

    fn package_states(&mut self) -> &mut dyn Repository<PackageState> {
        &mut self.tables.package_states
    }

    fn files(&mut self) -> &mut dyn Repository<ContentFile> {
        &mut self.tables.files
    }
}

impl FinanceUnitOfWork for InMemoryUnitOfWork<'_> {
    fn profiles(&mut self) -> &mut dyn Repository<UserProfile> {
        &mut self.tables.profiles
    }

    fn orders(&mut self) -> &mut dyn Repository<Order> {
        &mut self.tables.orders
    }
}
