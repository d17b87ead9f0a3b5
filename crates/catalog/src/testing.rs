//! Test fixtures: a bare in-memory unit of work.

use contentmart_core::{DomainResult, PackageId, Repository, Table, UnitOfWork, UserId};

use crate::model::{ContentFile, ContentPackage, PackageState, Property, PropertyState};
use crate::unit_of_work::CatalogUnitOfWork;

#[derive(Debug, Default)]
pub(crate) struct MemoryCatalog {
    pub properties: Table<Property>,
    pub states: Table<PropertyState>,
    pub packages: Table<ContentPackage>,
    pub package_states: Table<PackageState>,
    pub files: Table<ContentFile>,
    pub saves: usize,
}

impl MemoryCatalog {
    pub fn add_property(&mut self, name: &str, order: u32) -> Property {
        let property = Property::new(self.properties.next_id(), name, order);
        self.properties.insert(property.clone()).unwrap();
        property
    }

    pub fn add_state(&mut self, property: &Property, value: &str, index: u32) -> PropertyState {
        let state = PropertyState {
            id: self.states.next_id(),
            property_id: property.id,
            value: value.to_string(),
            index,
        };
        self.states.insert(state.clone()).unwrap();
        state
    }

    pub fn add_package(&mut self, states: &[&PropertyState]) -> PackageId {
        let id = self.packages.next_id();
        let package = ContentPackage::new(id, format!("package {id}"), "", 10, UserId::new());
        self.packages.insert(package).unwrap();

        for state in states {
            let link = PackageState {
                id: self.package_states.next_id(),
                package_id: id,
                state_id: state.id,
            };
            self.package_states.insert(link).unwrap();
        }
        id
    }
}

impl UnitOfWork for MemoryCatalog {
    fn save(&mut self) -> DomainResult<()> {
        self.saves += 1;
        Ok(())
    }
}

impl CatalogUnitOfWork for MemoryCatalog {
    fn properties(&mut self) -> &mut dyn Repository<Property> {
        &mut self.properties
    }

    fn states(&mut self) -> &mut dyn Repository<PropertyState> {
        &mut self.states
    }

    fn packages(&mut self) -> &mut dyn Repository<ContentPackage> {
        &mut self.packages
    }

    fn package_states(&mut self) -> &mut dyn Repository<PackageState> {
        &mut self.package_states
    }

    fn files(&mut self) -> &mut dyn Repository<ContentFile> {
        &mut self.files
    }
}
