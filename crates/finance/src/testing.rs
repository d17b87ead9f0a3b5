//! Test fixtures: in-memory unit of work covering catalog and finance tables.

use contentmart_catalog::{
    CatalogUnitOfWork, ContentFile, ContentPackage, PackageState, Property, PropertyState,
};
use contentmart_core::{DomainResult, PackageId, Repository, Table, UnitOfWork, UserId};

use crate::model::{Order, UserProfile};
use crate::unit_of_work::FinanceUnitOfWork;

#[derive(Debug, Default)]
pub(crate) struct MemoryLedger {
    pub properties: Table<Property>,
    pub states: Table<PropertyState>,
    pub packages: Table<ContentPackage>,
    pub package_states: Table<PackageState>,
    pub files: Table<ContentFile>,
    pub profiles: Table<UserProfile>,
    pub orders: Table<Order>,
    pub saves: usize,
}

impl MemoryLedger {
    pub fn add_profile(&mut self, balance: i64) -> UserProfile {
        let profile = UserProfile {
            id: self.profiles.next_id(),
            user_id: UserId::new(),
            balance,
        };
        self.profiles.insert(profile.clone()).unwrap();
        profile
    }

    pub fn add_package(&mut self, owner: UserId, price: i64) -> ContentPackage {
        let id: PackageId = self.packages.next_id();
        let package = ContentPackage::new(id, format!("package {id}"), "", price, owner);
        self.packages.insert(package.clone()).unwrap();
        package
    }

    pub fn balance(&self, profile: &UserProfile) -> i64 {
        self.profiles.get_by_id(profile.id).unwrap().balance
    }
}

impl UnitOfWork for MemoryLedger {
    fn save(&mut self) -> DomainResult<()> {
        self.saves += 1;
        Ok(())
    }
}

impl CatalogUnitOfWork for MemoryLedger {
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

impl FinanceUnitOfWork for MemoryLedger {
    fn profiles(&mut self) -> &mut dyn Repository<UserProfile> {
        &mut self.profiles
    }

    fn orders(&mut self) -> &mut dyn Repository<Order> {
        &mut self.orders
    }
}
