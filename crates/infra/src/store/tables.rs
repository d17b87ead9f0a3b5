use contentmart_catalog::{ContentFile, ContentPackage, PackageState, Property, PropertyState};
use contentmart_core::Table;
use contentmart_finance::{Order, UserProfile};

/// Every table of the marketplace.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub properties: Table<Property>,
    pub states: Table<PropertyState>,
    pub packages: Table<ContentPackage>,
    pub package_states: Table<PackageState>,
    pub files: Table<ContentFile>,
    pub profiles: Table<UserProfile>,
    pub orders: Table<Order>,
}
