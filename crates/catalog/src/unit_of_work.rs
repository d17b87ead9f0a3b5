use contentmart_core::{Repository, UnitOfWork};

use crate::model::{ContentFile, ContentPackage, PackageState, Property, PropertyState};

/// The tables the catalog services read and write within one session.
pub trait CatalogUnitOfWork: UnitOfWork {
    fn properties(&mut self) -> &mut dyn Repository<Property>;
    fn states(&mut self) -> &mut dyn Repository<PropertyState>;
    fn packages(&mut self) -> &mut dyn Repository<ContentPackage>;
    fn package_states(&mut self) -> &mut dyn Repository<PackageState>;
    fn files(&mut self) -> &mut dyn Repository<ContentFile>;
}
