//! Catalog domain module: facets, facet values and the packages they tag.
//!
//! Properties form a single ordered chain (Country → City → Institute ...).
//! Each package is tagged with at most one state per property; search and
//! progressive narrowing work over those tags. No IO happens here, every read
//! and write goes through a [`CatalogUnitOfWork`].

pub mod model;
pub mod property_state;
pub mod search;
pub mod unit_of_work;

#[cfg(test)]
pub(crate) mod testing;

pub use model::{ContentFile, ContentPackage, Facet, PackageState, Property, PropertyState};
pub use property_state::PropertyStateService;
pub use search::SearchService;
pub use unit_of_work::CatalogUnitOfWork;
