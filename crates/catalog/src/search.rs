//! Faceted search over tagged packages.

use std::collections::BTreeSet;

use tracing::debug;

use contentmart_core::{DomainError, DomainResult, PackageId, PropertyStateId};

use crate::model::{ContentPackage, PackageState, PropertyState};
use crate::unit_of_work::CatalogUnitOfWork;

pub struct SearchService<'a, U: CatalogUnitOfWork + ?Sized> {
    uow: &'a mut U,
}

impl<'a, U: CatalogUnitOfWork + ?Sized> SearchService<'a, U> {
    pub fn new(uow: &'a mut U) -> Self {
        Self { uow }
    }

    /// Packages tagged with **every** state in `property_states`.
    ///
    /// `None` models an absent selection parameter and fails with
    /// `InvalidArgument` before any lookup. An empty selection matches nothing.
    /// Callers drop blank facet selections before calling. Results come back in
    /// package id order.
    pub fn find_packages_with_same_property_states(
        &mut self,
        property_states: Option<&[PropertyState]>,
    ) -> DomainResult<Vec<ContentPackage>> {
        let states = property_states
            .ok_or_else(|| DomainError::invalid_argument("property_states must be provided"))?;

        let Some((first, rest)) = states.split_first() else {
            return Ok(Vec::new());
        };

        let mut matching = self.packages_tagged_with(first.id);
        for state in rest {
            if matching.is_empty() {
                break;
            }
            let tagged = self.packages_tagged_with(state.id);
            matching.retain(|id| tagged.contains(id));
        }

        debug!(
            selected = states.len(),
            matched = matching.len(),
            "package search"
        );

        Ok(self
            .uow
            .packages()
            .get(&|p: &ContentPackage| matching.contains(&p.id)))
    }

    fn packages_tagged_with(&mut self, state_id: PropertyStateId) -> BTreeSet<PackageId> {
        self.uow
            .package_states()
            .get(&|link: &PackageState| link.state_id == state_id)
            .into_iter()
            .map(|link| link.package_id)
            .collect()
    }
}
