//! Facet values: lookup, creation and progressive narrowing.

use std::collections::BTreeSet;

use tracing::{debug, info};

use contentmart_core::{DomainError, DomainResult, PackageId, PropertyId, PropertyStateId};

use crate::model::{Facet, PackageState, Property, PropertyState};
use crate::unit_of_work::CatalogUnitOfWork;

/// Service over the property/state tables of one unit of work.
pub struct PropertyStateService<'a, U: CatalogUnitOfWork + ?Sized> {
    uow: &'a mut U,
}

impl<'a, U: CatalogUnitOfWork + ?Sized> PropertyStateService<'a, U> {
    pub fn new(uow: &'a mut U) -> Self {
        Self { uow }
    }

    /// Add a facet to the chain and commit it.
    ///
    /// Orders start at 1 and must be unused; names must be non-blank and unique
    /// ignoring case.
    pub fn create_property(&mut self, name: &str, order: u32) -> DomainResult<Property> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("property name must not be blank"));
        }
        if order == 0 {
            return Err(DomainError::validation("property order starts at 1"));
        }

        let existing = self.uow.properties().get(&|_| true);
        if let Some(taken) = existing.iter().find(|p| p.order == order) {
            return Err(DomainError::conflict(format!(
                "order {order} is already used by property {:?}",
                taken.name
            )));
        }
        if existing.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(DomainError::conflict(format!("property {name:?} already exists")));
        }

        let property = Property::new(self.uow.properties().next_id(), name, order);
        self.uow.properties().insert(property.clone())?;
        self.uow.save()?;

        info!(property_id = %property.id, order, "property created");
        Ok(property)
    }

    /// The state of `property_id` whose value is exactly `value`, if any.
    pub fn get_state(&mut self, property_id: PropertyId, value: &str) -> Option<PropertyState> {
        self.uow
            .states()
            .first(&|s: &PropertyState| s.property_id == property_id && s.value == value)
    }

    /// Create a new state for `property` and commit it.
    ///
    /// The new index is one past both the highest sibling index and the
    /// property's high-water mark, so indices are never reused even after the
    /// highest state is deleted. Fails with `Conflict` (and writes nothing) if
    /// `value` already exists for the property.
    pub fn create_state(&mut self, property: &Property, value: &str) -> DomainResult<PropertyState> {
        let mut property = self
            .uow
            .properties()
            .get_by_id(property.id)
            .ok_or_else(|| DomainError::not_found(format!("property {}", property.id)))?;

        let siblings = self
            .uow
            .states()
            .get(&|s: &PropertyState| s.property_id == property.id);

        if siblings.iter().any(|s| s.value == value) {
            return Err(DomainError::conflict(format!(
                "state already exists for this property ({}: {value:?})",
                property.name
            )));
        }

        let max_sibling = siblings.iter().map(|s| s.index).max().unwrap_or(0);
        let index = max_sibling.max(property.last_state_index) + 1;

        let state = PropertyState {
            id: self.uow.states().next_id(),
            property_id: property.id,
            value: value.to_string(),
            index,
        };
        self.uow.states().insert(state.clone())?;

        property.last_state_index = index;
        self.uow.properties().update(property)?;

        self.uow.save()?;

        info!(
            property_id = %state.property_id,
            state_id = %state.id,
            index = state.index,
            "property state created"
        );
        Ok(state)
    }

    /// States of `property` that co-occur with `state` on at least one package.
    ///
    /// This is what a facet dropdown offers once an earlier facet is fixed:
    /// with "Country = X" chosen, only cities seen on packages tagged X.
    pub fn get_bounded_states(
        &mut self,
        property: &Property,
        state: &PropertyState,
    ) -> Vec<PropertyState> {
        let state_id = state.id;
        let packages: BTreeSet<PackageId> = self
            .uow
            .package_states()
            .get(&|link: &PackageState| link.state_id == state_id)
            .into_iter()
            .map(|link| link.package_id)
            .collect();

        if packages.is_empty() {
            debug!(state_id = %state_id, "no packages carry state; nothing to narrow");
            return Vec::new();
        }

        let co_occurring: BTreeSet<PropertyStateId> = self
            .uow
            .package_states()
            .get(&|link: &PackageState| packages.contains(&link.package_id))
            .into_iter()
            .map(|link| link.state_id)
            .collect();

        let property_id = property.id;
        let bounded = self.uow.states().get(&|s: &PropertyState| {
            s.property_id == property_id && co_occurring.contains(&s.id)
        });

        debug!(
            property_id = %property_id,
            state_id = %state_id,
            packages = packages.len(),
            bounded = bounded.len(),
            "narrowed property states"
        );
        bounded
    }

    /// All properties, in facet-chain order.
    pub fn properties(&mut self) -> Vec<Property> {
        let mut properties = self.uow.properties().get(&|_| true);
        properties.sort_by_key(|p| (p.order, p.id));
        properties
    }

    /// States of one property, ordered by index.
    pub fn states_of(&mut self, property_id: PropertyId) -> Vec<PropertyState> {
        let mut states = self
            .uow
            .states()
            .get(&|s: &PropertyState| s.property_id == property_id);
        states.sort_by_key(|s| s.index);
        states
    }

    /// States tagging `package_id`, in id order.
    pub fn states_of_package(&mut self, package_id: PackageId) -> Vec<PropertyState> {
        let tagged: BTreeSet<PropertyStateId> = self
            .uow
            .package_states()
            .get(&|link: &PackageState| link.package_id == package_id)
            .into_iter()
            .map(|link| link.state_id)
            .collect();

        self.uow
            .states()
            .get(&|s: &PropertyState| tagged.contains(&s.id))
    }

    /// Storage facets for `package_id`.
    pub fn facets_of_package(&mut self, package_id: PackageId) -> DomainResult<Vec<Facet>> {
        let states = self.states_of_package(package_id);
        let mut facets = Vec::with_capacity(states.len());
        for state in &states {
            let property = self
                .uow
                .properties()
                .get_by_id(state.property_id)
                .ok_or_else(|| {
                    DomainError::invariant(format!(
                        "state {} references missing property {}",
                        state.id, state.property_id
                    ))
                })?;
            facets.push(Facet::of(&property, state));
        }
        Ok(facets)
    }

    /// Stage association rows tagging `package_id` with `states`.
    ///
    /// Already-present tags are skipped. Nothing is committed; the caller's
    /// `save` persists the rows together with the package.
    pub fn tag_package(&mut self, package_id: PackageId, states: &[PropertyState]) -> DomainResult<()> {
        for state in states {
            let state_id = state.id;
            let exists = self
                .uow
                .package_states()
                .first(&|link: &PackageState| {
                    link.package_id == package_id && link.state_id == state_id
                })
                .is_some();
            if exists {
                continue;
            }

            let link = PackageState {
                id: self.uow.package_states().next_id(),
                package_id,
                state_id,
            };
            self.uow.package_states().insert(link)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCatalog;
    use contentmart_core::Repository;

    #[test]
    fn create_property_appends_to_the_chain() {
        let mut uow = MemoryCatalog::default();

        let mut service = PropertyStateService::new(&mut uow);
        let country = service.create_property(" Country ", 1).unwrap();
        let city = service.create_property("City", 3).unwrap();

        assert_eq!(country.name, "Country");
        assert_eq!(country.last_state_index, 0);
        assert_eq!(service.properties(), vec![country, city]);
        assert_eq!(uow.saves, 2);
    }

    #[test]
    fn create_property_rejects_taken_order_and_name() {
        let mut uow = MemoryCatalog::default();
        uow.add_property("Country", 1);

        let mut service = PropertyStateService::new(&mut uow);

        assert!(matches!(
            service.create_property("City", 1),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            service.create_property("country", 2),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            service.create_property("  ", 2),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.create_property("City", 0),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(uow.properties.len(), 1);
        assert_eq!(uow.saves, 0);
    }

    #[test]
    fn get_state_finds_exact_property_and_value() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let city = uow.add_property("City", 2);
        let russia = uow.add_state(&country, "Russia", 1);
        uow.add_state(&city, "Russia", 1);

        let mut service = PropertyStateService::new(&mut uow);

        assert_eq!(service.get_state(country.id, "Russia"), Some(russia));
        assert_eq!(service.get_state(country.id, "russia"), None);
        assert_eq!(service.get_state(PropertyId::new(99), "Russia"), None);
    }

    #[test]
    fn first_state_of_a_property_gets_index_one() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);

        let state = PropertyStateService::new(&mut uow)
            .create_state(&country, "Russia")
            .unwrap();

        assert_eq!(state.index, 1);
        assert_eq!(state.property_id, country.id);
        assert_eq!(uow.saves, 1);
    }

    #[test]
    fn create_state_continues_after_highest_sibling_index() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let city = uow.add_property("City", 2);
        uow.add_state(&country, "Russia", 1);
        uow.add_state(&country, "France", 4);
        uow.add_state(&city, "Paris", 9);

        let state = PropertyStateService::new(&mut uow)
            .create_state(&country, "Spain")
            .unwrap();

        assert_eq!(state.index, 5);
    }

    #[test]
    fn duplicate_value_is_a_conflict_and_writes_nothing() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        uow.add_state(&country, "Russia", 1);

        let err = PropertyStateService::new(&mut uow)
            .create_state(&country, "Russia")
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(msg) if msg.contains("state already exists")));
        assert_eq!(uow.states.len(), 1);
        assert_eq!(uow.saves, 0);
    }

    #[test]
    fn indices_are_not_reused_after_deleting_the_highest_state() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);

        let mut service = PropertyStateService::new(&mut uow);
        service.create_state(&country, "Russia").unwrap();
        let france = service.create_state(&country, "France").unwrap();
        drop(service);

        uow.states.delete(france.id).unwrap();

        let spain = PropertyStateService::new(&mut uow)
            .create_state(&country, "Spain")
            .unwrap();
        assert_eq!(spain.index, 3);
    }

    #[test]
    fn create_state_for_unknown_property_is_not_found() {
        let mut uow = MemoryCatalog::default();
        let ghost = Property::new(PropertyId::new(42), "Ghost", 1);

        let err = PropertyStateService::new(&mut uow)
            .create_state(&ghost, "x")
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn bounded_states_only_offer_co_occurring_values() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let city = uow.add_property("City", 2);
        let s1 = uow.add_state(&country, "Russia", 1);
        let s2 = uow.add_state(&country, "France", 2);
        let s3 = uow.add_state(&city, "Moscow", 1);
        let s4 = uow.add_state(&city, "Paris", 2);
        uow.add_package(&[&s1, &s3]);
        uow.add_package(&[&s2, &s4]);

        let mut service = PropertyStateService::new(&mut uow);

        assert_eq!(service.get_bounded_states(&city, &s1), vec![s3]);
        assert_eq!(service.get_bounded_states(&city, &s2), vec![s4]);
    }

    #[test]
    fn bounded_states_are_distinct_across_packages() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let city = uow.add_property("City", 2);
        let russia = uow.add_state(&country, "Russia", 1);
        let moscow = uow.add_state(&city, "Moscow", 1);
        let kazan = uow.add_state(&city, "Kazan", 2);
        uow.add_package(&[&russia, &moscow]);
        uow.add_package(&[&russia, &moscow]);
        uow.add_package(&[&russia, &kazan]);

        let bounded = PropertyStateService::new(&mut uow).get_bounded_states(&city, &russia);

        assert_eq!(bounded, vec![moscow, kazan]);
    }

    #[test]
    fn bounded_states_for_unused_state_are_empty() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let city = uow.add_property("City", 2);
        let s1 = uow.add_state(&country, "Russia", 1);
        let lonely = uow.add_state(&country, "Chile", 2);
        let s3 = uow.add_state(&city, "Moscow", 1);
        uow.add_package(&[&s1, &s3]);

        let bounded = PropertyStateService::new(&mut uow).get_bounded_states(&city, &lonely);

        assert!(bounded.is_empty());
    }

    #[test]
    fn properties_come_back_in_chain_order() {
        let mut uow = MemoryCatalog::default();
        uow.add_property("Institute", 3);
        uow.add_property("Country", 1);
        uow.add_property("City", 2);

        let names: Vec<String> = PropertyStateService::new(&mut uow)
            .properties()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Country", "City", "Institute"]);
    }

    #[test]
    fn facets_of_package_pair_states_with_their_property_order() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let faculty = uow.add_property("Faculty", 3);
        let russia = uow.add_state(&country, "Russia", 1);
        let physics = uow.add_state(&faculty, "Physics", 2);
        let package = uow.add_package(&[&physics, &russia]);

        let mut facets = PropertyStateService::new(&mut uow)
            .facets_of_package(package)
            .unwrap();
        facets.sort_by_key(|f| f.order);

        assert_eq!(
            facets,
            vec![Facet::of(&country, &russia), Facet::of(&faculty, &physics)]
        );
    }

    #[test]
    fn tag_package_skips_existing_links() {
        let mut uow = MemoryCatalog::default();
        let country = uow.add_property("Country", 1);
        let russia = uow.add_state(&country, "Russia", 1);
        let package = uow.add_package(&[&russia]);

        PropertyStateService::new(&mut uow)
            .tag_package(package, &[russia.clone(), russia])
            .unwrap();

        assert_eq!(uow.package_states.len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every created index is one past the previous highest.
            #[test]
            fn created_indices_are_sequential(count in 1usize..20) {
                let mut uow = MemoryCatalog::default();
                let property = uow.add_property("Tag", 1);

                let mut service = PropertyStateService::new(&mut uow);
                for n in 0..count {
                    let state = service.create_state(&property, &format!("value-{n}")).unwrap();
                    prop_assert_eq!(state.index as usize, n + 1);
                }
            }
        }
    }
}
