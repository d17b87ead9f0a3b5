//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identifiers are sequence-backed so that a persistence collaborator can hand
/// out fresh ones (see [`crate::Repository::next_id`]).
pub trait Entity: Clone {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug + From<u64> + Into<u64>;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
