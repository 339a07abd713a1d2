//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Offers keep their identity while they move through negotiation, so engines
/// look them up by id rather than by position in the owning aggregate.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
