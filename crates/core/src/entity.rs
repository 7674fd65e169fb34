//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog records (products, reviews, vendor accounts) are addressed by a
/// typed identifier that never changes once assigned.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
