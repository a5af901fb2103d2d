//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Lifecycle hooks observe entities by identity: the same `Car` seen by a
/// pre-save hook and by a post-create hook shares one id.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Stable entity name used in logs and hook errors (e.g. "car").
    fn entity_name() -> &'static str;
}
